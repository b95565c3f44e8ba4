use chrono::Utc;
use rust_decimal::Decimal;

use cardwise_core::import::{plan_import, ExternalCampaign, ReviewDecision};
use cardwise_core::ports::CatalogSource;
use cardwise_core::{
    BankId, CampaignId, CampaignStatus, CardId, ClickAction, ClickRequest, RecommendationEngine,
    RecommendationRequest, RecommendationService,
};
use cardwise_db::{
    migrations, open_pool, DbPool, DemoCatalog, SqlCampaignRepository,
    SqlCardOwnershipRepository, SqlRecommendationLog,
};

type FlowTestResult<T = ()> = Result<T, String>;

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `{}` == `{}` (`{:?}` != `{:?}`)",
                stringify!($left),
                stringify!($right),
                $left,
                $right
            ));
        }
    };
}

async fn seeded_pool() -> FlowTestResult<DbPool> {
    let pool = open_pool("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoCatalog::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    Ok(pool)
}

fn service(
    pool: &DbPool,
) -> RecommendationService<SqlCampaignRepository, SqlCardOwnershipRepository, SqlRecommendationLog>
{
    RecommendationService::new(
        SqlCampaignRepository::new(pool.clone()),
        SqlCardOwnershipRepository::new(pool.clone()),
        SqlRecommendationLog::new(pool.clone()),
        RecommendationEngine::default(),
    )
}

#[tokio::test]
async fn recommendation_click_and_engagement_round_trip() -> FlowTestResult {
    let pool = seeded_pool().await?;
    SqlCardOwnershipRepository::new(pool.clone())
        .link_card(42, CardId(2))
        .await
        .map_err(|error| format!("link card: {error}"))?;
    let service = service(&pool);

    let request = RecommendationRequest::new(Decimal::from(500), "grocery")
        .with_merchant("Migros")
        .with_user(42)
        .with_session("checkout-42");
    let response = service.recommend(request).await.map_err(|error| error.to_string())?;

    // Only campaign 1 names a merchant, so the Migros needle keeps just that one.
    require_eq!(response.existing_card_recommendations.len(), 0);
    require_eq!(response.new_card_recommendations.len(), 1);
    require_eq!(response.new_card_recommendations[0].campaign_id, CampaignId(1));
    require_eq!(response.new_card_recommendations[0].savings_amount, Decimal::from(50));

    let click = service
        .track_click(ClickRequest {
            recommendation_campaign_id: CampaignId(1),
            session_id: Some("checkout-42".to_string()),
            actor_id: Some(42),
            action_type: ClickAction::CardApply,
        })
        .await
        .map_err(|error| error.to_string())?;
    require_eq!(click.redirect_url.as_deref(), Some("https://apply.cardwise.example/bonus"));

    let engagement = SqlRecommendationLog::new(pool.clone())
        .engagement(CampaignId(1), None)
        .await
        .map_err(|error| error.to_string())?;
    require_eq!(engagement.shown_count, 1);
    require_eq!(engagement.card_apply_count, 1);
    require_eq!(engagement.click_rate, 1.0);
    Ok(())
}

#[tokio::test]
async fn persisted_ownership_moves_campaigns_to_existing_bucket() -> FlowTestResult {
    let pool = seeded_pool().await?;
    SqlCardOwnershipRepository::new(pool.clone())
        .link_card(42, CardId(2))
        .await
        .map_err(|error| format!("link card: {error}"))?;

    let response = service(&pool)
        .recommend(RecommendationRequest::new(Decimal::from(500), "grocery").with_user(42))
        .await
        .map_err(|error| error.to_string())?;

    let existing: Vec<i64> =
        response.existing_card_recommendations.iter().map(|r| r.campaign_id.0).collect();
    let new: Vec<i64> = response.new_card_recommendations.iter().map(|r| r.campaign_id.0).collect();
    require_eq!(existing, vec![2]);
    require_eq!(new, vec![1, 3]);
    Ok(())
}

#[tokio::test]
async fn rejected_import_drops_out_of_recommendations() -> FlowTestResult {
    let pool = seeded_pool().await?;
    let campaigns = SqlCampaignRepository::new(pool.clone());
    let feed: Vec<ExternalCampaign> = serde_json::from_str(
        r#"[
            {"external_id": 7781, "card_id": 1, "name": "Cinema nights", "category": "movie",
             "discount_type": "percent", "discount_value": "20", "max_discount": "80",
             "start_date": "2020-01-01", "end_date": "2099-12-31"},
            {"name": "No identifier"}
        ]"#,
    )
    .map_err(|error| format!("feed: {error}"))?;

    let existing =
        campaigns.list_for_bank(BankId(1)).await.map_err(|error| error.to_string())?;
    let plan = plan_import(BankId(1), &feed, &existing, false, Utc::now());
    require_eq!(plan.stats.created, 1);
    require_eq!(plan.stats.skipped, 1);
    require_eq!(plan.stats.pending_approval, 1);

    let created = campaigns.apply_import(&plan).await.map_err(|error| error.to_string())?;
    let [id] = created.as_slice() else {
        return Err(format!("expected one created campaign, got {created:?}"));
    };

    let before = campaigns.load_catalog(Utc::now()).await.map_err(|error| error.to_string())?;
    require_eq!(before.find(*id).is_some(), true);
    let request = RecommendationRequest::new(Decimal::from(300), "entertainment");
    let pending = service(&pool).recommend(request.clone()).await.map_err(|e| e.to_string())?;
    require_eq!(pending.is_empty(), false);

    let reviewed =
        campaigns.review(*id, ReviewDecision::Reject).await.map_err(|error| error.to_string())?;
    require_eq!(reviewed.status, CampaignStatus::Rejected);
    let rejected = service(&pool).recommend(request).await.map_err(|e| e.to_string())?;
    require_eq!(rejected.is_empty(), true);
    Ok(())
}
