use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use cardwise_cli::commands::cards::CardLinkArgs;
use cardwise_cli::commands::click::ClickArgs;
use cardwise_cli::commands::import::ImportArgs;
use cardwise_cli::commands::recommend::RecommendArgs;
use cardwise_cli::commands::review::{DecisionArg, PendingArgs, ReviewArgs};
use cardwise_cli::commands::stats::StatsArgs;
use cardwise_cli::commands::{cards, click, config, import, migrate, recommend, review, seed, stats};
use cardwise_core::config::LoadOptions;
use cardwise_core::ClickAction;
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

#[test]
fn migrate_returns_success_with_file_database() {
    with_database_env(&[], |_dir| {
        let result = migrate::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_is_repeatable_and_lists_campaigns() {
    with_database_env(&[], |_dir| {
        let first = seed::run(LoadOptions::default());
        assert_eq!(first.exit_code, 0, "first seed failed: {}", first.output);

        let second = seed::run(LoadOptions::default());
        assert_eq!(second.exit_code, 0, "second seed failed: {}", second.output);

        let payload = parse_payload(&second.output);
        let message = payload["message"].as_str().expect("message should be a string");
        assert!(message.starts_with("Demo catalog loaded with 9 campaigns:"));
        assert!(message.contains("campaign-migros-percentage: campaign 1"));
    });
}

#[test]
fn recommend_splits_existing_and_new_cards_after_seed() {
    with_database_env(&[], |_dir| {
        assert_eq!(seed::run(LoadOptions::default()).exit_code, 0);

        let result = recommend::run(LoadOptions::default(), grocery_cart(Some("session-a")));
        assert_eq!(result.exit_code, 0, "recommend failed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(campaign_ids(&payload["data"]["existing_card_recommendations"]), vec![1]);
        assert_eq!(campaign_ids(&payload["data"]["new_card_recommendations"]), vec![2, 3]);
        assert_eq!(payload["data"]["existing_card_recommendations"][0]["is_existing_card"], true);
    });
}

#[test]
fn top_n_override_trims_each_bucket() {
    with_database_env(&[("CARDWISE_RECOMMENDATIONS_TOP_N", "1")], |_dir| {
        assert_eq!(seed::run(LoadOptions::default()).exit_code, 0);

        let result = recommend::run(LoadOptions::default(), grocery_cart(None));
        assert_eq!(result.exit_code, 0, "recommend failed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(campaign_ids(&payload["data"]["new_card_recommendations"]).len(), 1);
    });
}

#[test]
fn click_and_stats_report_engagement() {
    with_database_env(&[], |_dir| {
        assert_eq!(seed::run(LoadOptions::default()).exit_code, 0);
        assert_eq!(
            recommend::run(LoadOptions::default(), grocery_cart(Some("session-b"))).exit_code,
            0
        );

        let clicked = click::run(
            LoadOptions::default(),
            ClickArgs {
                campaign_id: 1,
                action: ClickAction::CardApply,
                session_id: Some("session-b".to_string()),
                user_id: None,
            },
        );
        assert_eq!(clicked.exit_code, 0, "click failed: {}", clicked.output);
        let payload = parse_payload(&clicked.output);
        assert_eq!(payload["data"]["redirect_url"], "https://apply.cardwise.example/bonus");

        let reported =
            stats::run(LoadOptions::default(), StatsArgs { campaign_id: 1, since: None });
        assert_eq!(reported.exit_code, 0, "stats failed: {}", reported.output);
        let payload = parse_payload(&reported.output);
        assert_eq!(payload["data"]["shown_count"], 1);
        assert_eq!(payload["data"]["card_apply_count"], 1);
    });
}

#[test]
fn click_on_unknown_campaign_is_not_found_with_a_fresh_correlation_id() {
    with_database_env(&[], |_dir| {
        let unknown_click = || {
            click::run(
                LoadOptions::default(),
                ClickArgs {
                    campaign_id: 999,
                    action: ClickAction::Select,
                    session_id: None,
                    user_id: None,
                },
            )
        };

        let first = unknown_click();
        assert_eq!(first.exit_code, 7);
        let payload = parse_payload(&first.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");

        let first_id = correlation_id(&first.output);
        let second_id = correlation_id(&unknown_click().output);
        assert_ne!(first_id, second_id);
        assert!(Uuid::parse_str(&first_id).is_ok(), "not a uuid: {first_id}");
    });
}

#[test]
fn unreachable_database_is_a_connectivity_failure() {
    with_database_env(
        &[("CARDWISE_DATABASE_URL", "sqlite:///cardwise-missing-dir/cardwise.db")],
        |_dir| {
            let result = migrate::run(LoadOptions::default());
            assert_eq!(result.exit_code, 4);
            assert_eq!(parse_payload(&result.output)["error_class"], "db_connectivity");
        },
    );
}

#[test]
fn linked_cards_move_campaigns_into_the_existing_bucket() {
    with_database_env(&[], |_dir| {
        assert_eq!(seed::run(LoadOptions::default()).exit_code, 0);

        let linked = cards::run(LoadOptions::default(), link_args(false));
        assert_eq!(linked.exit_code, 0, "link failed: {}", linked.output);
        assert_eq!(parse_payload(&linked.output)["data"], serde_json::json!([2]));

        let mut cart = grocery_cart(None);
        cart.cards.clear();
        cart.user_id = Some(5);
        let result = recommend::run(LoadOptions::default(), cart);
        let payload = parse_payload(&result.output);
        assert_eq!(campaign_ids(&payload["data"]["existing_card_recommendations"]), vec![2]);
        assert_eq!(campaign_ids(&payload["data"]["new_card_recommendations"]), vec![1, 3]);

        let unlinked = cards::run(LoadOptions::default(), link_args(true));
        assert_eq!(unlinked.exit_code, 0);
        let again = cards::run(LoadOptions::default(), link_args(true));
        assert_eq!(again.exit_code, 7);
    });
}

#[test]
fn imported_campaigns_queue_for_review_until_approved() {
    with_database_env(&[], |dir| {
        assert_eq!(seed::run(LoadOptions::default()).exit_code, 0);

        let feed = dir.path().join("akbank.json");
        write_feed(
            &feed,
            r#"{"campaigns": [{
                "external_id": "AKB-77", "name": "Axess market weekend", "category": "supermarket",
                "discount_type": "percentage", "discount_value": "5", "max_discount": "30",
                "start_date": "2000-01-01", "end_date": "2099-12-31", "card_id": 2
            }]}"#,
        );

        let imported = import::run(
            LoadOptions::default(),
            ImportArgs { bank_id: 2, file: feed.clone(), auto_approve: false },
        );
        assert_eq!(imported.exit_code, 0, "import failed: {}", imported.output);
        let payload = parse_payload(&imported.output);
        assert_eq!(payload["data"]["created"], 1);

        let queued = review::pending(LoadOptions::default(), PendingArgs { limit: 50 });
        let payload = parse_payload(&queued.output);
        let pending = payload["data"].as_array().expect("pending campaigns array");
        let imported_campaign = pending
            .iter()
            .find(|campaign| campaign["external_id"] == "AKB-77")
            .expect("imported campaign should await review");
        assert_eq!(imported_campaign["category"], "grocery");
        let campaign_id = imported_campaign["id"].as_i64().expect("campaign id");

        let approved = review::run(
            LoadOptions::default(),
            ReviewArgs { campaign_id, decision: DecisionArg::Approve },
        );
        assert_eq!(approved.exit_code, 0, "review failed: {}", approved.output);
        assert_eq!(parse_payload(&approved.output)["data"]["status"], "approved");

        let repeated = review::run(
            LoadOptions::default(),
            ReviewArgs { campaign_id, decision: DecisionArg::Reject },
        );
        assert_eq!(repeated.exit_code, 6, "only pending campaigns can be reviewed");

        let reimported = import::run(
            LoadOptions::default(),
            ImportArgs { bank_id: 2, file: feed, auto_approve: false },
        );
        let payload = parse_payload(&reimported.output);
        assert_eq!(payload["data"]["created"], 0);
    });
}

#[test]
fn import_reports_unreadable_feeds() {
    with_database_env(&[], |dir| {
        let result = import::run(
            LoadOptions::default(),
            ImportArgs {
                bank_id: 1,
                file: dir.path().join("missing.json"),
                auto_approve: false,
            },
        );

        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "feed_read");
    });
}

#[test]
fn invalid_env_override_is_a_config_failure() {
    with_database_env(&[("CARDWISE_RECOMMENDATIONS_TOP_N", "plenty")], |_dir| {
        let result = recommend::run(LoadOptions::default(), grocery_cart(None));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_env_sources() {
    with_database_env(&[("CARDWISE_LOG_LEVEL", "debug")], |_dir| {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let fields = payload["data"].as_array().expect("config fields");
        let level = fields
            .iter()
            .find(|field| field["key"] == "logging.level")
            .expect("logging.level field");
        assert_eq!(level["value"], "debug");
        assert_eq!(level["source"], "env (CARDWISE_LOG_LEVEL)");

        let top_n = fields
            .iter()
            .find(|field| field["key"] == "recommendations.top_n")
            .expect("top_n field");
        assert_eq!(top_n["source"], "default");
    });
}

fn grocery_cart(session_id: Option<&str>) -> RecommendArgs {
    RecommendArgs {
        amount: Decimal::from(500),
        category: "grocery".to_string(),
        merchant: None,
        user_id: None,
        session_id: session_id.map(str::to_string),
        cards: vec![1],
        as_of: None,
    }
}

fn link_args(unlink: bool) -> CardLinkArgs {
    CardLinkArgs { user_id: 5, card_id: 2, unlink }
}

fn campaign_ids(recommendations: &Value) -> Vec<i64> {
    recommendations
        .as_array()
        .expect("recommendations should be an array")
        .iter()
        .map(|recommendation| recommendation["campaign_id"].as_i64().expect("campaign id"))
        .collect()
}

fn write_feed(path: &Path, body: &str) {
    fs::write(path, body).expect("feed should be writable");
}

fn correlation_id(output: &str) -> String {
    let payload = parse_payload(output);
    let message = payload["message"].as_str().expect("message should be a string");
    let (_, tail) = message.split_once("correlation_id=").expect("message names a correlation id");
    tail.trim_end_matches(')').to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

/// Runs `test_fn` against a fresh sqlite file with every `CARDWISE_*` key cleared first.
fn with_database_env(vars: &[(&str, &str)], test_fn: impl FnOnce(&TempDir)) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARDWISE_DATABASE_URL",
        "CARDWISE_DATABASE_MAX_CONNECTIONS",
        "CARDWISE_DATABASE_TIMEOUT_SECS",
        "CARDWISE_RECOMMENDATIONS_TOP_N",
        "CARDWISE_RECOMMENDATIONS_DEFAULT_CURRENCY",
        "CARDWISE_IMPORT_AUTO_APPROVE",
        "CARDWISE_LOGGING_LEVEL",
        "CARDWISE_LOGGING_FORMAT",
        "CARDWISE_LOG_LEVEL",
        "CARDWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }

    let dir = tempfile::tempdir().expect("temp dir");
    let database_url = format!("sqlite://{}?mode=rwc", dir.path().join("cardwise.db").display());
    env::set_var("CARDWISE_DATABASE_URL", &database_url);
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn(&dir);

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
