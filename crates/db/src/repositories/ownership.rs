use tracing::debug;

use cardwise_core::domain::catalog::{CardId, CardOwnership};
use cardwise_core::errors::ApplicationError;
use cardwise_core::ports::CardOwnershipSource;

use super::RepositoryError;
use crate::DbPool;

/// Persisted user to card associations (`user_credit_cards`).
pub struct SqlCardOwnershipRepository {
    pool: DbPool,
}

impl SqlCardOwnershipRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Links `card_id` to `user_id`, reactivating a previously unlinked row.
    pub async fn link_card(&self, user_id: i64, card_id: CardId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_credit_cards (user_id, card_id, is_active) VALUES (?, ?, 1)
             ON CONFLICT (user_id, card_id) DO UPDATE SET is_active = 1",
        )
        .bind(user_id)
        .bind(card_id.0)
        .execute(&self.pool)
        .await?;

        debug!(event_name = "ownership.card.linked", user_id, card_id = card_id.0, "card linked");
        Ok(())
    }

    /// Deactivates the association. Returns whether an active link existed.
    pub async fn unlink_card(
        &self,
        user_id: i64,
        card_id: CardId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE user_credit_cards SET is_active = 0
             WHERE user_id = ? AND card_id = ? AND is_active = 1",
        )
        .bind(user_id)
        .bind(card_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn active_cards(&self, user_id: i64) -> Result<CardOwnership, RepositoryError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT card_id FROM user_credit_cards
             WHERE user_id = ? AND is_active = 1
             ORDER BY card_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CardOwnership::from_ids(ids.into_iter().map(CardId)))
    }
}

#[async_trait::async_trait]
impl CardOwnershipSource for SqlCardOwnershipRepository {
    async fn owned_cards(&self, user_id: i64) -> Result<CardOwnership, ApplicationError> {
        Ok(self.active_cards(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use cardwise_core::domain::catalog::CardId;
    use cardwise_core::ports::CardOwnershipSource;

    use super::SqlCardOwnershipRepository;
    use crate::{migrations, open_pool, DbPool};

    async fn setup() -> DbPool {
        let pool = open_pool("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO banks (id, name) VALUES (1, 'Akbank');
             INSERT INTO credit_cards (id, bank_id, name)
                 VALUES (10, 1, 'Axess'), (11, 1, 'Wings');",
        )
        .execute(&pool)
        .await
        .expect("seed cards");
        pool
    }

    #[tokio::test]
    async fn owned_cards_only_include_active_links() {
        let repo = SqlCardOwnershipRepository::new(setup().await);
        repo.link_card(7, CardId(10)).await.expect("link");
        repo.link_card(7, CardId(11)).await.expect("link");
        repo.link_card(8, CardId(11)).await.expect("link other user");

        assert!(repo.unlink_card(7, CardId(11)).await.expect("unlink"));
        assert!(!repo.unlink_card(7, CardId(11)).await.expect("already unlinked"));

        let owned = repo.owned_cards(7).await.expect("owned");
        assert_eq!(owned.iter().collect::<Vec<_>>(), vec![CardId(10)]);
    }

    #[tokio::test]
    async fn relinking_reactivates_without_duplicating() {
        let repo = SqlCardOwnershipRepository::new(setup().await);
        repo.link_card(7, CardId(10)).await.expect("link");
        repo.unlink_card(7, CardId(10)).await.expect("unlink");
        repo.link_card(7, CardId(10)).await.expect("relink");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_credit_cards")
            .fetch_one(&repo.pool)
            .await
            .expect("count");
        assert_eq!(rows, 1);
        assert!(repo.owned_cards(7).await.expect("owned").contains(CardId(10)));
    }

    #[tokio::test]
    async fn unknown_user_owns_nothing() {
        let repo = SqlCardOwnershipRepository::new(setup().await);

        assert!(repo.owned_cards(404).await.expect("owned").is_empty());
    }
}
