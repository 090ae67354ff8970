use uuid::Uuid;

use crate::{AccountStore, ResultEngine, Transaction, TransactionStore};

use super::{Engine, EngineConfig};

impl Engine {
    /// Page of an account's history, newest first.
    ///
    /// `limit <= 0` selects the default page size and `offset < 0` is read as
    /// `0`. History rows are immutable, so no lock is taken.
    pub async fn history(
        &self,
        account_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ResultEngine<Vec<Transaction>> {
        let (limit, offset) = page_bounds(&self.config, limit, offset);
        self.database.find_by_id(account_id).await?;
        self.database
            .find_by_account(account_id, limit, offset)
            .await
    }
}

fn page_bounds(config: &EngineConfig, limit: i64, offset: i64) -> (u64, u64) {
    let max = config.max_page_size.max(1);
    let limit = u64::try_from(limit)
        .ok()
        .filter(|limit| *limit > 0)
        .unwrap_or(config.default_page_size)
        .clamp(1, max);
    let offset = u64::try_from(offset).unwrap_or(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_limit_uses_default_page() {
        let config = EngineConfig::default();
        assert_eq!(page_bounds(&config, 0, 0), (10, 0));
        assert_eq!(page_bounds(&config, -3, 0), (10, 0));
        assert_eq!(page_bounds(&config, 25, 5), (25, 5));
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        let config = EngineConfig::default();
        assert_eq!(page_bounds(&config, 5, -7), (5, 0));
    }

    #[test]
    fn limit_is_capped() {
        let config = EngineConfig {
            max_page_size: 50,
            ..EngineConfig::default()
        };
        assert_eq!(page_bounds(&config, 1_000, 0), (50, 0));
    }
}
