//! Tracked-product universe: the set of broker symbols the fleet should be
//! watching, derived from the current-main and next-main contract of every
//! tracked product.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sqlx::PgPool;

use crate::error::StorageError;

const QUERY: &str = r#"
    SELECT DISTINCT c.tqsdk_code
    FROM md_product_info p
    JOIN md_contract_info c ON p.current_main_contract_code = c.contract_code
    WHERE p.current_main_contract_code IS NOT NULL AND c.tqsdk_code IS NOT NULL
    UNION
    SELECT DISTINCT c.tqsdk_code
    FROM md_product_info p
    JOIN md_contract_info c ON p.next_main_contract_code = c.contract_code
    WHERE p.next_main_contract_code IS NOT NULL AND c.tqsdk_code IS NOT NULL
"#;

struct Cache {
    symbols: Vec<String>,
    last_refresh: Option<Instant>,
}

/// Caches the universe query for `refresh_interval`, falling back to the
/// last good snapshot if a refresh attempt fails.
pub struct UniverseLoader {
    pool: PgPool,
    refresh_interval: Duration,
    cache: Mutex<Cache>,
}

impl UniverseLoader {
    pub fn new(pool: PgPool, refresh_interval: Duration) -> Self {
        Self {
            pool,
            refresh_interval,
            cache: Mutex::new(Cache {
                symbols: Vec::new(),
                last_refresh: None,
            }),
        }
    }

    pub async fn load(&self) -> Vec<String> {
        {
            let cache = self.cache.lock();
            if let Some(last) = cache.last_refresh {
                if last.elapsed() < self.refresh_interval {
                    return cache.symbols.clone();
                }
            }
        }

        match self.query().await {
            Ok(symbols) => {
                let mut cache = self.cache.lock();
                cache.symbols = symbols.clone();
                cache.last_refresh = Some(Instant::now());
                symbols
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh universe, keeping stale snapshot");
                self.cache.lock().symbols.clone()
            }
        }
    }

    pub async fn force_refresh(&self) -> Vec<String> {
        self.cache.lock().last_refresh = None;
        self.load().await
    }

    async fn query(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(QUERY).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(code,)| code).collect())
    }
}
