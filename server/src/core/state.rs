use std::sync::Arc;

use sqlx::SqlitePool;

use crate::api::dashboard::DashboardCache;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::SqliteLedgerStore;
use crate::ledger::SettlementService;
use crate::utils::AppError;

/// Shared application state, one instance behind `Arc`-cheap clones
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable configuration |
/// | db | SQLite pool wrapper |
/// | settlement | Credit-ledger settlement core |
/// | dashboard_cache | Read-through cache for dashboard aggregates |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub settlement: Arc<SettlementService<SqliteLedgerStore>>,
    pub dashboard_cache: Arc<DashboardCache>,
}

impl ServerState {
    /// Open the database and wire up all services
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::from_db(config.clone(), db))
    }

    /// State over an in-memory database, for tests
    pub async fn initialize_in_memory(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new_in_memory().await?;
        Ok(Self::from_db(config.clone(), db))
    }

    fn from_db(config: Config, db: DbService) -> Self {
        let store = SqliteLedgerStore::new(db.pool.clone());
        Self {
            config,
            db,
            settlement: Arc::new(SettlementService::new(store)),
            dashboard_cache: Arc::new(DashboardCache::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
