//! # boxtrace-db
//!
//! PostgreSQL database layer for boxtrace.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for shipments, containers, transport
//!   events, tracking requests, and delivery tracking
//! - The Postgres-backed relay queue between the inbound webhook path and
//!   the asynchronous consumer
//!
//! Entity repositories expose `*_tx` write methods taking an external
//! `sqlx::Transaction`, so all writes for one notification commit or roll
//! back together.

pub mod container_events;
pub mod containers;
pub mod deliveries;
pub mod pool;
pub mod relay;
pub mod shipments;
pub mod tracking_requests;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use them
pub mod test_fixtures;

// Re-export core types
pub use boxtrace_core::*;

// Re-export repository implementations
pub use container_events::PgContainerEventRepository;
pub use containers::PgContainerRepository;
pub use deliveries::PgDeliveryRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use relay::{PgRelayRepository, RelayMessage};
pub use shipments::PgShipmentRepository;
pub use tracking_requests::PgTrackingRequestRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Shipment repository.
    pub shipments: PgShipmentRepository,
    /// Container repository.
    pub containers: PgContainerRepository,
    /// Append-only transport event repository.
    pub container_events: PgContainerEventRepository,
    /// Tracking request repository.
    pub tracking_requests: PgTrackingRequestRepository,
    /// Delivery state tracker.
    pub deliveries: PgDeliveryRepository,
    /// Relay queue between the webhook endpoint and the consumer.
    pub relay: PgRelayRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            shipments: PgShipmentRepository::new(pool.clone()),
            containers: PgContainerRepository::new(pool.clone()),
            container_events: PgContainerEventRepository::new(pool.clone()),
            tracking_requests: PgTrackingRequestRepository::new(pool.clone()),
            deliveries: PgDeliveryRepository::new(pool.clone()),
            relay: PgRelayRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Begin a transaction for one notification's entity writes.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool.begin().await.map_err(Error::Database)
    }
}
