//! # Tiny Wins Backend
//!
//! Non-UI logic for Tiny Wins: logging a child's moments, tracking progress
//! toward rewards and deciding when to celebrate.
//!
//! ## Architecture
//!
//! ```text
//! Front end (any)
//!     ↓
//! IO Layer (DTO mapping, display queries)
//!     ↓
//! Domain Layer (services, progress, celebrations)
//!     ↓
//! Storage Layer (in-memory arena or CSV/YAML files)
//! ```
//!
//! [`Backend`] is the application-state container. A front end creates one,
//! calls its services directly and subscribes to [`DomainNotification`]s to
//! refresh its views.

use anyhow::Result;
use log::info;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod domain;
pub mod io;
pub mod storage;

use domain::{
    BehaviorService, CelebrationEngine, ChildService, Clock, DomainNotification, EngineConfig,
    NotificationHub, RewardService, SystemClock,
};
use storage::csv::ConfigRepository;
use storage::{Connection, CsvConnection, MemoryConnection};

pub use domain::PatternDetector;

/// Holds every service for one family's data
#[derive(Clone)]
pub struct Backend<C: Connection> {
    pub child_service: ChildService<C>,
    pub behavior_service: BehaviorService<C>,
    pub reward_service: RewardService<C>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    notifications: NotificationHub,
}

impl<C: Connection> Backend<C> {
    pub fn new(connection: C, config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let connection = Arc::new(connection);
        let notifications = NotificationHub::new(config.notification_capacity);
        let engine = CelebrationEngine::new(&config);

        let child_service =
            ChildService::new(connection.clone(), clock.clone(), notifications.clone());
        let reward_service =
            RewardService::new(connection.clone(), clock.clone(), notifications.clone());
        let behavior_service = BehaviorService::new(
            connection,
            reward_service.clone(),
            engine,
            clock.clone(),
            notifications.clone(),
        );

        Ok(Self {
            child_service,
            behavior_service,
            reward_service,
            config,
            clock,
            notifications,
        })
    }

    /// Same backend with a custom pattern detector plugged into celebrations
    pub fn with_pattern_detector(
        connection: C,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        detector: Arc<dyn PatternDetector>,
    ) -> Result<Self> {
        let mut backend = Self::new(connection.clone(), config, clock)?;
        let connection = Arc::new(connection);
        let engine = CelebrationEngine::new(&backend.config).with_pattern_detector(detector);
        backend.behavior_service = BehaviorService::new(
            connection,
            backend.reward_service.clone(),
            engine,
            backend.clock.clone(),
            backend.notifications.clone(),
        );
        Ok(backend)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Receive every change completed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<DomainNotification> {
        self.notifications.subscribe()
    }
}

impl Backend<MemoryConnection> {
    /// Backend over a fresh in-memory arena
    pub fn in_memory(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(MemoryConnection::new(), config, clock)
    }
}

impl Backend<CsvConnection> {
    /// Open (or create) a data directory, loading `tiny_wins.yaml` from it
    pub fn open<P: AsRef<Path>>(data_directory: P) -> Result<Self> {
        let connection = CsvConnection::new(data_directory)?;
        Self::open_connection(connection)
    }

    /// Open the platform default data directory
    pub fn open_default() -> Result<Self> {
        Self::open_connection(CsvConnection::new_default()?)
    }

    fn open_connection(connection: CsvConnection) -> Result<Self> {
        info!(
            "Opening Tiny Wins data in {}",
            connection.base_directory().display()
        );
        let config = ConfigRepository::new(connection.clone()).load_or_create()?;
        Self::new(connection, config, Arc::new(SystemClock))
    }
}
