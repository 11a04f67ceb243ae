//! Periodic job runner for the engagement sequencing engine.
//!
//! Wires the Postgres repositories into the engine and drives two
//! independent cycles: the eligibility scan and the due-step processing
//! run. The engine itself owns no schedule; this binary is the external
//! trigger.

mod config;
mod db;
mod generator;

use crate::config::RunnerConfig;
use crate::db::{
    PgApprovalQueue, PgContactStore, PgDefinitionStore, PgEnrollmentStore, PgTemplateStore,
};
use crate::generator::UnconfiguredGenerator;
use chairside_content::ContentResolver;
use chairside_core::{Clock, SystemClock};
use chairside_engine::{
    ApprovalQueue, AudienceSource, CategoryRegistry, ContactStore, DefinitionStore,
    DueStepProcessor, EligibilityScanner, EnrollmentService, EnrollmentStore, ProcessorConfig,
    ScanConfig,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let contacts = Arc::new(PgContactStore::new(db_pool.clone()));
    let enrollments: Arc<dyn EnrollmentStore> = Arc::new(PgEnrollmentStore::new(db_pool.clone()));
    let definitions: Arc<dyn DefinitionStore> = Arc::new(PgDefinitionStore::new(db_pool.clone()));
    let queue: Arc<dyn ApprovalQueue> = Arc::new(PgApprovalQueue::new(db_pool.clone()));
    let registry = Arc::new(CategoryRegistry::with_defaults());

    tracing::warn!(
        "no text-generation backend configured; drafts fall back to templates and the fixed default"
    );
    let resolver = ContentResolver::new(
        Arc::new(PgTemplateStore::new(db_pool.clone())),
        Arc::new(UnconfiguredGenerator),
        config.practice.fallback_message(),
    );

    let enroller = EnrollmentService::new(
        Arc::clone(&clock),
        Arc::clone(&definitions),
        Arc::clone(&enrollments),
    );
    let scanner = EligibilityScanner::new(
        Arc::clone(&clock),
        Arc::clone(&contacts) as Arc<dyn AudienceSource>,
        Arc::clone(&registry),
        enroller,
        ScanConfig {
            category_batch: config.scan.category_batch,
        },
    );
    let processor = DueStepProcessor::new(
        Arc::clone(&clock),
        Arc::clone(&contacts) as Arc<dyn ContactStore>,
        Arc::clone(&contacts) as Arc<dyn AudienceSource>,
        enrollments,
        definitions,
        queue,
        registry,
        resolver,
        ProcessorConfig {
            batch_size: config.process.batch_size,
            lease_seconds: config.process.lease_seconds,
        },
    );

    // The scan and processing cycles run on independent cadences.
    let scan_interval = config.scan.interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(scan_interval));
        loop {
            interval.tick().await;
            scanner.run().await;
        }
    });

    let process_interval = config.process.interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(process_interval));
        loop {
            interval.tick().await;
            processor.process_due().await;
        }
    });

    tracing::info!(
        scan_interval_seconds = scan_interval,
        process_interval_seconds = process_interval,
        "engagement engine running"
    );

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    tracing::info!("shutting down");
}
