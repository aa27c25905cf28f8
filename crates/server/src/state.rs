//! Shared server state: configuration, the story store and the adapter registry.

use std::sync::Arc;

use ficrecs_client::{Ao3Adapter, FetchConfig, FetchError, ScrapingService};
use ficrecs_core::{AppConfig, Source, StoryDb, StoryGateway};

/// Everything the tool handlers need, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<StoryDb>,
    pub service: ScrapingService,
}

impl AppState {
    pub fn new(config: AppConfig, db: Arc<StoryDb>) -> Result<Self, FetchError> {
        let service = build_service(&config, db.clone())?;
        Ok(Self { config, db, service })
    }
}

/// Register an adapter for every configured source that has one, in config order.
pub fn build_service(config: &AppConfig, gateway: Arc<dyn StoryGateway>) -> Result<ScrapingService, FetchError> {
    let mut service = ScrapingService::new(gateway);

    for &source in &config.sources {
        let fetch = FetchConfig::from_settings(&config.scraper_settings(source), config.timeout());
        match source {
            Source::Ao3 => service.register(Box::new(Ao3Adapter::new(fetch)?)),
            Source::Ffn | Source::SpaceBattles | Source::SufficientVelocity => {
                tracing::warn!(source = %source, "no adapter available for configured source, skipping");
            }
        }
    }

    Ok(service)
}
