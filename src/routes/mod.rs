// Route exports
pub mod conversations;
pub mod interests;
pub mod matches;
pub mod presets;

use actix_web::web;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::core::presets::{WeightPreset, WeightSet};
use crate::core::{ConversationStageMachine, InterestLedger, MatchGenerator};
use crate::error::MatchError;
use crate::services::{EventPublisher, PostgresStore, Store};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<MatchGenerator>,
    pub ledger: Arc<InterestLedger>,
    pub conversations: Arc<ConversationStageMachine>,
    /// Weights for ad-hoc scoring without a preset or weights
    pub default_weights: WeightSet,
    /// Present when running on PostgreSQL, used by the health check
    pub postgres: Option<Arc<PostgresStore>>,
}

/// Timeouts and defaults shared by the matching components
#[derive(Debug, Clone, Copy)]
pub struct StateOptions {
    pub default_preset: WeightPreset,
    pub fetch_timeout: Duration,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            default_preset: WeightPreset::default(),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl AppState {
    /// Wire every component to one store
    pub fn from_store<S>(store: Arc<S>, events: EventPublisher, options: StateOptions) -> Self
    where
        S: Store + 'static,
    {
        let default_weights = options.default_preset.weights();

        let generator = MatchGenerator::from_store(store.clone(), events.clone())
            .with_default_weights(default_weights)
            .with_fetch_timeout(options.fetch_timeout);
        let ledger = InterestLedger::from_store(store.clone(), events.clone())
            .with_fetch_timeout(options.fetch_timeout);
        let conversations = ConversationStageMachine::from_store(store, events)
            .with_fetch_timeout(options.fetch_timeout);

        Self {
            generator: Arc::new(generator),
            ledger: Arc::new(ledger),
            conversations: Arc::new(conversations),
            default_weights,
            postgres: None,
        }
    }

    pub fn with_postgres(mut self, postgres: Arc<PostgresStore>) -> Self {
        self.postgres = Some(postgres);
        self
    }
}

/// Run `validator` rules and turn failures into a 400
pub(crate) fn validate<T: Validate>(req: &T) -> Result<(), MatchError> {
    req.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        MatchError::validation(errors.to_string())
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(presets::configure)
            .configure(interests::configure)
            .configure(conversations::configure),
    );
}
