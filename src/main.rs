use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use blind_match::config::{LoggingSettings, Settings};
use blind_match::core::MatchRefresher;
use blind_match::routes::{self, AppState, StateOptions};
use blind_match::services::{
    EventPublisher, EventSink, HttpEventSink, LogEventSink, MemoryStore, PostgresStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path segment errors (e.g. a malformed uuid)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_tracing(&settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default());

    info!("Starting Blind Match service...");

    let settings = settings.map_err(|e| io_error("Configuration error", e))?;

    info!("Configuration loaded successfully");

    // Event sink (log-only without a collector)
    let sink: Arc<dyn EventSink> = match &settings.events.endpoint {
        Some(endpoint) => match HttpEventSink::new(
            endpoint.clone(),
            settings.events.api_key.clone(),
            Duration::from_millis(settings.events.timeout_ms),
        ) {
            Ok(sink) => {
                info!("Sending analytics events to {}", endpoint);
                Arc::new(sink)
            }
            Err(e) => {
                warn!("Failed to build event client ({}), logging events instead", e);
                Arc::new(LogEventSink)
            }
        },
        None => Arc::new(LogEventSink),
    };
    let (events, event_task) =
        EventPublisher::start(sink, settings.events.queue_size, settings.matching.event_timeout());

    let options = StateOptions {
        default_preset: settings.matching.default_preset,
        fetch_timeout: settings.matching.fetch_timeout(),
    };
    let refresh_options = settings.refresh.options(settings.matching.fetch_timeout());

    let (app_state, refresher) = match &settings.database.url {
        Some(url) => {
            let db_max_conn = settings.database.max_connections.unwrap_or(10);
            let db_min_conn = settings.database.min_connections.unwrap_or(1);
            let acquire_timeout = Duration::from_secs(settings.database.acquire_timeout_secs.unwrap_or(5));

            let postgres = Arc::new(
                PostgresStore::new(url, db_max_conn, db_min_conn, acquire_timeout)
                    .await
                    .map_err(|e| io_error("PostgreSQL connection error", e))?,
            );

            info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);

            let state = AppState::from_store(postgres.clone(), events.clone(), options)
                .with_postgres(postgres.clone());
            let refresher = MatchRefresher::new(state.generator.clone(), postgres, refresh_options);
            (state, refresher)
        }
        None => {
            warn!("No database url configured, using the in-memory store");

            let memory = Arc::new(MemoryStore::new());
            let state = AppState::from_store(memory.clone(), events.clone(), options);
            let refresher = MatchRefresher::new(state.generator.clone(), memory, refresh_options);
            (state, refresher)
        }
    };

    info!("Matching initialized with default preset: {}", settings.matching.default_preset);

    // Scheduled refresh of stale matches
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = if settings.refresh.enabled {
        let interval = settings.refresh.interval();
        info!("Match refresh every {}s", interval.as_secs());
        Some(actix_web::rt::spawn(async move {
            refresher.run_forever(interval, shutdown_rx).await;
        }))
    } else {
        None
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    shutdown_tx.send(true).ok();
    if let Some(task) = refresh_task {
        if let Err(e) = task.await {
            warn!("Refresh task ended abnormally: {}", e);
        }
    }

    // give queued analytics events one delivery window, then stop
    let drain = settings.matching.event_timeout() * 2;
    if tokio::time::timeout(drain, events.flush()).await.is_err() {
        warn!("Dropping undelivered analytics events on shutdown");
    }
    event_task.abort();

    info!("Blind Match service stopped");
    result
}
