use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// Errors that can occur when delivering analytics events
#[derive(Debug, Error)]
pub enum EventError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Event endpoint returned error: {0}")]
    ApiError(String),

    #[error("Event delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Analytics events emitted by the matching core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MatchSuggested,
    MatchViewed,
    InterestRecorded,
    MutualInterest,
    IdentityRevealed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::MatchSuggested => "match_suggested",
            EventKind::MatchViewed => "match_viewed",
            EventKind::InterestRecorded => "interest_recorded",
            EventKind::MutualInterest => "mutual_interest",
            EventKind::IdentityRevealed => "identity_revealed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: EventKind,
    pub properties: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(event_type: EventKind, properties: Value) -> Self {
        Self {
            event_type,
            properties,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for analytics events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<(), EventError>;
}

/// Emit an event without letting a slow or failing sink affect the caller.
///
/// Delivery is bounded by `timeout`; failures are logged and dropped.
pub async fn emit_best_effort(sink: &dyn EventSink, event: AnalyticsEvent, timeout: Duration) {
    let outcome = match tokio::time::timeout(timeout, sink.emit(&event)).await {
        Ok(result) => result,
        Err(_) => Err(EventError::Timeout(timeout)),
    };

    if let Err(e) = outcome {
        tracing::warn!(
            event = event.event_type.as_str(),
            error = %e,
            "Dropping analytics event"
        );
    }
}

/// Queue depth used when none is configured
pub const DEFAULT_EVENT_QUEUE: usize = 1024;

enum Command {
    Publish(AnalyticsEvent),
    Flush(oneshot::Sender<()>),
}

/// Non-blocking handle to an [`EventSink`].
///
/// Events go onto a bounded queue drained by a background task, so a slow
/// collector never holds up the caller. A full queue drops the event.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<Command>,
}

impl EventPublisher {
    /// Spawn the delivery task. Must be called inside a tokio runtime.
    ///
    /// The task stops once every publisher clone is dropped.
    pub fn start(sink: Arc<dyn EventSink>, capacity: usize, timeout: Duration) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Publish(event) => emit_best_effort(sink.as_ref(), event, timeout).await,
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Event delivery task stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue an event and return immediately
    pub fn publish(&self, event: AnalyticsEvent) {
        match self.tx.try_send(Command::Publish(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Publish(event))) => {
                tracing::warn!(event = event.event_type.as_str(), "Event queue full, dropping event");
            }
            Err(_) => tracing::warn!("Event delivery task stopped, dropping event"),
        }
    }

    /// Wait until every event queued before this call has been handled
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }
}

/// Posts events as JSON to an HTTP collector
pub struct HttpEventSink {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpEventSink {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EventError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<(), EventError> {
        let mut request = self.client.post(&self.endpoint).json(event);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(EventError::ApiError(format!(
                "Failed to record {}: {}",
                event.event_type.as_str(),
                response.status()
            )));
        }

        tracing::debug!("Recorded event: {}", event.event_type.as_str());

        Ok(())
    }
}

/// Writes events to the log only. Used when no collector is configured.
#[derive(Debug, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<(), EventError> {
        tracing::info!(
            event = event.event_type.as_str(),
            properties = %event.properties,
            "Analytics event"
        );
        Ok(())
    }
}

/// Keeps every event in memory for inspection in tests
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().await.clone()
    }

    /// Number of recorded events of one kind
    pub async fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.event_type == kind)
            .count()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<(), EventError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
