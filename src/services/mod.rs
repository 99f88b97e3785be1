// Service exports
pub mod events;
pub mod memory;
pub mod postgres;
pub mod store;

pub use events::{
    emit_best_effort, AnalyticsEvent, EventError, EventKind, EventPublisher, EventSink,
    HttpEventSink, LogEventSink, MemoryEventSink, DEFAULT_EVENT_QUEUE,
};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    AssignmentRepository, ConversationRepository, InsertOutcome, InterestRepository,
    MatchRepository, ProfileRepository, RevealOutcome, Store, StoreError,
};
