// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Assignment, AssignmentStatus, Conversation, ConversationStage, ConversationStatus,
    DimensionScore, Explainability, Interest, InterestTarget, Match, MatchScoreResult,
    MatchStatus, ParticipantRole, Profile, ProfileKind, Statement, MATCH_TTL_DAYS,
};
pub use requests::{
    AssignmentQuery, GenerateMatchesRequest, NearMatchQuery, NormalizeWeightsRequest, ProfileQuery,
    RecordInterestRequest, ScoreRequest, ViewerQuery,
};
pub use responses::{
    ConversationViewResponse, ErrorResponse, HealthResponse, InterestsResponse, MatchesResponse,
    NearMatchesResponse, PresetResponse, RecordInterestResponse,
};
