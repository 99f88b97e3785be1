// Integration tests for match generation, interest and identity reveal
// against the in-memory store

use blind_match::core::{ConversationStageMachine, InterestLedger, MatchGenerator, MIN_MATCH_SCORE};
use blind_match::core::compute_match_score;
use blind_match::core::signals::{AssignmentSignals, ProfileSignals};
use blind_match::models::{
    Assignment, AssignmentStatus, ConversationStage, InterestTarget, Profile, ProfileKind,
};
use blind_match::services::{EventKind, EventPublisher, MemoryEventSink, MemoryStore};
use blind_match::MatchError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn tags(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}-{}", prefix, i)).collect()
}

fn candidate(values: Vec<String>) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        kind: ProfileKind::Individual,
        display_name: Some("Sam Rivera".to_string()),
        avatar_url: Some("https://cdn.example.org/sam.png".to_string()),
        ready_for_matching: true,
        matches_refreshed_at: None,
        signals: ProfileSignals {
            values,
            ..Default::default()
        },
    }
}

fn organization() -> Profile {
    Profile {
        id: Uuid::new_v4(),
        kind: ProfileKind::Organization,
        display_name: Some("River Trust".to_string()),
        avatar_url: Some("https://cdn.example.org/river.png".to_string()),
        ready_for_matching: false,
        matches_refreshed_at: None,
        signals: ProfileSignals::default(),
    }
}

fn assignment(organization_profile_id: Uuid, values: Vec<String>) -> Assignment {
    Assignment {
        id: Uuid::new_v4(),
        organization_profile_id,
        role_title: "Volunteer Coordinator".to_string(),
        status: AssignmentStatus::Published,
        deleted_at: None,
        weights: None,
        signals: AssignmentSignals {
            values,
            ..Default::default()
        },
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    events: MemoryEventSink,
    publisher: EventPublisher,
    generator: MatchGenerator,
    ledger: InterestLedger,
    conversations: ConversationStageMachine,
}

impl Harness {
    /// Events of one kind delivered so far
    async fn count(&self, kind: EventKind) -> usize {
        self.publisher.flush().await;
        self.events.count(kind).await
    }
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let events = MemoryEventSink::new();
    let (publisher, _) = EventPublisher::start(Arc::new(events.clone()), 64, Duration::from_secs(1));

    Harness {
        generator: MatchGenerator::from_store(store.clone(), publisher.clone()),
        ledger: InterestLedger::from_store(store.clone(), publisher.clone()),
        conversations: ConversationStageMachine::from_store(store.clone(), publisher.clone()),
        store,
        events,
        publisher,
    }
}

#[tokio::test]
async fn test_creation_threshold_boundary() {
    let h = harness();
    let org = organization();

    // 2 shared of 5 values scores exactly 40
    let at_threshold = candidate(tags("v", 2));
    let forty = assignment(org.id, tags("v", 2).into_iter().chain(tags("x", 3)).collect());
    h.store.put_profile(at_threshold.clone()).await;
    h.store.put_assignment(forty.clone()).await;

    let report = h.generator.generate_matches(at_threshold.id).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].overall_score, MIN_MATCH_SCORE);

    // 7 shared of 18 values scores 38.9, which rounds to 39
    let below = candidate(tags("v", 7));
    h.store.put_profile(below.clone()).await;
    let weights = h.generator.weights_for(&forty);
    let thirty_nine = assignment(org.id, tags("v", 7).into_iter().chain(tags("y", 11)).collect());
    let score = compute_match_score(&below.signals, &thirty_nine.signals, &weights).unwrap();
    assert_eq!(score.overall_score, 39);

    h.store.put_assignment(thirty_nine).await;
    let before = h.store.match_count().await;
    let report = h.generator.generate_matches(below.id).await.unwrap();

    // neither the 39 nor the 20 against the first assignment is persisted
    assert!(report.created.is_empty());
    assert_eq!(report.skipped_below_threshold, 2);
    assert_eq!(h.store.match_count().await, before);
}

#[tokio::test]
async fn test_generation_is_idempotent() {
    let h = harness();
    let org = organization();
    let profile = candidate(tags("v", 3));
    h.store.put_profile(profile.clone()).await;
    for _ in 0..4 {
        h.store.put_assignment(assignment(org.id, tags("v", 3))).await;
    }

    let first = h.generator.generate_matches(profile.id).await.unwrap();
    assert_eq!(first.created.len(), 4);
    let persisted = h.generator.list_active_matches(profile.id).await.unwrap();

    let second = h.generator.generate_matches(profile.id).await.unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped_existing, 4);
    assert_eq!(h.store.match_count().await, 4);

    let again = h.generator.list_active_matches(profile.id).await.unwrap();
    assert_eq!(persisted, again);
    assert_eq!(h.count(EventKind::MatchSuggested).await, 4);
}

#[tokio::test]
async fn test_soft_deleted_assignments_are_ignored() {
    let h = harness();
    let org = organization();
    let profile = candidate(tags("v", 3));
    h.store.put_profile(profile.clone()).await;

    let mut deleted = assignment(org.id, tags("v", 3));
    deleted.deleted_at = Some(Utc::now());
    h.store.put_assignment(deleted).await;

    let report = h.generator.generate_matches(profile.id).await.unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.skipped_existing + report.skipped_below_threshold, 0);
}

#[tokio::test]
async fn test_mutual_when_org_targets_first() {
    let h = harness();
    let org = organization();
    let person = candidate(tags("v", 1));
    let a = assignment(org.id, vec![]);
    h.store.put_assignment(a.clone()).await;

    let first = h
        .ledger
        .record_interest(org.id, a.id, InterestTarget::TargetedAt(person.id))
        .await
        .unwrap();
    assert!(!first.mutual);

    let second = h.ledger.record_interest(person.id, a.id, InterestTarget::General).await.unwrap();
    assert!(second.mutual);
    assert_eq!(second.counterpart_profile_id, Some(org.id));
    assert_eq!(h.count(EventKind::MutualInterest).await, 1);
}

#[tokio::test]
async fn test_mutual_when_candidate_applies_first() {
    let h = harness();
    let org = organization();
    let person = candidate(tags("v", 1));
    let a = assignment(org.id, vec![]);
    h.store.put_assignment(a.clone()).await;

    let first = h.ledger.record_interest(person.id, a.id, InterestTarget::General).await.unwrap();
    assert!(!first.mutual);

    let second = h
        .ledger
        .record_interest(org.id, a.id, InterestTarget::TargetedAt(person.id))
        .await
        .unwrap();
    assert!(second.mutual);
    assert_eq!(second.counterpart_profile_id, Some(person.id));
}

#[tokio::test]
async fn test_duplicate_interest_is_indistinguishable() {
    let h = harness();
    let org = organization();
    let person = candidate(tags("v", 1));
    let a = assignment(org.id, vec![]);
    h.store.put_assignment(a.clone()).await;

    let once = h.ledger.record_interest(person.id, a.id, InterestTarget::General).await.unwrap();
    let twice = h.ledger.record_interest(person.id, a.id, InterestTarget::General).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(h.ledger.list_interests(a.id).await.unwrap().len(), 1);
    assert_eq!(h.count(EventKind::InterestRecorded).await, 1);
}

#[tokio::test]
async fn test_interest_in_unknown_assignment() {
    let h = harness();
    let result = h
        .ledger
        .record_interest(Uuid::new_v4(), Uuid::new_v4(), InterestTarget::General)
        .await;
    assert!(matches!(result, Err(MatchError::NotFound { kind: "assignment", .. })));
}

#[tokio::test]
async fn test_reveal_is_idempotent_and_unmasks() {
    let h = harness();
    let org = organization();
    let person = candidate(tags("v", 1));
    h.store.put_profile(org.clone()).await;
    h.store.put_profile(person.clone()).await;

    let conversation = h
        .conversations
        .open_conversation(Uuid::new_v4(), person.id, org.id, None)
        .await
        .unwrap();
    assert_eq!(conversation.stage(), ConversationStage::Masked);

    let masked = h.conversations.display_identity(conversation.id, person.id).await.unwrap();
    assert_eq!(masked.display_name, "Organization");
    assert_eq!(masked.avatar_url, None);

    h.conversations.trigger_identity_reveal(conversation.id).await.unwrap();
    h.conversations.trigger_identity_reveal(conversation.id).await.unwrap();
    assert!(h.conversations.is_revealed(conversation.id).await.unwrap());
    assert_eq!(h.count(EventKind::IdentityRevealed).await, 1);

    let revealed = h.conversations.display_identity(conversation.id, org.id).await.unwrap();
    assert_eq!(revealed.display_name, "Sam Rivera");
    assert_eq!(revealed.avatar_url.as_deref(), Some("https://cdn.example.org/sam.png"));

    // reopening the same pair never resets the stage
    let reopened = h
        .conversations
        .open_conversation(conversation.assignment_id, person.id, org.id, None)
        .await
        .unwrap();
    assert_eq!(reopened.id, conversation.id);
    assert!(reopened.is_revealed());
}

#[tokio::test]
async fn test_reveal_unknown_conversation_is_not_found() {
    let h = harness();
    let missing = Uuid::new_v4();

    assert!(matches!(
        h.conversations.trigger_identity_reveal(missing).await,
        Err(MatchError::NotFound { kind: "conversation", .. })
    ));
    assert!(h.conversations.is_revealed(missing).await.is_err());
}

#[tokio::test]
async fn test_outsider_cannot_view_identity() {
    let h = harness();
    let conversation = h
        .conversations
        .open_conversation(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .unwrap();

    let result = h.conversations.display_identity(conversation.id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(MatchError::Validation(_))));
}

#[tokio::test]
async fn test_concurrent_identical_interests_record_once() {
    let h = harness();
    let org = organization();
    let person = candidate(tags("v", 1));
    let a = assignment(org.id, vec![]);
    h.store.put_assignment(a.clone()).await;

    let (first, second) = tokio::join!(
        h.ledger.record_interest(person.id, a.id, InterestTarget::General),
        h.ledger.record_interest(person.id, a.id, InterestTarget::General),
    );
    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(h.ledger.list_interests(a.id).await.unwrap().len(), 1);
    assert_eq!(h.count(EventKind::InterestRecorded).await, 1);
}

#[tokio::test]
async fn test_concurrent_reveals_publish_once() {
    let h = harness();
    let conversation = h
        .conversations
        .open_conversation(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .unwrap();

    let (first, second, third) = tokio::join!(
        h.conversations.trigger_identity_reveal(conversation.id),
        h.conversations.trigger_identity_reveal(conversation.id),
        h.conversations.trigger_identity_reveal(conversation.id),
    );
    assert!(first.is_ok() && second.is_ok() && third.is_ok());
    assert!(h.conversations.is_revealed(conversation.id).await.unwrap());
    assert_eq!(h.count(EventKind::IdentityRevealed).await, 1);
}
