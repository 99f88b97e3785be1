// Criterion benchmarks for Blind Match

use blind_match::core::presets::{normalize_weights, Dimension, PartialWeights, WeightPreset};
use blind_match::core::scoring::{compute_match_score, score_dimensions};
use blind_match::core::signals::{AssignmentSignals, CefrLevel, DimensionScores, ProfileSignals, SkillLevel};
use blind_match::core::MatchGenerator;
use blind_match::models::{Assignment, AssignmentStatus, Profile, ProfileKind};
use blind_match::services::{EventPublisher, LogEventSink, MemoryStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn skill(id: &str, level: u8) -> SkillLevel {
    SkillLevel {
        id: id.to_string(),
        level,
        months: None,
    }
}

fn create_profile_signals() -> ProfileSignals {
    ProfileSignals {
        values: vec!["equity".into(), "transparency".into(), "care".into()],
        causes: vec!["climate".into(), "housing".into()],
        skills: vec![skill("facilitation", 4), skill("sql", 3), skill("grant-writing", 2)],
        experience_months: Some(30),
        verifications: vec!["identity".into()],
        language_level: Some(CefrLevel::B2),
        ..Default::default()
    }
}

fn create_assignment_signals(id: usize) -> AssignmentSignals {
    AssignmentSignals {
        values: vec!["equity".into(), format!("value-{}", id % 7)],
        causes: vec!["climate".into()],
        required_skills: vec![skill("facilitation", 3)],
        nice_to_have_skills: vec![skill("sql", 2), skill(&format!("skill-{}", id % 5), 1)],
        required_verifications: vec!["identity".into(), "background".into()],
        min_language_level: Some(CefrLevel::B1),
        ..Default::default()
    }
}

fn bench_compute_match_score(c: &mut Criterion) {
    let profile = create_profile_signals();
    let assignment = create_assignment_signals(1);
    let weights = WeightPreset::Balanced.weights();

    c.bench_function("compute_match_score", |b| {
        b.iter(|| compute_match_score(black_box(&profile), black_box(&assignment), black_box(&weights)))
    });
}

fn bench_score_dimensions(c: &mut Criterion) {
    let scores = DimensionScores::new()
        .with(Dimension::Values, 90.0)
        .with(Dimension::Causes, 80.0)
        .with(Dimension::Skills, 30.0)
        .with(Dimension::Language, 100.0);
    let weights = WeightPreset::MissionFirst.weights();

    c.bench_function("score_dimensions", |b| {
        b.iter(|| score_dimensions(black_box(&scores), black_box(&weights)))
    });
}

fn bench_normalize_weights(c: &mut Criterion) {
    let partial = PartialWeights::from_pairs([("skills", 3.0), ("values", 1.0), ("language", 0.5)])
        .expect("valid weights");

    c.bench_function("normalize_weights", |b| b.iter(|| normalize_weights(black_box(&partial))));
}

fn bench_generate_matches(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_matches");
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    for count in [100, 1000].iter() {
        let store = Arc::new(MemoryStore::new());
        let organization = Uuid::new_v4();
        runtime.block_on(async {
            for i in 0..*count {
                store
                    .put_assignment(Assignment {
                        id: Uuid::new_v4(),
                        organization_profile_id: organization,
                        role_title: format!("Role {}", i),
                        status: AssignmentStatus::Published,
                        deleted_at: None,
                        weights: None,
                        signals: create_assignment_signals(i),
                    })
                    .await;
            }
        });
        let (events, _) = {
            let _guard = runtime.enter();
            EventPublisher::start(Arc::new(LogEventSink), 4096, Duration::from_secs(1))
        };
        let generator = MatchGenerator::from_store(store.clone(), events);

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                // a fresh profile each time so nothing is skipped as existing
                let profile = Profile {
                    id: Uuid::new_v4(),
                    kind: ProfileKind::Individual,
                    display_name: None,
                    avatar_url: None,
                    ready_for_matching: true,
                    matches_refreshed_at: None,
                    signals: create_profile_signals(),
                };
                runtime.block_on(async {
                    store.put_profile(profile.clone()).await;
                    generator.generate_matches(black_box(profile.id)).await
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_match_score,
    bench_score_dimensions,
    bench_normalize_weights,
    bench_generate_matches
);
criterion_main!(benches);
