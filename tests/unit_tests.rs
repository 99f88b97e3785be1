// Unit tests for Blind Match scoring and weights

use blind_match::core::presets::{get_preset, normalize_weights, Dimension, PartialWeights, WeightPreset, WeightSet};
use blind_match::core::scoring::{compute_match_score, score_dimensions};
use blind_match::core::signals::{AssignmentSignals, CefrLevel, DimensionScores, ProfileSignals, SkillLevel};
use blind_match::MatchError;

fn scenario_scores() -> DimensionScores {
    DimensionScores::new()
        .with(Dimension::Values, 90.0)
        .with(Dimension::Causes, 80.0)
        .with(Dimension::Skills, 70.0)
        .with(Dimension::Experience, 60.0)
        .with(Dimension::Availability, 50.0)
        .with(Dimension::Location, 100.0)
        .with(Dimension::Compensation, 50.0)
        .with(Dimension::Language, 100.0)
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_normalize_positive_sum_totals_one() {
    let inputs = vec![
        vec![("skills", 2.0), ("values", 1.0)],
        vec![("language", 0.001)],
        vec![("values", 5.0), ("causes", 5.0), ("skills", 5.0), ("experience", 5.0)],
        vec![("compensation", 100.0), ("location", 0.0)],
    ];

    for pairs in inputs {
        let partial = PartialWeights::from_pairs(pairs).unwrap();
        let weights = normalize_weights(&partial);
        assert!((weights.sum() - 1.0).abs() < 1e-6, "sum was {}", weights.sum());
    }
}

#[test]
fn test_normalize_empty_is_balanced() {
    assert_eq!(normalize_weights(&PartialWeights::new()), WeightPreset::Balanced.weights());

    let zeros = PartialWeights::from_pairs([("values", 0.0), ("skills", 0.0)]).unwrap();
    assert_eq!(normalize_weights(&zeros), WeightPreset::Balanced.weights());
}

#[test]
fn test_normalize_keeps_balanced_for_omitted_dimensions() {
    let partial = PartialWeights::from_pairs([("skills", 2.0), ("values", 1.0)]).unwrap();
    let weights = normalize_weights(&partial);

    // supplied values become 2/3 and 1/3 before the final rescale; omitted
    // dimensions keep balanced's 0.15 and 0.02
    let ratio = weights.get(Dimension::Skills) / weights.get(Dimension::Causes);
    assert!((ratio - (2.0 / 3.0) / 0.15).abs() < 1e-9);

    let ratio = weights.get(Dimension::Causes) / weights.get(Dimension::Language);
    assert!((ratio - 0.15 / 0.02).abs() < 1e-9);
}

#[test]
fn test_malformed_weights_rejected() {
    assert!(matches!(
        PartialWeights::from_pairs([("vibes", 1.0)]),
        Err(MatchError::Validation(_))
    ));
    assert!(matches!(
        PartialWeights::from_pairs([("skills", -0.5)]),
        Err(MatchError::Validation(_))
    ));
    assert!(PartialWeights::from_pairs([("skills", f64::NAN)]).is_err());
    assert!(WeightSet::from_pairs([("skills", 1.0)]).is_err());
}

#[test]
fn test_get_preset_by_name() {
    let mission = get_preset("mission-first").unwrap();
    assert_eq!(mission.get(Dimension::Values), 0.35);
    assert_eq!(mission.get(Dimension::Language), 0.01);

    let skills = get_preset("skills-first").unwrap();
    assert_eq!(skills.get(Dimension::Skills), 0.40);

    assert!(matches!(get_preset("chaos"), Err(MatchError::Validation(_))));
}

#[test]
fn test_scenario_without_verifications() {
    let result = score_dimensions(&scenario_scores(), &WeightPreset::Balanced.weights()).unwrap();

    // 68.5 over the 0.92 of weight that has data
    assert_eq!(result.overall_score, 74);
    assert!(result.is_near_match);
    assert!(!result.is_strong_match);

    let strengths: Vec<Dimension> = result.explainability.strengths.iter().map(|s| s.dimension).collect();
    assert_eq!(
        strengths,
        vec![Dimension::Values, Dimension::Causes, Dimension::Location, Dimension::Language]
    );
    assert!(result.explainability.gaps.is_empty());

    let verifications = result
        .breakdown
        .iter()
        .find(|d| d.dimension == Dimension::Verifications)
        .unwrap();
    assert_eq!(verifications.raw_score, None);
}

#[test]
fn test_scoring_is_deterministic() {
    let weights = WeightPreset::MissionFirst.weights();
    let first = score_dimensions(&scenario_scores(), &weights).unwrap();

    for _ in 0..10 {
        assert_eq!(score_dimensions(&scenario_scores(), &weights).unwrap(), first);
    }
}

#[test]
fn test_badge_thresholds() {
    let weights = WeightPreset::Balanced.weights();
    let badge = |raw: f64| {
        let result = score_dimensions(&DimensionScores::new().with(Dimension::Skills, raw), &weights).unwrap();
        (result.overall_score, result.is_strong_match, result.is_near_match)
    };

    assert_eq!(badge(80.0), (80, true, false));
    assert_eq!(badge(79.0), (79, false, true));
    assert_eq!(badge(60.0), (60, false, true));
    assert_eq!(badge(59.0), (59, false, false));
}

#[test]
fn test_gap_with_suggestion_for_weighted_dimension() {
    let scores = DimensionScores::new()
        .with(Dimension::Values, 20.0)
        .with(Dimension::Skills, 90.0);
    let result = score_dimensions(&scores, &WeightPreset::MissionFirst.weights()).unwrap();

    assert_eq!(result.explainability.gaps.len(), 1);
    assert_eq!(result.explainability.gaps[0].dimension, Dimension::Values);
    assert_eq!(result.explainability.improvement_suggestions[0].dimension, Dimension::Values);
    assert_eq!(result.explainability.strengths[0].dimension, Dimension::Skills);
}

#[test]
fn test_signals_end_to_end() {
    let profile = ProfileSignals {
        values: tags(&["equity", "transparency"]),
        causes: tags(&["climate"]),
        skills: vec![SkillLevel { id: "grant-writing".to_string(), level: 4, months: Some(36) }],
        language_level: Some(CefrLevel::C1),
        ..Default::default()
    };
    let assignment = AssignmentSignals {
        values: tags(&["Equity", "transparency"]),
        causes: tags(&["climate"]),
        required_skills: vec![SkillLevel { id: "grant-writing".to_string(), level: 3, months: None }],
        min_language_level: Some(CefrLevel::B2),
        ..Default::default()
    };

    let result = compute_match_score(&profile, &assignment, &WeightPreset::Balanced.weights()).unwrap();
    assert_eq!(result.overall_score, 100);
    assert!(result.is_strong_match);
}

#[test]
fn test_missing_required_skill_is_a_gap() {
    let profile = ProfileSignals {
        values: tags(&["equity"]),
        ..Default::default()
    };
    let assignment = AssignmentSignals {
        values: tags(&["equity"]),
        required_skills: vec![SkillLevel { id: "sql".to_string(), level: 2, months: None }],
        ..Default::default()
    };

    let result = compute_match_score(&profile, &assignment, &WeightPreset::SkillsFirst.weights()).unwrap();
    let skills = result.breakdown.iter().find(|d| d.dimension == Dimension::Skills).unwrap();
    assert_eq!(skills.raw_score, Some(0.0));
    assert!(result.explainability.gaps.iter().any(|g| g.dimension == Dimension::Skills));
}
