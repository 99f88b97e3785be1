//! Scoring dimensions, weight sets and the named weighting presets.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MatchError;

/// Number of scoring dimensions
pub const DIMENSION_COUNT: usize = 9;

/// Closed vocabulary of scoring dimensions, in declaration order.
///
/// Declaration order is significant: explainability output and weight
/// ranking ties are resolved by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Values,
    Causes,
    Skills,
    Experience,
    Verifications,
    Availability,
    Location,
    Compensation,
    Language,
}

impl Dimension {
    pub const ALL: [Dimension; DIMENSION_COUNT] = [
        Dimension::Values,
        Dimension::Causes,
        Dimension::Skills,
        Dimension::Experience,
        Dimension::Verifications,
        Dimension::Availability,
        Dimension::Location,
        Dimension::Compensation,
        Dimension::Language,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Values => "values",
            Dimension::Causes => "causes",
            Dimension::Skills => "skills",
            Dimension::Experience => "experience",
            Dimension::Verifications => "verifications",
            Dimension::Availability => "availability",
            Dimension::Location => "location",
            Dimension::Compensation => "compensation",
            Dimension::Language => "language",
        }
    }

    /// Human-facing label used in explainability statements
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Values => "Values",
            Dimension::Causes => "Causes",
            Dimension::Skills => "Skills",
            Dimension::Experience => "Experience",
            Dimension::Verifications => "Verifications",
            Dimension::Availability => "Availability",
            Dimension::Location => "Location",
            Dimension::Compensation => "Compensation",
            Dimension::Language => "Language",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| MatchError::validation(format!("unknown scoring dimension '{}'", s)))
    }
}

fn check_weight(dimension: Dimension, value: f64) -> Result<f64, MatchError> {
    if !value.is_finite() || value < 0.0 {
        return Err(MatchError::validation(format!(
            "weight for '{}' must be a finite non-negative number, got {}",
            dimension, value
        )));
    }
    Ok(value)
}

/// A complete weight assignment over every dimension.
///
/// Values are non-negative and, once normalized, sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSet {
    weights: [f64; DIMENSION_COUNT],
}

impl WeightSet {
    /// Build a weight set from raw values, rejecting negative or non-finite weights
    pub fn new(weights: [f64; DIMENSION_COUNT]) -> Result<Self, MatchError> {
        for dimension in Dimension::ALL {
            check_weight(dimension, weights[dimension.index()])?;
        }
        Ok(Self { weights })
    }

    /// Build a weight set from string-keyed pairs. Every dimension must be present.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let partial = PartialWeights::from_pairs(pairs)?;
        let mut weights = [0.0; DIMENSION_COUNT];
        for dimension in Dimension::ALL {
            weights[dimension.index()] = partial.get(dimension).ok_or_else(|| {
                MatchError::validation(format!("missing weight for '{}'", dimension))
            })?;
        }
        Self::new(weights)
    }

    #[inline]
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.weights[dimension.index()]
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Iterate `(dimension, weight)` in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    /// Scale so the weights sum to 1.0. An all-zero set is returned unchanged.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return *self;
        }
        let mut weights = self.weights;
        for w in weights.iter_mut() {
            *w /= sum;
        }
        Self { weights }
    }
}

impl Serialize for WeightSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DIMENSION_COUNT))?;
        for (dimension, weight) in self.iter() {
            map.serialize_entry(dimension.as_str(), &weight)?;
        }
        map.end()
    }
}

/// A caller-supplied subset of weights. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct PartialWeights {
    weights: [Option<f64>; DIMENSION_COUNT],
}

impl PartialWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut partial = Self::new();
        for (key, value) in pairs {
            let dimension: Dimension = key.as_ref().parse()?;
            partial.set(dimension, value)?;
        }
        Ok(partial)
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) -> Result<(), MatchError> {
        self.weights[dimension.index()] = Some(check_weight(dimension, value)?);
        Ok(())
    }

    pub fn with(mut self, dimension: Dimension, value: f64) -> Result<Self, MatchError> {
        self.set(dimension, value)?;
        Ok(self)
    }

    #[inline]
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        self.weights[dimension.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.weights.iter().all(Option::is_none)
    }

    /// Sum of the supplied values
    pub fn sum(&self) -> f64 {
        self.weights.iter().flatten().sum()
    }
}

impl TryFrom<BTreeMap<String, f64>> for PartialWeights {
    type Error = MatchError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<PartialWeights> for BTreeMap<String, f64> {
    fn from(partial: PartialWeights) -> Self {
        Dimension::ALL
            .into_iter()
            .filter_map(|d| partial.get(d).map(|w| (d.as_str().to_string(), w)))
            .collect()
    }
}

/// Named weighting strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightPreset {
    #[serde(rename = "mission-first")]
    MissionFirst,
    #[serde(rename = "skills-first")]
    SkillsFirst,
    #[serde(rename = "balanced")]
    Balanced,
}

// values, causes, skills, experience, verifications, availability, location, compensation, language
const MISSION_FIRST: [f64; DIMENSION_COUNT] = [0.35, 0.25, 0.20, 0.10, 0.03, 0.02, 0.02, 0.02, 0.01];
const SKILLS_FIRST: [f64; DIMENSION_COUNT] = [0.10, 0.05, 0.40, 0.25, 0.08, 0.05, 0.03, 0.02, 0.02];
const BALANCED: [f64; DIMENSION_COUNT] = [0.20, 0.15, 0.25, 0.15, 0.08, 0.07, 0.05, 0.03, 0.02];

impl WeightPreset {
    pub const ALL: [WeightPreset; 3] = [
        WeightPreset::MissionFirst,
        WeightPreset::SkillsFirst,
        WeightPreset::Balanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeightPreset::MissionFirst => "mission-first",
            WeightPreset::SkillsFirst => "skills-first",
            WeightPreset::Balanced => "balanced",
        }
    }

    pub fn weights(self) -> WeightSet {
        let weights = match self {
            WeightPreset::MissionFirst => MISSION_FIRST,
            WeightPreset::SkillsFirst => SKILLS_FIRST,
            WeightPreset::Balanced => BALANCED,
        };
        WeightSet { weights }
    }
}

impl Default for WeightPreset {
    fn default() -> Self {
        WeightPreset::Balanced
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightPreset {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeightPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MatchError::validation(format!("unknown weight preset '{}'", s)))
    }
}

/// How an assignment wants to be weighted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum WeightConfig {
    Preset(WeightPreset),
    Custom(PartialWeights),
}

impl WeightConfig {
    pub fn resolve(&self) -> WeightSet {
        match self {
            WeightConfig::Preset(preset) => preset.weights(),
            WeightConfig::Custom(partial) => normalize_weights(partial),
        }
    }
}

/// Look up a preset by its key (`mission-first`, `skills-first`, `balanced`)
pub fn get_preset(key: &str) -> Result<WeightSet, MatchError> {
    Ok(key.parse::<WeightPreset>()?.weights())
}

/// Normalize a partial weight map.
///
/// Supplied values are divided by their sum and overlaid on the `balanced`
/// preset, so omitted dimensions keep balanced's value instead of zero.
/// A zero sum yields the `balanced` preset unchanged. The overlaid set is
/// finally rescaled to sum to 1.0; the rescale is uniform, so relative
/// weights (and therefore every score) are those of the overlay.
pub fn normalize_weights(partial: &PartialWeights) -> WeightSet {
    let sum = partial.sum();
    if sum <= 0.0 {
        return WeightPreset::Balanced.weights();
    }

    let mut weights = BALANCED;
    for dimension in Dimension::ALL {
        if let Some(value) = partial.get(dimension) {
            weights[dimension.index()] = value / sum;
        }
    }

    WeightSet { weights }.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_sum_to_one() {
        for preset in WeightPreset::ALL {
            let sum = preset.weights().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{} sums to {}", preset, sum);
        }
    }

    #[test]
    fn test_get_preset_by_key() {
        let weights = get_preset("skills-first").unwrap();
        assert_eq!(weights.get(Dimension::Skills), 0.40);
        assert_eq!(weights.get(Dimension::Language), 0.02);

        assert!(matches!(get_preset("speed-first"), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_normalize_empty_is_balanced() {
        let weights = normalize_weights(&PartialWeights::new());
        assert_eq!(weights, WeightPreset::Balanced.weights());
    }

    #[test]
    fn test_normalize_all_zero_is_balanced() {
        let partial = PartialWeights::new()
            .with(Dimension::Skills, 0.0)
            .unwrap()
            .with(Dimension::Values, 0.0)
            .unwrap();
        assert_eq!(normalize_weights(&partial), WeightPreset::Balanced.weights());
    }

    #[test]
    fn test_normalize_overlays_balanced() {
        let partial = PartialWeights::new()
            .with(Dimension::Skills, 3.0)
            .unwrap()
            .with(Dimension::Values, 1.0)
            .unwrap();
        let weights = normalize_weights(&partial);

        assert!((weights.sum() - 1.0).abs() < 1e-6);
        // skills:values keeps the supplied 3:1 ratio
        let ratio = weights.get(Dimension::Skills) / weights.get(Dimension::Values);
        assert!((ratio - 3.0).abs() < 1e-9);
        // omitted dimensions keep balanced's proportions relative to each other
        let ratio = weights.get(Dimension::Location) / weights.get(Dimension::Language);
        assert!((ratio - 2.5).abs() < 1e-9);
        // supplied skills share (0.75) vs omitted location (0.05) before rescale
        let ratio = weights.get(Dimension::Skills) / weights.get(Dimension::Location);
        assert!((ratio - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = PartialWeights::from_pairs([("skils", 0.5)]).unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(PartialWeights::from_pairs([("skills", -0.1)]).is_err());
        assert!(PartialWeights::from_pairs([("skills", f64::NAN)]).is_err());
    }

    #[test]
    fn test_weight_set_requires_every_dimension() {
        assert!(WeightSet::from_pairs([("skills", 1.0)]).is_err());
        let full: Vec<(&str, f64)> = Dimension::ALL.iter().map(|d| (d.as_str(), 1.0)).collect();
        let weights = WeightSet::from_pairs(full).unwrap().normalized();
        assert!((weights.get(Dimension::Causes) - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_weights_deserialize() {
        let partial: PartialWeights = serde_json::from_str(r#"{"skills": 2, "language": 1}"#).unwrap();
        assert_eq!(partial.get(Dimension::Skills), Some(2.0));
        assert_eq!(partial.get(Dimension::Values), None);

        let err = serde_json::from_str::<PartialWeights>(r#"{"salary": 1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_weight_config_round_trip() {
        let config: WeightConfig =
            serde_json::from_str(r#"{"kind": "preset", "value": "mission-first"}"#).unwrap();
        assert_eq!(config.resolve(), WeightPreset::MissionFirst.weights());

        let config: WeightConfig =
            serde_json::from_str(r#"{"kind": "custom", "value": {"skills": 1}}"#).unwrap();
        assert!((config.resolve().sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weight_set_serializes_as_map() {
        let json = serde_json::to_value(WeightPreset::Balanced.weights()).unwrap();
        assert_eq!(json["skills"], 0.25);
        assert_eq!(json.as_object().unwrap().len(), DIMENSION_COUNT);
    }
}
