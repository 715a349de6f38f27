//! Typed explanation payload: the `overall`, `specific` and `mli` views

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExplainError, Result};
use crate::ranking::{sort_take, RankingPolicy};

/// Scope of an explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationType {
    /// Aggregated over the whole population
    Global,
    /// Per-instance attributions
    Local,
}

impl ExplanationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationType::Global => "global",
            ExplanationType::Local => "local",
        }
    }
}

impl fmt::Display for ExplanationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a feature term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Continuous,
    Categorical,
    /// Interaction of two features, named `"A x B"`
    Pairwise,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Continuous => "continuous",
            FeatureType::Categorical => "categorical",
            FeatureType::Pairwise => "pairwise",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis label: category names are text, bin edges are numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Number(f64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{}", n),
            Label::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

impl From<f64> for Label {
    fn from(n: f64) -> Self {
        Label::Number(n)
    }
}

/// Named scores with optional parallel arrays.
///
/// Every optional array, when present, is index-aligned with `names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSeries {
    pub names: Vec<Label>,
    pub scores: Vec<f64>,
    /// Feature values of the explained instance (local explanations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bounds: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bounds: Option<Vec<f64>>,
    /// Histogram of the feature's training distribution, passed through as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<serde_json::Value>,
    /// Producer fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScoreSeries {
    pub fn new<L: Into<Label>>(names: impl IntoIterator<Item = L>, scores: Vec<f64>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            scores,
            values: None,
            lower_bounds: None,
            upper_bounds: None,
            density: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach instance feature values
    pub fn with_values(mut self, values: Vec<serde_json::Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_density(mut self, density: serde_json::Value) -> Self {
        self.density = Some(density);
        self
    }

    /// Attach a confidence band
    pub fn with_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower_bounds = Some(lower);
        self.upper_bounds = Some(upper);
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names rendered as plain strings, for chart labels
    pub fn label_strings(&self) -> Vec<String> {
        self.names.iter().map(ToString::to_string).collect()
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.names.len();
        check_len("scores", self.scores.len(), n)?;
        if let Some(values) = &self.values {
            check_len("values", values.len(), n)?;
        }
        if let Some(lower) = &self.lower_bounds {
            check_len("lower_bounds", lower.len(), n)?;
        }
        if let Some(upper) = &self.upper_bounds {
            check_len("upper_bounds", upper.len(), n)?;
        }
        Ok(())
    }

    /// Pick entries by position, keeping every parallel array aligned
    pub fn select(&self, indices: &[usize]) -> ScoreSeries {
        fn pick<T: Clone>(src: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| src[i].clone()).collect()
        }

        ScoreSeries {
            names: pick(&self.names, indices),
            scores: pick(&self.scores, indices),
            values: self.values.as_deref().map(|v| pick(v, indices)),
            lower_bounds: self.lower_bounds.as_deref().map(|v| pick(v, indices)),
            upper_bounds: self.upper_bounds.as_deref().map(|v| pick(v, indices)),
            density: self.density.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Ranked and truncated copy according to `policy`; `self` is untouched
    pub fn rank(&self, policy: &RankingPolicy) -> ScoreSeries {
        let positions: Vec<usize> = (0..self.scores.len()).collect();
        let order = sort_take(
            &positions,
            |&i| RankingPolicy::importance_key(self.scores[i]),
            policy.top_n,
            policy.reverse,
        );
        self.select(&order)
    }
}

/// Two-dimensional interaction scores.
///
/// `scores` has one row per left bin and one column per right bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseGrid {
    pub left_names: Vec<Label>,
    pub right_names: Vec<Label>,
    pub scores: Vec<Vec<f64>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PairwiseGrid {
    pub fn validate(&self) -> Result<()> {
        check_len("pairwise rows", self.scores.len(), self.left_names.len())?;
        for (i, row) in self.scores.iter().enumerate() {
            if row.len() != self.right_names.len() {
                return Err(ExplainError::InvalidPayload(format!(
                    "pairwise row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    self.right_names.len()
                )));
            }
        }
        Ok(())
    }

    /// Scores indexed `[right][left]`, the row-per-y layout heatmaps expect
    pub fn transposed(&self) -> Vec<Vec<f64>> {
        (0..self.right_names.len())
            .map(|j| self.scores.iter().map(|row| row[j]).collect())
            .collect()
    }
}

/// Per-key detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailData {
    Grid(PairwiseGrid),
    Series(ScoreSeries),
}

impl DetailData {
    pub fn kind(&self) -> &'static str {
        match self {
            DetailData::Grid(_) => "grid",
            DetailData::Series(_) => "series",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            DetailData::Grid(grid) => grid.validate(),
            DetailData::Series(series) => series.validate(),
        }
    }
}

/// Scores block of an mli entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MliValue {
    /// One row per instance, one column per feature
    pub scores: Vec<Vec<f64>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Alternate-format local attribution payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MliEntry {
    pub explanation_type: String,
    pub value: MliValue,
}

impl MliEntry {
    pub fn new(explanation_type: impl Into<String>, scores: Vec<Vec<f64>>) -> Self {
        Self {
            explanation_type: explanation_type.into(),
            value: MliValue {
                scores,
                extra: serde_json::Map::new(),
            },
        }
    }
}

/// Complete explanation payload as supplied by the producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationPayload {
    #[serde(default)]
    pub overall: Option<ScoreSeries>,
    #[serde(default)]
    pub specific: Option<Vec<DetailData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mli: Option<Vec<MliEntry>>,
}

impl ExplanationPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overall(mut self, overall: ScoreSeries) -> Self {
        self.overall = Some(overall);
        self
    }

    pub fn with_specific(mut self, specific: Vec<DetailData>) -> Self {
        self.specific = Some(specific);
        self
    }

    pub fn with_mli(mut self, mli: Vec<MliEntry>) -> Self {
        self.mli = Some(mli);
        self
    }

    /// Check internal shape; `n_features` bounds the mli score rows
    pub(crate) fn validate(&self, n_features: usize) -> Result<()> {
        if let Some(overall) = &self.overall {
            overall
                .validate()
                .map_err(|e| ExplainError::InvalidPayload(format!("overall: {}", e)))?;
        }
        if let Some(specific) = &self.specific {
            for (i, detail) in specific.iter().enumerate() {
                detail
                    .validate()
                    .map_err(|e| ExplainError::InvalidPayload(format!("specific[{}]: {}", i, e)))?;
            }
        }
        if let Some(entry) = self.mli.as_ref().and_then(|m| m.first()) {
            for (i, row) in entry.value.scores.iter().enumerate() {
                if row.len() != n_features {
                    return Err(ExplainError::InvalidPayload(format!(
                        "mli scores row {} has {} entries for {} features",
                        i,
                        row.len(),
                        n_features
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(ExplainError::InvalidPayload(format!(
            "{} has length {}, expected {}",
            field, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_validate_rejects_ragged_arrays() {
        let series = ScoreSeries::new(["a", "b"], vec![1.0]);
        assert!(matches!(series.validate(), Err(ExplainError::InvalidPayload(_))));

        let banded = ScoreSeries::new(["a", "b"], vec![1.0, 2.0]).with_bounds(vec![0.0], vec![3.0, 3.0]);
        assert!(banded.validate().is_err());
    }

    #[test]
    fn test_rank_keeps_parallel_arrays_aligned() {
        let series = ScoreSeries::new(["a", "b", "c"], vec![0.1, -0.9, 0.5])
            .with_bounds(vec![0.0, -1.0, 0.4], vec![0.2, -0.8, 0.6]);

        let ranked = series.rank(&RankingPolicy::TOP_FEATURES);

        // Most important ends up last (top of a horizontal bar chart)
        assert_eq!(ranked.label_strings(), vec!["a", "c", "b"]);
        assert_eq!(ranked.scores, vec![0.1, 0.5, -0.9]);
        assert_eq!(ranked.lower_bounds, Some(vec![0.0, 0.4, -1.0]));
        // Source is unchanged
        assert_eq!(series.scores, vec![0.1, -0.9, 0.5]);
    }

    #[test]
    fn test_grid_transpose() {
        let grid = PairwiseGrid {
            left_names: vec![Label::from(0.0), Label::from(1.0)],
            right_names: vec!["x".into(), "y".into(), "z".into()],
            scores: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            extra: serde_json::Map::new(),
        };
        grid.validate().unwrap();
        assert_eq!(grid.transposed(), vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn test_detail_data_deserializes_by_shape() {
        let grid: DetailData = serde_json::from_value(serde_json::json!({
            "left_names": [0, 1],
            "right_names": ["a"],
            "scores": [[0.5], [0.7]],
        }))
        .unwrap();
        assert_eq!(grid.kind(), "grid");

        let series: DetailData = serde_json::from_value(serde_json::json!({
            "names": [0.0, 1.5, 3.0],
            "scores": [0.1, 0.2, 0.3],
        }))
        .unwrap();
        assert_eq!(series.kind(), "series");
    }

    #[test]
    fn test_series_keeps_density_and_unknown_fields() {
        let detail = serde_json::json!({
            "names": [0.0, 1.0],
            "scores": [0.1, 0.2],
            "density": {"names": [0.0, 0.5, 1.0], "scores": [3, 7]},
            "extra_note": "binned"
        });
        let series: DetailData = serde_json::from_value(detail.clone()).unwrap();
        assert_eq!(series.kind(), "series");
        assert_eq!(serde_json::to_value(&series).unwrap(), detail);

        let DetailData::Series(series) = series else {
            panic!("expected series");
        };
        let ranked = series.rank(&RankingPolicy::TOP_FEATURES);
        assert_eq!(ranked.density, series.density);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::from(2.5).to_string(), "2.5");
        assert_eq!(Label::from("red").to_string(), "red");
    }
}
