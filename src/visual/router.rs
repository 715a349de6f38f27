//! Chart routing: which primitive draws which explanation view

use tracing::{debug, trace};

use super::backend::PlotBackend;
use crate::error::{ExplainError, Result};
use crate::explanation::{
    DataKey, DataView, DetailData, ExplanationRecord, ExplanationType, FeatureType,
};
use crate::ranking::RankingPolicy;

/// Separator joining the two feature names of a pairwise term
pub const PAIRWISE_SEPARATOR: &str = " x ";

/// Chart chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRoute {
    /// Top features of the overall view as horizontal bars
    TopFeatures,
    /// One instance's attributions as horizontal bars
    LocalInstance,
    Line,
    Bar,
    PairwiseHeatmap,
}

/// Dispatch table. `feature_type` is `None` for overall requests.
pub fn route(explanation_type: ExplanationType, feature_type: Option<FeatureType>) -> Result<ChartRoute> {
    use ExplanationType::*;
    use FeatureType::*;

    match (explanation_type, feature_type) {
        (_, None) => Ok(ChartRoute::TopFeatures),
        (Local, Some(Continuous | Categorical)) => Ok(ChartRoute::LocalInstance),
        (Global, Some(Continuous)) => Ok(ChartRoute::Line),
        (Global, Some(Categorical)) => Ok(ChartRoute::Bar),
        (Global, Some(Pairwise)) => Ok(ChartRoute::PairwiseHeatmap),
        (Local, Some(Pairwise)) => Err(unsupported(explanation_type, Pairwise.as_str())),
    }
}

/// Split `"A x B"` into `("A", "B")`.
///
/// Precondition: `title` contains `" x "`. Feature names that themselves
/// contain the separator split in the wrong place; only the first two
/// segments are used.
pub fn split_pairwise_title(title: &str) -> Result<(&str, &str)> {
    let mut parts = title.split(PAIRWISE_SEPARATOR);
    match (parts.next(), parts.next()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ExplainError::Configuration(format!(
            "pairwise feature title {:?} does not contain {:?}",
            title, PAIRWISE_SEPARATOR
        ))),
    }
}

fn unsupported(explanation_type: ExplanationType, feature_type: &str) -> ExplainError {
    ExplainError::UnsupportedConfiguration {
        explanation_type: explanation_type.to_string(),
        feature_type: feature_type.to_string(),
    }
}

/// Routes explanation views to a plotting backend
#[derive(Debug, Clone, Default)]
pub struct Visualizer<B> {
    backend: B,
}

impl<B: PlotBackend> Visualizer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Render `key` of `record`.
    ///
    /// `key == None` draws the overall summary. `Ok(None)` means there is
    /// nothing to draw, which callers skip silently.
    pub fn visualize(&self, record: &ExplanationRecord, key: Option<usize>) -> Result<Option<B::Figure>> {
        let view = match record.data(DataKey::from(key))? {
            Some(view) => view,
            None => {
                debug!(key = ?key, "No detail data for key, nothing to visualize");
                return Ok(None);
            }
        };

        let (key, detail) = match (key, view) {
            (None, DataView::Overall(overall)) => {
                let ranked = overall.rank(&RankingPolicy::TOP_FEATURES);
                trace!(kept = ranked.len(), total = overall.len(), "Ranked overall view");
                return Ok(Some(self.backend.horizontal_bar(
                    &ranked.label_strings(),
                    &ranked.scores,
                    record.name(),
                )));
            }
            (Some(k), DataView::Specific(detail)) => (k, detail),
            (_, other) => {
                return Err(ExplainError::MissingData(format!(
                    "unexpected view {:?} for key {:?}",
                    other, key
                )))
            }
        };

        let (title, feature_type) = record.feature(key)?;
        let chart = route(record.explanation_type(), Some(feature_type))?;
        debug!(
            key,
            explanation_type = %record.explanation_type(),
            feature_type = %feature_type,
            route = ?chart,
            "Routing explanation view"
        );

        let figure = match chart {
            ChartRoute::LocalInstance => {
                // Ordering is computed on the detail data, but the values drawn
                // come unsorted from the mli scores row for this instance.
                if let DetailData::Series(series) = detail {
                    let ranked = series.rank(&RankingPolicy::TOP_FEATURES);
                    trace!(kept = ranked.len(), "Ranked local detail view");
                }
                let Some(scores) = record.mli_scores(key) else {
                    debug!(key, "No mli scores for instance, nothing to visualize");
                    return Ok(None);
                };
                self.backend
                    .horizontal_bar(record.feature_names(), scores, record.name())
            }
            ChartRoute::Line => match detail {
                DetailData::Series(series) => self.backend.line(series, title),
                DetailData::Grid(_) => return Err(shape_mismatch(record, feature_type, detail)),
            },
            ChartRoute::Bar => match detail {
                DetailData::Series(series) => self.backend.bar(series, title),
                DetailData::Grid(_) => return Err(shape_mismatch(record, feature_type, detail)),
            },
            ChartRoute::PairwiseHeatmap => match detail {
                DetailData::Grid(grid) => {
                    let (xtitle, ytitle) = split_pairwise_title(title)?;
                    self.backend.pairwise_heatmap(grid, title, xtitle, ytitle)
                }
                DetailData::Series(_) => return Err(shape_mismatch(record, feature_type, detail)),
            },
            ChartRoute::TopFeatures => unreachable!("keyed requests never route to the overall chart"),
        };

        Ok(Some(figure))
    }
}

fn shape_mismatch(record: &ExplanationRecord, feature_type: FeatureType, detail: &DetailData) -> ExplainError {
    unsupported(
        record.explanation_type(),
        &format!("{} ({} data)", feature_type, detail.kind()),
    )
}
