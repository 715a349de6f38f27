//! Plotting backend seam and the default JSON figure backend

use serde::{Deserialize, Serialize};

use crate::explanation::{Label, PairwiseGrid, ScoreSeries};

/// Chart primitives the router draws with.
///
/// The router never inspects the returned figure.
pub trait PlotBackend {
    type Figure;

    /// Horizontal bars, one per label, in the given order (first at the bottom)
    fn horizontal_bar(&self, labels: &[String], scores: &[f64], title: Option<&str>) -> Self::Figure;

    fn line(&self, series: &ScoreSeries, title: &str) -> Self::Figure;

    fn bar(&self, series: &ScoreSeries, title: &str) -> Self::Figure;

    fn pairwise_heatmap(&self, grid: &PairwiseGrid, title: &str, xtitle: &str, ytitle: &str) -> Self::Figure;
}

impl<B: PlotBackend + ?Sized> PlotBackend for &B {
    type Figure = B::Figure;

    fn horizontal_bar(&self, labels: &[String], scores: &[f64], title: Option<&str>) -> Self::Figure {
        (**self).horizontal_bar(labels, scores, title)
    }

    fn line(&self, series: &ScoreSeries, title: &str) -> Self::Figure {
        (**self).line(series, title)
    }

    fn bar(&self, series: &ScoreSeries, title: &str) -> Self::Figure {
        (**self).bar(series, title)
    }

    fn pairwise_heatmap(&self, grid: &PairwiseGrid, title: &str, xtitle: &str, ytitle: &str) -> Self::Figure {
        (**self).pairwise_heatmap(grid, title, xtitle, ytitle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    HorizontalBar,
    Line,
    Bar,
    Heatmap,
}

/// Lower and upper band around a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Heatmap cells, `z[y][x]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCells {
    pub x: Vec<Label>,
    pub y: Vec<Label>,
    pub z: Vec<Vec<f64>>,
}

/// Serializable chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub kind: ChartKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<HeatmapCells>,
}

impl Figure {
    fn new(kind: ChartKind, title: Option<&str>) -> Self {
        Self {
            kind,
            title: title.map(str::to_string),
            x_title: None,
            y_title: None,
            labels: Vec::new(),
            values: Vec::new(),
            band: None,
            cells: None,
        }
    }
}

/// Backend producing `Figure` descriptions, served as JSON by the dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureBackend;

impl PlotBackend for FigureBackend {
    type Figure = Figure;

    fn horizontal_bar(&self, labels: &[String], scores: &[f64], title: Option<&str>) -> Figure {
        let mut figure = Figure::new(ChartKind::HorizontalBar, title);
        figure.labels = labels.iter().cloned().map(Label::Text).collect();
        figure.values = scores.to_vec();
        figure
    }

    fn line(&self, series: &ScoreSeries, title: &str) -> Figure {
        let mut figure = Figure::new(ChartKind::Line, Some(title));
        figure.labels = series.names.clone();
        figure.values = series.scores.clone();
        if let (Some(lower), Some(upper)) = (&series.lower_bounds, &series.upper_bounds) {
            figure.band = Some(Band {
                lower: lower.clone(),
                upper: upper.clone(),
            });
        }
        figure
    }

    fn bar(&self, series: &ScoreSeries, title: &str) -> Figure {
        let mut figure = Figure::new(ChartKind::Bar, Some(title));
        figure.labels = series.names.clone();
        figure.values = series.scores.clone();
        figure
    }

    fn pairwise_heatmap(&self, grid: &PairwiseGrid, title: &str, xtitle: &str, ytitle: &str) -> Figure {
        let mut figure = Figure::new(ChartKind::Heatmap, Some(title));
        figure.x_title = Some(xtitle.to_string());
        figure.y_title = Some(ytitle.to_string());
        figure.cells = Some(HeatmapCells {
            x: grid.left_names.clone(),
            y: grid.right_names.clone(),
            z: grid.transposed(),
        });
        figure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_carries_band() {
        let series = ScoreSeries::new([0.0, 1.0], vec![0.2, 0.4]).with_bounds(vec![0.1, 0.3], vec![0.3, 0.5]);
        let figure = FigureBackend.line(&series, "Age");
        assert_eq!(figure.kind, ChartKind::Line);
        assert_eq!(figure.title.as_deref(), Some("Age"));
        assert_eq!(figure.band.unwrap().upper, vec![0.3, 0.5]);
    }

    #[test]
    fn test_figure_json_shape() {
        let figure = FigureBackend.horizontal_bar(&["a".to_string()], &[0.5], None);
        let json = serde_json::to_value(&figure).unwrap();
        assert_eq!(json["kind"], "horizontal_bar");
        assert_eq!(json["labels"][0], "a");
        assert!(json.get("title").is_none());
    }
}
