//! Visualization routing
//!
//! Maps explanation views onto chart primitives:
//! - Overall views as top-15 horizontal bars
//! - Local instances as horizontal bars of attribution scores
//! - Global continuous, categorical and pairwise terms as line, bar and heatmap charts

mod backend;
mod router;

pub use backend::{Band, ChartKind, Figure, FigureBackend, HeatmapCells, PlotBackend};
pub use router::{route, split_pairwise_title, ChartRoute, Visualizer, PAIRWISE_SEPARATOR};
