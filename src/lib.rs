//! explain-viz - Model explanation charts and a local preview dashboard
//!
//! This crate provides:
//! - A typed explanation record with a uniform query surface
//! - Ranking and truncation of scored features for display
//! - Routing of explanation views onto chart primitives
//! - An ephemeral local web dashboard with an explicit lifecycle
//!
//! # Modules
//!
//! ## Data Model
//! - [`explanation`] - Explanation records, payload views and the `data(key)` accessor
//! - [`ranking`] - `sort_take` ranking transform
//!
//! ## Visualization
//! - [`visual`] - Chart routing and the plotting backend seam
//!
//! ## Services
//! - [`dashboard`] - Local dashboard server and its runner
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data model
pub mod explanation;
pub mod ranking;

// Visualization
pub mod visual;

// Services
pub mod dashboard;
pub mod cli;

pub use error::{ExplainError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ExplainError, Result};

    // Data model
    pub use crate::explanation::{
        DataKey, DataView, DetailData, ExplanationPayload, ExplanationRecord, ExplanationType,
        FeatureType, Label, MliEntry, PairwiseGrid, ScoreSeries,
    };

    // Ranking
    pub use crate::ranking::{sort_take, RankingPolicy};

    // Visualization
    pub use crate::visual::{ChartKind, ChartRoute, Figure, FigureBackend, PlotBackend, Visualizer};

    // Dashboard
    pub use crate::dashboard::{DashboardConfig, DashboardRunner, RunnerState};
}
