//! Explanation data model
//!
//! Provides the typed explanation record and its query surface:
//! - Global and local explanation types
//! - Continuous, categorical and pairwise feature terms
//! - `overall`, `specific` and `mli` payload views

mod payload;
mod record;

pub use payload::{
    DetailData, ExplanationPayload, ExplanationType, FeatureType, Label, MliEntry, MliValue,
    PairwiseGrid, ScoreSeries,
};
pub use record::{DataKey, DataView, ExplanationRecord};
