//! Explanation record and its read-only accessor

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::payload::{DetailData, ExplanationPayload, ExplanationType, FeatureType, ScoreSeries};
use crate::error::{ExplainError, Result};
use crate::visual::{PlotBackend, Visualizer};

/// Which part of the payload `ExplanationRecord::data` should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// The aggregate `overall` view
    Overall,
    /// The whole payload, for tooling and debugging
    Raw,
    /// One entry of the `specific` view
    Index(usize),
}

impl From<Option<usize>> for DataKey {
    fn from(key: Option<usize>) -> Self {
        match key {
            Some(k) => DataKey::Index(k),
            None => DataKey::Overall,
        }
    }
}

impl From<usize> for DataKey {
    fn from(key: usize) -> Self {
        DataKey::Index(key)
    }
}

/// Borrowed view returned by `ExplanationRecord::data`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataView<'a> {
    Overall(&'a ScoreSeries),
    Specific(&'a DetailData),
    Raw(&'a ExplanationPayload),
}

/// Upstream document shape, validated into a record
#[derive(Deserialize)]
struct ExplanationDocument {
    explanation_type: ExplanationType,
    #[serde(default)]
    feature_names: Vec<String>,
    #[serde(default)]
    feature_types: Vec<FeatureType>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    selector: Option<serde_json::Value>,
    #[serde(flatten)]
    payload: ExplanationPayload,
}

impl TryFrom<ExplanationDocument> for ExplanationRecord {
    type Error = ExplainError;

    fn try_from(doc: ExplanationDocument) -> Result<Self> {
        let mut record = ExplanationRecord::new(
            doc.explanation_type,
            doc.payload,
            doc.feature_names,
            doc.feature_types,
        )?;
        record.name = doc.name;
        record.selector = doc.selector;
        Ok(record)
    }
}

/// An explanation payload plus its metadata.
///
/// Immutable after construction: every accessor borrows, and derived views
/// (ranked, truncated) are built fresh by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExplanationDocument")]
pub struct ExplanationRecord {
    explanation_type: ExplanationType,
    feature_names: Vec<String>,
    feature_types: Vec<FeatureType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<serde_json::Value>,
    #[serde(flatten)]
    payload: ExplanationPayload,
}

impl ExplanationRecord {
    /// Build a record, rejecting payloads whose shape is inconsistent
    pub fn new(
        explanation_type: ExplanationType,
        payload: ExplanationPayload,
        feature_names: Vec<String>,
        feature_types: Vec<FeatureType>,
    ) -> Result<Self> {
        if feature_names.len() != feature_types.len() {
            return Err(ExplainError::InvalidPayload(format!(
                "{} feature names but {} feature types",
                feature_names.len(),
                feature_types.len()
            )));
        }
        payload.validate(feature_names.len())?;

        Ok(Self {
            explanation_type,
            feature_names,
            feature_types,
            name: None,
            selector: None,
            payload,
        })
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the instance selector table
    pub fn with_selector(mut self, selector: serde_json::Value) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let doc: ExplanationDocument =
            serde_json::from_value(value).map_err(|e| ExplainError::InvalidPayload(e.to_string()))?;
        Self::try_from(doc)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: ExplanationDocument =
            serde_json::from_str(json).map_err(|e| ExplainError::InvalidPayload(e.to_string()))?;
        Self::try_from(doc)
    }

    /// Load a record from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn explanation_type(&self) -> ExplanationType {
        self.explanation_type
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_types(&self) -> &[FeatureType] {
        &self.feature_types
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn selector(&self) -> Option<&serde_json::Value> {
        self.selector.as_ref()
    }

    /// Query the payload.
    ///
    /// `Ok(None)` is the "no data" signal: the record has no `specific`
    /// view, which is legitimate for some explanation kinds.
    pub fn data(&self, key: DataKey) -> Result<Option<DataView<'_>>> {
        match key {
            DataKey::Raw => Ok(Some(DataView::Raw(&self.payload))),
            DataKey::Overall => self.overall().map(|o| Some(DataView::Overall(o))),
            DataKey::Index(k) => Ok(self.specific(k)?.map(DataView::Specific)),
        }
    }

    pub fn overall(&self) -> Result<&ScoreSeries> {
        self.payload.overall.as_ref().ok_or_else(|| {
            ExplainError::MissingData(format!(
                "explanation {} has no overall view",
                self.name.as_deref().unwrap_or("<unnamed>")
            ))
        })
    }

    pub fn specific(&self, key: usize) -> Result<Option<&DetailData>> {
        match self.payload.specific.as_deref() {
            None | Some([]) => Ok(None),
            Some(specific) => specific
                .get(key)
                .map(Some)
                .ok_or(ExplainError::InvalidKey {
                    key,
                    len: specific.len(),
                }),
        }
    }

    pub fn raw(&self) -> &ExplanationPayload {
        &self.payload
    }

    /// Row `key` of the first mli entry's scores
    pub fn mli_scores(&self, key: usize) -> Option<&[f64]> {
        self.payload
            .mli
            .as_ref()?
            .first()?
            .value
            .scores
            .get(key)
            .map(Vec::as_slice)
    }

    /// Name and type of feature `key`
    pub fn feature(&self, key: usize) -> Result<(&str, FeatureType)> {
        match (self.feature_names.get(key), self.feature_types.get(key)) {
            (Some(name), Some(ty)) => Ok((name.as_str(), *ty)),
            _ => Err(ExplainError::InvalidKey {
                key,
                len: self.feature_types.len(),
            }),
        }
    }

    /// Route `key` to a chart on `backend`; `Ok(None)` means nothing to draw
    pub fn visualize<B: PlotBackend>(&self, key: Option<usize>, backend: B) -> Result<Option<B::Figure>> {
        Visualizer::new(backend).visualize(self, key)
    }
}
