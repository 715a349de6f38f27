//! HTTP request handlers for the dashboard

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::error::{DashboardError, Result};
use super::state::DashboardState;
use crate::explanation::ExplanationRecord;
use crate::visual::FigureBackend;

// ============================================================================
// System
// ============================================================================

pub async fn health_check(State(state): State<Arc<DashboardState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "explanations": state.registry.len(),
    }))
}

pub async fn shutdown(State(state): State<Arc<DashboardState>>) -> Json<serde_json::Value> {
    let fired = state.shutdown.fire();
    info!(fired, "Shutdown requested over HTTP");
    Json(serde_json::json!({ "shutting_down": fired }))
}

// ============================================================================
// Explanations
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FigureQuery {
    pub key: Option<usize>,
}

fn lookup(state: &DashboardState, id: &str) -> Result<Arc<ExplanationRecord>> {
    state
        .registry
        .get(id)
        .ok_or_else(|| DashboardError::NotFound(format!("explanation {}", id)))
}

pub async fn list_explanations(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    Json(state.registry.list())
}

pub async fn get_explanation(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let record = lookup(&state, &id)?;
    Ok(Json(serde_json::json!({
        "id": id,
        "name": record.name(),
        "explanation_type": record.explanation_type(),
        "feature_names": record.feature_names(),
        "feature_types": record.feature_types(),
        "selector": record.selector(),
        "has_overall": record.raw().overall.is_some(),
        "specific_count": record.raw().specific.as_ref().map_or(0, Vec::len),
    })))
}

/// Routed figure for `key`; `204 No Content` when there is nothing to draw
pub async fn get_figure(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Query(query): Query<FigureQuery>,
) -> Result<Response> {
    let record = lookup(&state, &id)?;
    match record.visualize(query.key, FigureBackend)? {
        Some(figure) => Ok(Json(figure).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ============================================================================
// UI Handler
// ============================================================================

pub async fn serve_index(State(state): State<Arc<DashboardState>>) -> Html<String> {
    let mut items = String::new();
    for summary in state.registry.list() {
        let label = summary.name.as_deref().unwrap_or(&summary.id);
        let _ = writeln!(
            items,
            r#"<li><a href="/api/explanations/{id}/figure">{label}</a> <small>{ty}, {n} features</small></li>"#,
            id = summary.id,
            label = escape_html(label),
            ty = summary.explanation_type,
            n = summary.features,
        );
    }
    if items.is_empty() {
        items.push_str("<li><em>No explanations registered</em></li>\n");
    }
    Html(INDEX_HTML.replace("{{items}}", &items))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Explanation Dashboard</title>
</head>
<body>
    <h1>Explanation Dashboard</h1>
    <ul>
{{items}}    </ul>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
