//! HTTP request handlers for API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::comments::{self, Comment};
use crate::comparison::ComparisonMode;
use crate::correlation::{CorrelationCell, CorrelationMatrix, DEFAULT_MARKETS};
use crate::indicators::{Indicator, IndicatorOutput, IndicatorParams};
use crate::layout::{self, LayoutConfig, SectionConfig, View};
use crate::metrics::{FieldChange, FieldKind, FieldStatistics};
use crate::overview::{self, HeatMapCell, VolatilityPanel, DEFAULT_SPREADS};
use crate::record::{self, DateRange, Dataset, Record, TimeRange};
use crate::settings::{self, SettingsPatch, UserSettings};

const DEFAULT_AUTHOR: &str = "Anonymous";

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "records": state.dataset.len(),
    }))
}

// Dataset queries

/// Selects the records a query asks for: an explicit `start`/`end` pair wins
/// over a preset `range`, which defaults to the last 30 records.
fn select_records<'a>(
    dataset: &'a Dataset,
    range: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<&'a [Record], ApiError> {
    match (start, end) {
        (Some(start), Some(end)) => {
            let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
                .map_err(|e| ApiError::InvalidDateRange(format!("Invalid start date: {}", e)))?;
            let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
                .map_err(|e| ApiError::InvalidDateRange(format!("Invalid end date: {}", e)))?;
            let date_range = DateRange::new(start, end);
            if !date_range.is_valid() {
                return Err(ApiError::InvalidDateRange(
                    "Start date must be before or equal to end date".to_string(),
                ));
            }
            Ok(dataset.within(&date_range))
        }
        (None, None) => {
            let range = match range {
                Some(raw) => raw.parse::<TimeRange>()?,
                None => TimeRange::default(),
            };
            Ok(dataset.take_range(range))
        }
        _ => Err(ApiError::InvalidDateRange(
            "Both start and end are required for a custom range".to_string(),
        )),
    }
}

fn ensure_field(dataset: &Dataset, field: &str) -> Result<(), ApiError> {
    if dataset.field_names().iter().any(|name| name == field) {
        Ok(())
    } else {
        Err(ApiError::FieldNotFound(field.to_string()))
    }
}

/// Splits a comma-separated field list, or returns the defaults.
fn field_list(raw: Option<&str>, defaults: &[&str]) -> Vec<String> {
    match raw {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        None => defaults.iter().map(|name| name.to_string()).collect(),
    }
}

/// Query parameters selecting a window of records
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Information about a single column
#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub latest_date: Option<String>,
    pub fields: Vec<FieldInfo>,
}

/// GET /fields - List dataset columns
pub async fn list_fields(State(state): State<Arc<AppState>>) -> Json<FieldsResponse> {
    let fields = state
        .dataset
        .field_names()
        .into_iter()
        .map(|name| FieldInfo {
            kind: FieldKind::classify(&name),
            name,
        })
        .collect();

    Json(FieldsResponse {
        latest_date: state
            .dataset
            .latest()
            .and_then(Record::date_str)
            .map(str::to_string),
        fields,
    })
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<Record>,
}

/// GET /records - Records for a preset or custom range, most recent first
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let records = select_records(
        &state.dataset,
        params.range.as_deref(),
        params.start.as_deref(),
        params.end.as_deref(),
    )?;

    Ok(Json(RecordsResponse {
        count: records.len(),
        records: records.to_vec(),
    }))
}

// Comparison and statistics

/// Query parameters for the comparison endpoint
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub mode: Option<String>,
    /// Reference record, 0 being the most recent
    pub index: Option<usize>,
}

/// GET /compare/:field - Change of a column against its baseline
///
/// Without `mode`, the stored default comparison mode is used.
pub async fn compare_field(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<FieldChange>, ApiError> {
    ensure_field(&state.dataset, &field)?;

    let mode = match params.mode.as_deref() {
        Some(raw) => raw.parse::<ComparisonMode>()?,
        None => {
            let store = state.store.lock().await;
            settings::load_settings(&**store).default_comparison_mode
        }
    };

    let index = params.index.unwrap_or(0);
    let records = state.dataset.records();
    if index >= records.len() {
        return Err(ApiError::InvalidParameter(format!(
            "Index {} is out of range for {} records",
            index,
            records.len()
        )));
    }

    let mut change = FieldChange::resolve(&records[index..], &field, mode);
    change.compare_index = change.compare_index.map(|i| i + index);

    tracing::debug!(field = %field, %mode, index, "Resolved comparison");

    Ok(Json(change))
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub field: String,
    #[serde(flatten)]
    pub statistics: FieldStatistics,
}

/// GET /statistics/:field - Summary statistics over a range
pub async fn field_statistics(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    ensure_field(&state.dataset, &field)?;
    let records = select_records(
        &state.dataset,
        params.range.as_deref(),
        params.start.as_deref(),
        params.end.as_deref(),
    )?;

    Ok(Json(StatisticsResponse {
        statistics: FieldStatistics::for_field(records, &field),
        field,
    }))
}

// Indicators

/// Query parameters for the indicator endpoint
#[derive(Debug, Default, Deserialize)]
pub struct IndicatorQuery {
    pub period: Option<usize>,
    pub multiplier: Option<f64>,
    pub tolerance: Option<f64>,
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    pub field: String,
    pub indicator: Indicator,
    #[serde(flatten)]
    pub output: IndicatorOutput,
}

/// GET /indicators/:field/:indicator - Chart overlay for a column
pub async fn get_indicator(
    State(state): State<Arc<AppState>>,
    Path((field, indicator)): Path<(String, String)>,
    Query(params): Query<IndicatorQuery>,
) -> Result<Json<IndicatorResponse>, ApiError> {
    let indicator = indicator.parse::<Indicator>()?;
    ensure_field(&state.dataset, &field)?;

    if params.period == Some(0) {
        return Err(ApiError::InvalidParameter(
            "Period must be greater than 0".to_string(),
        ));
    }
    if let Some(tolerance) = params.tolerance {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(ApiError::InvalidParameter(
                "Tolerance must be a positive number".to_string(),
            ));
        }
    }

    let records = select_records(
        &state.dataset,
        params.range.as_deref(),
        params.start.as_deref(),
        params.end.as_deref(),
    )?;
    let data = record::series(records, &field);
    let output = indicator.compute(
        &data,
        &IndicatorParams {
            period: params.period,
            multiplier: params.multiplier,
            tolerance: params.tolerance,
        },
    );

    tracing::debug!(
        field = %field,
        indicator = %indicator,
        points = output.len(),
        "Computed indicator"
    );

    Ok(Json(IndicatorResponse {
        field,
        indicator,
        output,
    }))
}

// Overview panels

/// Query parameters for the correlation endpoint
#[derive(Debug, Default, Deserialize)]
pub struct CorrelationQuery {
    /// Comma-separated columns; defaults to the headline markets
    pub markets: Option<String>,
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    #[serde(flatten)]
    pub matrix: CorrelationMatrix,
    pub cells: Vec<CorrelationCell>,
}

/// GET /correlation - Pairwise correlation matrix
pub async fn correlation_matrix(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CorrelationQuery>,
) -> Result<Json<CorrelationResponse>, ApiError> {
    let markets = field_list(params.markets.as_deref(), &DEFAULT_MARKETS);
    if markets.len() < 2 {
        return Err(ApiError::InvalidParameter(
            "At least two markets are required".to_string(),
        ));
    }
    for market in &markets {
        ensure_field(&state.dataset, market)?;
    }

    let records = select_records(
        &state.dataset,
        params.range.as_deref(),
        params.start.as_deref(),
        params.end.as_deref(),
    )?;
    let matrix = CorrelationMatrix::compute(records, &markets);

    Ok(Json(CorrelationResponse {
        cells: matrix.cells(),
        matrix,
    }))
}

/// Query parameters for the heat map endpoint
#[derive(Debug, Default, Deserialize)]
pub struct HeatMapQuery {
    /// Comma-separated spread columns; defaults to the dashboard spreads
    pub spreads: Option<String>,
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// GET /heatmap - Moves between the two most recent records of the range
pub async fn spread_heat_map(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeatMapQuery>,
) -> Result<Json<Vec<HeatMapCell>>, ApiError> {
    let records = select_records(
        &state.dataset,
        params.range.as_deref(),
        params.start.as_deref(),
        params.end.as_deref(),
    )?;
    let spreads = field_list(params.spreads.as_deref(), &DEFAULT_SPREADS);
    Ok(Json(overview::spread_heat_map(records, &spreads)))
}

/// GET /volatility - Range panel for the latest record
pub async fn volatility_panel(State(state): State<Arc<AppState>>) -> Json<VolatilityPanel> {
    Json(overview::volatility_panel(state.dataset.records()))
}

// Settings

/// GET /settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<UserSettings> {
    let store = state.store.lock().await;
    Json(settings::load_settings(&**store))
}

/// PUT /settings - Apply a partial update
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<UserSettings>, ApiError> {
    let mut store = state.store.lock().await;
    let updated = settings::update_settings(&mut **store, &patch)?;
    Ok(Json(updated))
}

/// POST /settings/reset
pub async fn reset_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserSettings>, ApiError> {
    let mut store = state.store.lock().await;
    Ok(Json(settings::reset_settings(&mut **store)?))
}

// Layout

/// GET /layout
pub async fn get_layout(State(state): State<Arc<AppState>>) -> Json<LayoutConfig> {
    let store = state.store.lock().await;
    Json(layout::load_layout(&**store))
}

/// POST /layout/reset
pub async fn reset_layout(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LayoutConfig>, ApiError> {
    let mut store = state.store.lock().await;
    Ok(Json(layout::reset_layout(&mut **store)?))
}

/// Request body for moving a section
#[derive(Debug, Deserialize)]
pub struct MoveSectionRequest {
    pub from: usize,
    pub to: usize,
}

/// POST /layout/:view/move - Reorder a section within a view
pub async fn move_section(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
    Json(request): Json<MoveSectionRequest>,
) -> Result<Json<Vec<SectionConfig>>, ApiError> {
    let view = view.parse::<View>()?;
    let mut store = state.store.lock().await;

    let mut config = layout::load_layout(&**store);
    config.update_section_order(view, request.from, request.to)?;
    layout::save_layout(&mut **store, &config)?;

    tracing::info!(%view, from = request.from, to = request.to, "Moved section");

    Ok(Json(config.sections(view).to_vec()))
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub view: View,
    pub section: String,
    pub enabled: bool,
}

/// POST /layout/:view/toggle/:section - Show or hide a section
pub async fn toggle_section(
    State(state): State<Arc<AppState>>,
    Path((view, section)): Path<(String, String)>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let view = view.parse::<View>()?;
    let mut store = state.store.lock().await;

    let mut config = layout::load_layout(&**store);
    let enabled = config.toggle_section(view, &section)?;
    layout::save_layout(&mut **store, &config)?;

    Ok(Json(ToggleResponse {
        view,
        section,
        enabled,
    }))
}

/// GET /layout/:view/active - Enabled sections in display order
pub async fn active_sections(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
) -> Result<Json<Vec<SectionConfig>>, ApiError> {
    let view = view.parse::<View>()?;
    let store = state.store.lock().await;
    Ok(Json(layout::load_layout(&**store).active_sections(view)))
}

// Comments

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub section_id: String,
    pub count: usize,
}

/// GET /comments - Sections that have comments
pub async fn list_commented_sections(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<SectionSummary>> {
    let store = state.store.lock().await;
    let summaries = comments::sections_with_comments(&**store)
        .into_iter()
        .map(|section_id| SectionSummary {
            count: comments::comment_count(&**store, &section_id),
            section_id,
        })
        .collect();
    Json(summaries)
}

/// A comment with its relative display time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub display_time: String,
}

/// GET /comments/:section - Comments of one section, oldest first
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Json<Vec<CommentView>> {
    let now = Utc::now();
    let store = state.store.lock().await;
    let views = comments::section_comments(&**store, &section)
        .into_iter()
        .map(|comment| CommentView {
            display_time: comments::format_timestamp(comment.timestamp, now),
            comment,
        })
        .collect();
    Json(views)
}

/// Request body for a new comment
#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub author: Option<String>,
    pub content: String,
}

fn non_empty(content: &str) -> Result<&str, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(ApiError::InvalidParameter(
            "Comment content must not be empty".to_string(),
        ))
    } else {
        Ok(trimmed)
    }
}

/// POST /comments/:section - Add a comment
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
    Json(request): Json<NewCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let content = non_empty(&request.content)?;
    let author = request
        .author
        .as_deref()
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .unwrap_or(DEFAULT_AUTHOR);

    let mut store = state.store.lock().await;
    let comment = comments::add_comment(&mut **store, &section, author, content, Utc::now())?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Request body for editing a comment
#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
}

/// PUT /comment/:id - Replace a comment's content
pub async fn edit_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<EditCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let content = non_empty(&request.content)?;
    let mut store = state.store.lock().await;
    comments::edit_comment(&mut **store, &id, content, Utc::now())?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Comment '{}' not found", id)))
}

/// DELETE /comment/:id
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.lock().await;
    if comments::delete_comment(&mut **store, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Comment '{}' not found", id)))
    }
}
