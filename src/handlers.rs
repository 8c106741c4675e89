use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use futures::future::join_all;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    AppState,
    cards::{TypeOption, WeekSchedule},
    error::ApiError,
    explorer::{Explorer, ExplorerHandle, settle},
    filters::{FilterField, Filters},
    models::{TrainingMeta, TrainingType},
    store::WeekDataStore,
    validation::{parse_week, validate_weeks},
    view::ScheduleView,
    week::WeekWindow,
};

#[derive(Debug, serde::Deserialize)]
pub struct IcalQuery {
    #[serde(default = "default_weeks")]
    pub weeks: u8,
}

fn default_weeks() -> u8 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExplorerResponse {
    pub id: u64,
    pub schedule: WeekSchedule,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetaResponse {
    #[serde(flatten)]
    pub meta: TrainingMeta,
    pub types: Vec<TypeOption>,
}

#[utoipa::path(get, path = "/", tag = "schedule")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Gabi Schedule API",
        "endpoints": {
            "/meta": "Filter vocabulary",
            "/explorers": "Create a weekly schedule explorer",
            "/explorers/{id}": "Current week of an explorer",
            "/schedule.ical": "Download upcoming weeks as iCal file"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "schedule")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "schedule")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/meta",
    responses((status = 200, description = "Filter vocabulary", body = MetaResponse)),
    tag = "schedule"
)]
pub async fn get_meta(State(state): State<AppState>) -> Json<MetaResponse> {
    let meta = state.client.fetch_meta().await;
    let types = [
        TrainingType::Group,
        TrainingType::MiniGroup,
        TrainingType::Open,
        TrainingType::Personal,
    ]
    .into_iter()
    .map(|kind| TypeOption {
        value: kind,
        label: kind.label(),
    })
    .collect();
    Json(MetaResponse { meta, types })
}

async fn lookup(state: &AppState, id: u64) -> Result<ExplorerHandle, ApiError> {
    state
        .explorers
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Explorer {id} not found")))
}

/// Applies `step`, runs the fetches it asks for and renders the result.
async fn advance(
    state: &AppState,
    id: u64,
    handle: ExplorerHandle,
    step: impl FnOnce(&mut Explorer) -> Option<WeekWindow>,
) -> ExplorerResponse {
    let first = step(&mut *handle.lock().await);
    settle(&handle, &state.client, first).await;
    let schedule = handle.lock().await.schedule();
    ExplorerResponse { id, schedule }
}

#[utoipa::path(
    post,
    path = "/explorers",
    params(
        ("week" = Option<String>, Query, description = "Any day of the week to open (YYYY-MM-DD); current week when absent"),
        ("type" = Option<String>, Query, description = "Format: group, mini_group, open, personal"),
        ("direction" = Option<u64>, Query, description = "Direction id"),
        ("coach" = Option<u64>, Query, description = "Coach id"),
        ("location" = Option<u64>, Query, description = "Location id"),
        ("level" = Option<String>, Query, description = "Level tag")
    ),
    responses(
        (status = 201, description = "Explorer created", body = ExplorerResponse),
        (status = 400, description = "Invalid week or filter value")
    ),
    tag = "schedule"
)]
pub async fn create_explorer(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let week = params
        .iter()
        .find(|(key, _)| key == "week")
        .map(|(_, value)| parse_week(value))
        .transpose()?;
    let mut filters = Filters::default();
    filters.apply_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    let mut view = match week {
        Some(window) => {
            let mut view = ScheduleView::new(window.start());
            view.disable_auto_adjust();
            view
        }
        None => ScheduleView::starting_this_week(state.settings.timezone),
    };
    view.set_filters(filters);

    let seed = state.client.fetch_upcoming().await;
    let (id, handle) = state.explorers.insert(Explorer::new(view, seed)).await;
    let response = advance(&state, id, handle, Explorer::refresh).await;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/explorers/{id}",
    params(("id" = u64, Path, description = "Explorer id")),
    responses(
        (status = 200, description = "Current week", body = ExplorerResponse),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn get_explorer(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let handle = lookup(&state, id).await?;
    Ok(Json(advance(&state, id, handle, Explorer::refresh).await))
}

#[utoipa::path(
    post,
    path = "/explorers/{id}/next",
    params(("id" = u64, Path, description = "Explorer id")),
    responses(
        (status = 200, description = "Following week", body = ExplorerResponse),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn next_week(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let handle = lookup(&state, id).await?;
    Ok(Json(
        advance(&state, id, handle, Explorer::go_to_next_week).await,
    ))
}

#[utoipa::path(
    post,
    path = "/explorers/{id}/previous",
    params(("id" = u64, Path, description = "Explorer id")),
    responses(
        (status = 200, description = "Preceding week", body = ExplorerResponse),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn previous_week(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let handle = lookup(&state, id).await?;
    Ok(Json(
        advance(&state, id, handle, Explorer::go_to_previous_week).await,
    ))
}

#[derive(Debug, serde::Deserialize)]
pub struct WeekQuery {
    pub date: String,
}

#[utoipa::path(
    post,
    path = "/explorers/{id}/week",
    params(
        ("id" = u64, Path, description = "Explorer id"),
        ("date" = String, Query, description = "Any day of the wanted week (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Requested week", body = ExplorerResponse),
        (status = 400, description = "Invalid date"),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn go_to_week(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let window = parse_week(&query.date)?;
    let handle = lookup(&state, id).await?;
    Ok(Json(
        advance(&state, id, handle, |explorer| {
            explorer.go_to_week(window.start())
        })
        .await,
    ))
}

#[utoipa::path(
    post,
    path = "/explorers/{id}/filters",
    params(
        ("id" = u64, Path, description = "Explorer id"),
        ("type" = Option<String>, Query, description = "Format, empty to clear"),
        ("direction" = Option<String>, Query, description = "Direction id, empty to clear"),
        ("coach" = Option<String>, Query, description = "Coach id, empty to clear"),
        ("location" = Option<String>, Query, description = "Location id, empty to clear"),
        ("level" = Option<String>, Query, description = "Level tag, empty to clear")
    ),
    responses(
        (status = 200, description = "Filtered week", body = ExplorerResponse),
        (status = 400, description = "Unknown filter or invalid value"),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn update_filters(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let handle = lookup(&state, id).await?;
    let mut explorer = handle.lock().await;

    let mut filters = explorer.view().filters().clone();
    for (key, value) in &params {
        filters.set(key.parse::<FilterField>()?, value)?;
    }
    explorer.set_filters(filters);

    Ok(Json(ExplorerResponse {
        id,
        schedule: explorer.schedule(),
    }))
}

#[utoipa::path(
    delete,
    path = "/explorers/{id}/filters",
    params(("id" = u64, Path, description = "Explorer id")),
    responses(
        (status = 200, description = "Unfiltered week", body = ExplorerResponse),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn reset_filters(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExplorerResponse>, ApiError> {
    let handle = lookup(&state, id).await?;
    let mut explorer = handle.lock().await;
    explorer.reset_filters();
    Ok(Json(ExplorerResponse {
        id,
        schedule: explorer.schedule(),
    }))
}

#[utoipa::path(
    delete,
    path = "/explorers/{id}",
    params(("id" = u64, Path, description = "Explorer id")),
    responses(
        (status = 204, description = "Explorer closed"),
        (status = 404, description = "Unknown explorer")
    ),
    tag = "schedule"
)]
pub async fn delete_explorer(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.explorers.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Explorer {id} not found")))
    }
}

#[utoipa::path(
    get,
    path = "/schedule.ical",
    params(("weeks" = u8, Query, description = "Number of weeks from the current one (1-6)")),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 400, description = "Invalid weeks value"),
        (status = 404, description = "No sessions found")
    ),
    tag = "schedule"
)]
pub async fn get_ical(
    State(state): State<AppState>,
    Query(query): Query<IcalQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let weeks = validate_weeks(query.weeks)?;

    let current = WeekWindow::current(state.settings.timezone);
    let fetches = (0..weeks).map(|offset| state.client.fetch_week(current.shifted(offset.into())));
    let week_results = join_all(fetches).await;

    let store = WeekDataStore::with_sessions(week_results.into_iter().flatten());
    if store.is_empty() {
        return Err(ApiError::NotFound("No sessions found".into()));
    }

    let body = state.exporter.generate(store.iter());
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            ("content-disposition", "attachment; filename=gabi_schedule.ics"),
        ],
        body,
    ))
}
