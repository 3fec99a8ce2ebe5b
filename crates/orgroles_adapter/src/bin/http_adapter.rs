#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use orgroles_adapter::{
    AdapterConfig, AdapterRuntime, ApiError, CreateMinistryGroupBody, CreatePositionBody,
    FullConfigResponse, GradeBucketView, HealthResponse, MinistryViewResponse, MoveBody,
    OperationResponse, PositionTasksResponse, PositionView, TaskCategoryView, TemplateBody,
    TemplateView, UpdatePositionBody,
};
use orgroles_engines::modules::RoleModuleDefinition;
use tracing::info;
use tracing_subscriber::EnvFilter;

type AppState = State<Arc<AdapterRuntime>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AdapterConfig::from_env()?;
    let runtime = Arc::new(AdapterRuntime::default());
    let bootstrapped = runtime.bootstrap(&config.bootstrap)?;

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/templates", get(list_templates))
        .route("/v1/modules", get(list_modules))
        .route("/v1/tasks", get(list_tasks))
        .route("/v1/positions", get(list_all_positions))
        .route("/v1/orgs/:org_id/config", get(full_config))
        .route("/v1/orgs/:org_id/views/grade", get(grade_view))
        .route("/v1/orgs/:org_id/views/ministry", get(ministry_view))
        .route("/v1/orgs/:org_id/initialize", post(initialize))
        .route("/v1/orgs/:org_id/reset", post(reset))
        .route("/v1/orgs/:org_id/positions", post(create_position))
        .route(
            "/v1/orgs/:org_id/positions/:position_id",
            axum::routing::patch(update_position).delete(delete_position),
        )
        .route(
            "/v1/orgs/:org_id/positions/:position_id/move",
            post(move_position_level),
        )
        .route(
            "/v1/orgs/:org_id/positions/:position_id/tasks",
            get(position_tasks),
        )
        .route("/v1/orgs/:org_id/ministry-groups", post(create_ministry_group))
        .route(
            "/v1/orgs/:org_id/ministry-groups/:group_id",
            axum::routing::delete(delete_ministry_group),
        )
        .with_state(runtime);

    info!(addr = %config.bind, bootstrapped, "orgroles_adapter_http listening");
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

async fn healthz(State(runtime): AppState) -> ApiResult<HealthResponse> {
    runtime.health().map(Json)
}

async fn list_templates(State(runtime): AppState) -> Json<Vec<TemplateView>> {
    Json(runtime.list_templates())
}

async fn list_modules(State(runtime): AppState) -> Json<Vec<RoleModuleDefinition>> {
    Json(runtime.list_role_modules())
}

async fn list_tasks(State(runtime): AppState) -> Json<Vec<TaskCategoryView>> {
    Json(runtime.list_tasks())
}

async fn list_all_positions(State(runtime): AppState) -> ApiResult<Vec<PositionView>> {
    runtime.list_all_positions().map(Json)
}

async fn full_config(
    State(runtime): AppState,
    Path(org_id): Path<String>,
) -> ApiResult<FullConfigResponse> {
    runtime.full_config(&org_id).map(Json)
}

async fn grade_view(
    State(runtime): AppState,
    Path(org_id): Path<String>,
) -> ApiResult<Vec<GradeBucketView>> {
    runtime.grade_view(&org_id).map(Json)
}

async fn ministry_view(
    State(runtime): AppState,
    Path(org_id): Path<String>,
) -> ApiResult<MinistryViewResponse> {
    runtime.ministry_view(&org_id).map(Json)
}

async fn initialize(
    State(runtime): AppState,
    Path(org_id): Path<String>,
    body: Result<Json<TemplateBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    runtime.initialize(&org_id, body).map(Json)
}

async fn reset(
    State(runtime): AppState,
    Path(org_id): Path<String>,
    body: Result<Json<TemplateBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    runtime.reset(&org_id, body).map(Json)
}

async fn create_position(
    State(runtime): AppState,
    Path(org_id): Path<String>,
    body: Result<Json<CreatePositionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<OperationResponse>), ApiError> {
    let Json(body) = body?;
    let response = runtime.create_position(&org_id, body)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_position(
    State(runtime): AppState,
    Path((org_id, position_id)): Path<(String, String)>,
    body: Result<Json<UpdatePositionBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    runtime.update_position(&org_id, &position_id, body).map(Json)
}

async fn delete_position(
    State(runtime): AppState,
    Path((org_id, position_id)): Path<(String, String)>,
) -> ApiResult<OperationResponse> {
    runtime.delete_position(&org_id, &position_id).map(Json)
}

async fn move_position_level(
    State(runtime): AppState,
    Path((org_id, position_id)): Path<(String, String)>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(body) = body?;
    runtime
        .move_position_level(&org_id, &position_id, body)
        .map(Json)
}

async fn position_tasks(
    State(runtime): AppState,
    Path((org_id, position_id)): Path<(String, String)>,
) -> ApiResult<PositionTasksResponse> {
    runtime.position_tasks(&org_id, &position_id).map(Json)
}

async fn create_ministry_group(
    State(runtime): AppState,
    Path(org_id): Path<String>,
    body: Result<Json<CreateMinistryGroupBody>, JsonRejection>,
) -> Result<(StatusCode, Json<OperationResponse>), ApiError> {
    let Json(body) = body?;
    let response = runtime.create_ministry_group(&org_id, body)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_ministry_group(
    State(runtime): AppState,
    Path((org_id, group_id)): Path<(String, String)>,
) -> ApiResult<OperationResponse> {
    runtime.delete_ministry_group(&org_id, &group_id).map(Json)
}
