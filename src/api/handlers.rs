use super::errors::ApiError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::constants::{DATASET_FORMAT, LOAD_DATASET_TASK, TRAIN_TASK};
use crate::core::{Arguments, TaskChainer, TaskFailure, TaskStatus};
use crate::errors::{AuthError, ResultError};
use crate::models::{Dataset, Token, Trainer, User};
use axum::extract::{Extension, Form, Path};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// General information about the running service
#[derive(Serialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub tasks: Vec<String>,
}

/// OAuth2 password grant form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
}

/// Request payload for training a forecaster
#[derive(Deserialize)]
pub struct TrainRequest {
    pub trainer: Trainer,
    pub dataset: Dataset,
    #[serde(default)]
    pub partitions: Option<Vec<Arguments>>,
}

/// Response payload after a training chain was queued
#[derive(Serialize, Deserialize)]
pub struct TrainResponse {
    pub async_task_id: String,
}

/// State of a queued chain
#[derive(Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub async_task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

fn kwargs(value: Value) -> Arguments {
    match value {
        Value::Object(map) => map,
        _ => Arguments::new(),
    }
}

pub async fn info(Extension(state): Extension<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tasks: state.registry.names().into_iter().map(String::from).collect(),
    })
}

/// Exchanges a username and password for an access token
pub async fn login(
    Extension(state): Extension<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Token>, ApiError> {
    if let Some(grant_type) = &form.grant_type {
        if grant_type != "password" {
            return Err(AuthError::InvalidCredentials.into());
        }
    }
    let user = state
        .tokens
        .credentials()
        .authenticate(&form.username, &form.password)
        .ok_or(AuthError::InvalidCredentials)?;

    info!("User {} logged in", user.username);
    Ok(Json(state.tokens.generate_token(&user.username)?))
}

pub async fn read_users_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Queues the dataset loading and training chain.
///
/// By "forecaster" it is meant any time series estimator.
#[axum::debug_handler]
pub async fn train(
    CurrentUser(user): CurrentUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    let load_dataset_kwargs = kwargs(json!({
        "dataset": payload.dataset,
        "user": user,
        "partitions": payload.partitions,
        "format": DATASET_FORMAT,
        "return_schema": true,
        "enforce_schema_dtypes": true,
    }));

    let load_dataset_task = state.registry.get_task(LOAD_DATASET_TASK)?;
    let train_task = state.registry.get_task(TRAIN_TASK)?;

    let mut chainer = TaskChainer::new();
    chainer.add_task(load_dataset_task, load_dataset_kwargs)?;
    chainer.add_task(train_task, kwargs(json!({ "trainer": payload.trainer })))?;
    let chain = chainer.make_chain()?;

    let async_task = chain.submit(&state.broker).await?;
    info!(
        "User {} queued training chain {}",
        user.username,
        async_task.id()
    );
    Ok(Json(TrainResponse {
        async_task_id: async_task.id().to_string(),
    }))
}

/// Reports the state of a queued chain and its outcome once finished
pub async fn get_task_status(
    _user: CurrentUser,
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let handle = state.broker.handle(&id).await?;

    let (status, result, error) = match handle.result().await {
        Ok(result) => (TaskStatus::Success, Some(result), None),
        Err(ResultError::TaskFailed(failure)) => (TaskStatus::Failure, None, Some(failure)),
        Err(ResultError::NotReady(status)) => (status, None, None),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(TaskStatusResponse {
        async_task_id: id,
        status,
        result,
        error,
    }))
}
