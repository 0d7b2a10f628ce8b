//! Batch execution of connector operations over HTTP.

use axum::{extract::State, Json};
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::ExecutionItem;
use crate::operations::{self, Operation, Parameters};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub resource: String,
    pub operation: String,
    #[serde(default)]
    pub items: Vec<Parameters>,
    #[serde(default)]
    pub continue_on_fail: bool,
}

/// `POST /operations`
///
/// Names are parsed before any item runs. An empty `items` list runs the
/// operation once with no parameters.
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Vec<ExecutionItem>>, AppError> {
    state.notice.emit();

    let operation = Operation::parse(&request.resource, &request.operation)?;

    let items = if request.items.is_empty() {
        vec![Parameters::default()]
    } else {
        request.items
    };

    tracing::info!(
        resource = %request.resource,
        operation = %request.operation,
        items = items.len(),
        continue_on_fail = request.continue_on_fail,
        "Executing operation"
    );

    let output =
        operations::execute_batch(&state.client, operation, &items, request.continue_on_fail)
            .await?;

    Ok(Json(output))
}
