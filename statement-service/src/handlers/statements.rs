use crate::dtos::{StatementParams, StatementRequest, StatementResponse};
use crate::models::Statement;
use crate::startup::AppState;
use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

/// GET /api/statements?id=<id>[&$expand=transactions]
pub async fn get_statement(
    State(state): State<AppState>,
    Query(params): Query<StatementParams>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow!("missing id parameter")))?;

    let mut statement = state
        .repository
        .get_statement(id)
        .await
        .map_err(|e| {
            tracing::error!(id, error = %e, "Failed to retrieve statement");
            e
        })?
        .ok_or_else(|| AppError::NotFound(anyhow!("statement not found: {id}")))?;

    if expand_transactions(params.expand.as_deref()) {
        let transactions = state.repository.get_transactions(id).await.map_err(|e| {
            tracing::error!(statement_id = id, error = %e, "Failed to retrieve transactions for statement");
            e
        })?;
        // the reconciled collection wins over the ingested snapshot
        statement.transactions = Some(transactions);
    }

    Ok(Json(StatementResponse::from(statement)))
}

/// POST /api/statements[?$expand=transactions]
pub async fn create_statement(
    State(state): State<AppState>,
    Query(params): Query<StatementParams>,
    payload: Result<Json<StatementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(anyhow!("invalid request payload: {e}")))?;

    // checked against the payload: normalization below synthesizes a
    // transaction for statements that arrived without any
    let payload_had_transactions = request.transactions.is_some();

    let mut statement = Statement::from(request);
    state
        .service
        .save_statement(&mut statement)
        .await
        .map_err(|e| {
            tracing::error!(id = %statement.id, error = %e, "Failed to save statement");
            e
        })?;

    if expand_transactions(params.expand.as_deref()) {
        if !payload_had_transactions {
            return Err(AppError::BadRequest(anyhow!(
                "transactions must be supplied when $expand=transactions is requested"
            )));
        }

        let incoming = statement.transactions.take().unwrap_or_default();
        let tx_count = incoming.len();
        state
            .service
            .sync_transactions(&statement.id, incoming)
            .await
            .map_err(|e| {
                tracing::error!(
                    statement_id = %statement.id,
                    tx_count,
                    error = %e,
                    "Failed to sync transactions"
                );
                e
            })?;
    }

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!("/api/statements?id={}", statement.id),
        )],
    ))
}

/// `$expand` is a comma-separated, case-insensitive list.
fn expand_transactions(expand: Option<&str>) -> bool {
    expand
        .map(|value| {
            value
                .split(',')
                .any(|part| part.trim().eq_ignore_ascii_case("transactions"))
        })
        .unwrap_or(false)
}
