use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    core::{
        limits::effective_limit,
        query::execute_statement,
        readonly::is_read_only,
        schema,
        types::ExecuteOutcome,
    },
    error::{AppError, AppResult},
};

use super::{protocol::*, AppState};

/// `POST /execute/`
pub async fn api_execute(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_execute_request(&body) {
        Ok(request) => request,
        Err(e) => return reject(StatusCode::BAD_REQUEST, e),
    };
    let sql = match request.query {
        Some(sql) if !sql.is_empty() => sql,
        _ => {
            return reject(
                StatusCode::BAD_REQUEST,
                AppError::InvalidRequest(MISSING_QUERY.into()),
            )
        }
    };

    if !is_read_only(&sql) && !state.config.allow_non_select {
        return reject(StatusCode::FORBIDDEN, AppError::NotReadonly);
    }

    let max_rows = state.config.query_row_limit;
    match state.db.run(move |conn| execute_statement(conn, &sql, max_rows)).await {
        Ok(ExecuteOutcome::Rows(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(ExecuteOutcome::Changes(exec)) => (
            StatusCode::OK,
            Json(ExecuteMessageResponse {
                message: EXECUTE_SUCCESS,
                rows_affected: exec.changes,
                last_insert_rowid: exec.last_insert_rowid,
            }),
        )
            .into_response(),
        Err(e @ AppError::Internal(_)) => reject(StatusCode::INTERNAL_SERVER_ERROR, e),
        // Execution failures surface as client errors.
        Err(e) => reject(StatusCode::BAD_REQUEST, e),
    }
}

/// `GET /tables/`
pub async fn api_tables(State(state): State<AppState>) -> Response {
    match state.db.run(|conn| schema::list_tables(conn)).await {
        Ok(tables) => (StatusCode::OK, Json(TablesResponse { tables })).into_response(),
        Err(e) => reject(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// `GET /table/{table_name}/?limit=N`
pub async fn api_table_detail(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    params: Result<Query<TableDetailParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return reject(
                StatusCode::BAD_REQUEST,
                AppError::InvalidRequest(rejection.body_text()),
            )
        }
    };
    let requested = match parse_limit(params.limit.as_deref()) {
        Ok(requested) => requested,
        Err(e) => return reject(StatusCode::BAD_REQUEST, e),
    };
    let limits = effective_limit(requested, state.config.table_sample_limit);

    match state
        .db
        .run(move |conn| schema::table_detail(conn, &table_name, limits.max_rows))
        .await
    {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e @ AppError::TableNotFound(_)) => reject(StatusCode::NOT_FOUND, e),
        Err(e) => reject(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

fn parse_execute_request(body: &[u8]) -> AppResult<ExecuteRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ExecuteRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("invalid request json: {e}")))
}

fn parse_limit(raw: Option<&str>) -> AppResult<Option<usize>> {
    raw.map(|s| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| AppError::InvalidRequest(format!("invalid limit: {s:?}")))
    })
    .transpose()
}

fn reject(status: StatusCode, e: AppError) -> Response {
    if status.is_server_error() {
        tracing::error!(error = %e, code = e.code(), %status, "request failed");
    } else {
        tracing::warn!(error = %e, code = e.code(), %status, "request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            code: e.code(),
        }),
    )
        .into_response()
}
