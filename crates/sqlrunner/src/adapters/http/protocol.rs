use serde::{Deserialize, Serialize};

// Requests

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableDetailParams {
    #[serde(default)]
    pub limit: Option<String>,
}

// Responses

#[derive(Debug, Serialize)]
pub struct ExecuteMessageResponse {
    pub message: &'static str,
    pub rows_affected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_rowid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

pub const EXECUTE_SUCCESS: &str = "Query executed successfully";
pub const MISSING_QUERY: &str = "Missing \"query\" in request body.";
