mod handler;
mod protocol;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::GatewayConfig, core::connection::Database, error::AppResult};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub db: Database,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let db = Database::new(config.db_path.clone(), config.busy_timeout);
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

/// Routes are mounted at the root and again under `/api`, with and without
/// the trailing slash.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/execute", post(handler::api_execute))
        .route("/execute/", post(handler::api_execute))
        .route("/tables", get(handler::api_tables))
        .route("/tables/", get(handler::api_tables))
        .route("/table/{table_name}", get(handler::api_table_detail))
        .route("/table/{table_name}/", get(handler::api_table_detail));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: GatewayConfig) -> AppResult<()> {
    let listener = TcpListener::bind(&config.listen).await?;
    let state = AppState::new(config);
    tracing::info!(
        listen = %state.config.listen,
        db_path = %state.db.path().display(),
        allow_non_select = state.config.allow_non_select,
        query_row_limit = state.config.query_row_limit,
        "sqlrunner ready"
    );

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("sqlrunner stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: AppState,
    }

    impl Fixture {
        fn new(allow_non_select: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = GatewayConfig {
                db_path: dir.path().join("gateway.db"),
                allow_non_select,
                ..GatewayConfig::default()
            };
            let state = AppState::new(config);
            state
                .db
                .open()
                .unwrap()
                .execute_batch(
                    "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);
                     INSERT INTO users (name) VALUES ('ada'), ('grace'), ('linus');",
                )
                .unwrap();
            Self { _dir: dir, state }
        }

        /// Points at a file inside a directory that does not exist, so every
        /// connection attempt fails.
        fn unopenable() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = GatewayConfig {
                db_path: dir.path().join("missing").join("gateway.db"),
                ..GatewayConfig::default()
            };
            Self {
                _dir: dir,
                state: AppState::new(config),
            }
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = build_router(self.state.clone()).oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }

        async fn execute(&self, body: Value) -> (StatusCode, Value) {
            self.send(post_json("/execute/", &body.to_string())).await
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn execute_select_returns_columns_and_rows() {
        let fx = Fixture::new(false);
        let (status, body) = fx.execute(json!({ "query": "SELECT 1 AS x" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "columns": ["x"], "rows": [{ "x": 1 }] }));
    }

    #[tokio::test]
    async fn execute_without_query_is_bad_request() {
        let fx = Fixture::new(true);
        for body in [json!({}), json!({ "query": "" }), json!({ "query": null })] {
            let (status, resp) = fx.execute(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp["error"], json!("Missing \"query\" in request body."));
            assert_eq!(resp["code"], json!("INVALID_REQUEST"));
        }

        let (status, _) = fx.send(post_json("/execute/", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = fx.send(post_json("/execute/", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn writes_are_forbidden_by_default() {
        let fx = Fixture::new(false);
        let (status, body) = fx
            .execute(json!({ "query": "DELETE FROM users" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], json!("Only SELECT queries are allowed by default."));

        let (_, body) = fx.execute(json!({ "query": "SELECT count(*) AS n FROM users" })).await;
        assert_eq!(body["rows"][0]["n"], json!(3));
    }

    #[tokio::test]
    async fn allowed_writes_persist_and_report_changes() {
        let fx = Fixture::new(true);
        let (status, body) = fx
            .execute(json!({ "query": "INSERT INTO users (name) VALUES ('barbara')" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Query executed successfully"));
        assert_eq!(body["rows_affected"], json!(1));
        assert_eq!(body["last_insert_rowid"], json!(4));

        let (_, body) = fx
            .execute(json!({ "query": "select name from users where id = 4" }))
            .await;
        assert_eq!(body["rows"], json!([{ "name": "barbara" }]));
    }

    #[tokio::test]
    async fn failing_statements_are_bad_requests() {
        let fx = Fixture::new(true);
        let (status, body) = fx.execute(json!({ "query": "SELECT * FROM nowhere" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("SQL_ERROR"));
        assert!(body["error"].as_str().unwrap().contains("no such table"));

        let (status, _) = fx.execute(json!({ "query": "INSERT INTO users (name) VALUES (NULL)" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn execute_caps_unbounded_selects() {
        let fx = Fixture::new(false);
        let mut state = fx.state.clone();
        state.config = Arc::new(GatewayConfig {
            query_row_limit: 2,
            ..(*fx.state.config).clone()
        });
        let resp = build_router(state)
            .oneshot(post_json("/execute/", r#"{"query": "SELECT name FROM users;"}"#))
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tables_lists_user_tables_only() {
        let fx = Fixture::new(false);
        let (status, body) = fx.get("/tables/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "tables": ["users"] }));
    }

    #[tokio::test]
    async fn table_detail_returns_schema_and_samples() {
        let fx = Fixture::new(false);
        let (status, body) = fx.get("/table/users/?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["schema"][1],
            json!({
                "cid": 1,
                "name": "name",
                "type": "TEXT",
                "notnull": true,
                "dflt_value": null,
                "pk": false
            })
        );
        assert_eq!(body["samples"], json!([{ "id": 1, "name": "ada" }, { "id": 2, "name": "grace" }]));
    }

    #[tokio::test]
    async fn table_detail_defaults_to_configured_sample_size() {
        let fx = Fixture::new(false);
        fx.state
            .db
            .open()
            .unwrap()
            .execute_batch(
                "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 20)
                 INSERT INTO users (name) SELECT 'u' || i FROM n;",
            )
            .unwrap();
        let (status, body) = fx.get("/table/users/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["samples"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let fx = Fixture::new(false);
        for uri in ["/table/ghosts/", "/table/ghosts/?limit=0", "/table/ghosts/?limit=500"] {
            let (status, body) = fx.get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], json!("Table 'ghosts' not found"));
        }
    }

    #[tokio::test]
    async fn bad_sample_limit_is_bad_request() {
        let fx = Fixture::new(false);
        let (status, body) = fx.get("/table/users/?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_REQUEST"));
    }

    #[tokio::test]
    async fn routes_are_served_under_api_prefix_and_without_slash() {
        let fx = Fixture::new(false);
        assert_eq!(fx.get("/api/tables/").await.0, StatusCode::OK);
        assert_eq!(fx.get("/tables").await.0, StatusCode::OK);
        assert_eq!(fx.get("/api/table/users").await.0, StatusCode::OK);
        let (status, _) = fx
            .send(post_json("/api/execute/", r#"{"query": "select 1"}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn multi_statement_payloads_are_rejected() {
        let fx = Fixture::new(true);
        for query in [
            "INSERT INTO users (name) VALUES ('eve'); DROP TABLE users",
            "select 1; drop table users",
        ] {
            let (status, body) = fx.execute(json!({ "query": query })).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
            assert_eq!(body["error"], json!("You can only execute one statement at a time."));
            assert_eq!(body["code"], json!("SQL_ERROR"));
        }

        let (_, body) = fx.get("/tables/").await;
        assert_eq!(body, json!({ "tables": ["users"] }));
        let (_, body) = fx.execute(json!({ "query": "SELECT count(*) AS n FROM users" })).await;
        assert_eq!(body["rows"][0]["n"], json!(3));
    }

    #[tokio::test]
    async fn sample_limit_is_not_capped_by_query_row_limit() {
        let fx = Fixture::new(false);
        let mut state = fx.state.clone();
        state.config = Arc::new(GatewayConfig {
            query_row_limit: 2,
            ..(*fx.state.config).clone()
        });
        let resp = build_router(state)
            .oneshot(Request::get("/table/users/?limit=3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["samples"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_query_string_gets_a_json_error() {
        let fx = Fixture::new(false);
        let (status, body) = fx.get("/table/users/?limit=1&limit=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_REQUEST"));
        assert!(body["error"].as_str().unwrap().contains("limit"), "{body}");
    }

    #[tokio::test]
    async fn catalog_endpoints_report_engine_failures_as_server_errors() {
        let fx = Fixture::unopenable();
        for uri in ["/tables/", "/table/users/", "/table/users/?limit=1"] {
            let (status, body) = fx.get(uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["code"], json!("DB_OPEN_FAILED"), "{uri}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn execute_reports_open_failures_as_bad_requests() {
        let fx = Fixture::unopenable();
        let (status, body) = fx.execute(json!({ "query": "SELECT 1" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("DB_OPEN_FAILED"));
    }
}
