use nse_tick_etl::api_server_axum::{build_router, AppState};
use nse_tick_etl::{PipelineConfig, QueryAgent};

use anyhow::Result;
use std::path::PathBuf;

/// Echoes what it was asked instead of calling a model
struct StubAgent;

impl QueryAgent for StubAgent {
    async fn answer(&self, sources: &[PathBuf], question: &str) -> Result<String> {
        Ok(format!("{} source(s): {}", sources.len(), question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use tower::ServiceExt;

    fn config_for(root: &Path) -> PipelineConfig {
        PipelineConfig {
            oi_data_dir: root.join("oi"),
            ltp_data_dir: root.join("ltp"),
            mapping_file: root.join("mapping.csv"),
            output_dir: root.join("Output"),
            ..PipelineConfig::default()
        }
    }

    async fn call(config: PipelineConfig, request: Request<Body>) -> Value {
        let app = build_router(AppState::new(config, StubAgent));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_config() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder().uri("/api/config").body(Body::empty()).unwrap();

        let body = call(config_for(dir.path()), request).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["bucket_minutes"], 5);
        assert_eq!(body["data"]["symbol_suffix"], "-EQ");
    }

    #[tokio::test]
    async fn test_run_oi_returns_summary() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("mapping.csv"), "symbol,token\nRELIANCE-EQ,2885\n").unwrap();
        let stock = root.join("oi").join("2024-11-29").join("RELIANCE");
        fs::create_dir_all(&stock).unwrap();
        fs::write(
            stock.join("2024-11-29T09%3A15%3A04.633.csv"),
            "symbol,openInterest,buildUp,ltp\nRELIANCE29NOV241300CE,1200,Long Buildup,12.5\n",
        )
        .unwrap();

        let body = call(config_for(root), post_json("/api/run/oi", json!({}))).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["pipeline"], "oi");
        assert_eq!(body["data"]["rows_out"], 1);
        assert!(root.join("Output").join("All_stock_open_interest_data.csv").is_file());
    }

    #[tokio::test]
    async fn test_run_ltp_failure_envelope() {
        let dir = tempfile::tempdir().unwrap();

        // No mapping file: fatal for the run, reported in the envelope
        let body = call(config_for(dir.path()), post_json("/api/run/ltp", json!({}))).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Mapping error"));
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_query_with_explicit_sources() {
        let dir = tempfile::tempdir().unwrap();
        let request = post_json(
            "/api/query",
            json!({"question": " Highest OI strike? ", "sources": ["a.csv", "b.csv"]}),
        );

        let body = call(config_for(dir.path()), request).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["answer"], "2 source(s): Highest OI strike?");
        assert_eq!(body["data"]["sources"], json!(["a.csv", "b.csv"]));
    }

    #[tokio::test]
    async fn test_query_defaults_to_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let body = call(config.clone(), post_json("/api/query", json!({"question": "Any data?"}))).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("No output tables"));

        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.oi_output_path(), "Token\n").unwrap();
        let body = call(config, post_json("/api/query", json!({"question": "Any data?"}))).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["answer"], "1 source(s): Any data?");
    }

    #[tokio::test]
    async fn test_query_rejects_empty_question() {
        let dir = tempfile::tempdir().unwrap();
        let body = call(config_for(dir.path()), post_json("/api/query", json!({"question": "   "}))).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Question must not be empty");
    }
}
