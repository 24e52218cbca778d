use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::agent::QueryAgent;
use crate::commands::existing_outputs;
use crate::config::PipelineConfig;
use crate::error::EtlError;
use crate::ltp::run_ltp_pipeline;
use crate::oi::run_oi_pipeline;
use crate::summary::RunSummary;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Defaults to the pipeline outputs present on disk
    pub sources: Option<Vec<PathBuf>>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub sources: Vec<PathBuf>,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn failed(error: impl ToString, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

pub struct AppState<A> {
    config: Arc<PipelineConfig>,
    agent: Arc<A>,
}

// Manual impl: A itself need not be Clone
impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            agent: Arc::clone(&self.agent),
        }
    }
}

impl<A: QueryAgent> AppState<A> {
    pub fn new(config: PipelineConfig, agent: A) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(agent),
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// POST /api/run/oi - Run the open interest pipeline
async fn run_oi<A: QueryAgent + 'static>(State(app_state): State<AppState<A>>) -> Json<ApiResponse<RunSummary>> {
    let start_time = Instant::now();
    let config = Arc::clone(&app_state.config);
    let result = tokio::task::spawn_blocking(move || run_oi_pipeline(&config).map(|run| run.summary)).await;
    Json(pipeline_response("oi", result, start_time))
}

/// POST /api/run/ltp - Run the LTP OHLC pipeline
async fn run_ltp<A: QueryAgent + 'static>(State(app_state): State<AppState<A>>) -> Json<ApiResponse<RunSummary>> {
    let start_time = Instant::now();
    let config = Arc::clone(&app_state.config);
    let result =
        tokio::task::spawn_blocking(move || run_ltp_pipeline(&config).map(|run| run.summary().clone())).await;
    Json(pipeline_response("ltp", result, start_time))
}

/// POST /api/query - Ask the agent about the output tables
async fn run_query<A: QueryAgent + 'static>(
    State(app_state): State<AppState<A>>,
    Json(request): Json<QueryRequest>,
) -> Json<ApiResponse<QueryResponse>> {
    let start_time = Instant::now();
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Json(ApiResponse::failed("Question must not be empty", start_time));
    }

    let sources = match request.sources {
        Some(sources) if !sources.is_empty() => sources,
        _ => match existing_outputs(&app_state.config) {
            Ok(sources) => sources,
            Err(e) => return Json(ApiResponse::failed(e, start_time)),
        },
    };

    match app_state.agent.answer(&sources, &question).await {
        Ok(answer) => Json(ApiResponse::ok(
            QueryResponse {
                question,
                sources,
                answer,
            },
            start_time,
        )),
        Err(e) => {
            error!("Query failed: {:#}", e);
            Json(ApiResponse::failed(format!("{:#}", e), start_time))
        }
    }
}

/// GET /api/config - Effective pipeline configuration
async fn get_config<A: QueryAgent + 'static>(State(app_state): State<AppState<A>>) -> Json<ApiResponse<PipelineConfig>> {
    let start_time = Instant::now();
    Json(ApiResponse::ok(app_state.config.as_ref().clone(), start_time))
}

// -----------------------------------------------
// HELPER FUNCTIONS
// -----------------------------------------------

fn pipeline_response(
    pipeline: &str,
    result: Result<Result<RunSummary, EtlError>, tokio::task::JoinError>,
    start_time: Instant,
) -> ApiResponse<RunSummary> {
    match result {
        Ok(Ok(summary)) => {
            info!("{} run finished: {} rows", pipeline, summary.rows_out);
            ApiResponse::ok(summary, start_time)
        }
        Ok(Err(e)) => {
            error!("{} run failed: {}", pipeline, e);
            ApiResponse::failed(e, start_time)
        }
        Err(e) => ApiResponse::failed(format!("{} run aborted: {}", pipeline, e), start_time),
    }
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router<A: QueryAgent + 'static>(app_state: AppState<A>) -> Router {
    Router::new()
        .route("/api/run/oi", post(run_oi::<A>))
        .route("/api/run/ltp", post(run_ltp::<A>))
        .route("/api/query", post(run_query::<A>))
        .route("/api/config", get(get_config::<A>))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server<A: QueryAgent + 'static>(config: PipelineConfig, agent: A, port: u16) -> Result<()> {
    let app = build_router(AppState::new(config, agent));

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 ETL API Server running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   POST /api/run/oi");
    println!("   POST /api/run/ltp");
    println!("   POST /api/query   {{\"question\": \"...\", \"sources\": [\"...\"]}}");
    println!("   GET  /api/config");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
