use nse_tick_etl::{AgentConfig, ChatCompletionAgent, QueryAgent};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Local stand-in for a chat-completions endpoint. The first `failures`
/// calls answer with `status`.
#[derive(Clone)]
struct FakeModel {
    calls: Arc<AtomicUsize>,
    failures: usize,
    status: StatusCode,
    last_request: Arc<Mutex<Option<Value>>>,
}

async fn complete(State(model): State<FakeModel>, Json(request): Json<Value>) -> impl IntoResponse {
    let call = model.calls.fetch_add(1, Ordering::SeqCst);
    *model.last_request.lock().unwrap() = Some(request);
    if call < model.failures {
        return (model.status, Json(json!({"error": "busy"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Token 2885 at 1300 CE."}}]
        })),
    )
}

async fn spawn_model(failures: usize, status: StatusCode) -> (String, FakeModel) {
    let model = FakeModel {
        calls: Arc::new(AtomicUsize::new(0)),
        failures,
        status,
        last_request: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(complete))
        .with_state(model.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1/chat/completions", addr), model)
}

fn agent_for(endpoint: String) -> ChatCompletionAgent {
    ChatCompletionAgent::new(AgentConfig {
        api_key: Some("test-key".to_string()),
        endpoint,
        ..AgentConfig::default()
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_answer_sends_tables_and_question() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("All_stock_open_interest_data.csv");
        fs::write(&source, "Token,Time\n2885,2024-11-29 09:15:00+05:30\n").unwrap();
        let (endpoint, model) = spawn_model(0, StatusCode::OK).await;

        let answer = agent_for(endpoint).answer(&[source], "Which token?").await.unwrap();
        assert_eq!(answer, "Token 2885 at 1300 CE.");

        let request = model.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request["model"], "gpt-3.5-turbo");
        assert_eq!(request["temperature"], 0.0);
        let user = request["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("### All_stock_open_interest_data.csv"));
        assert!(user.ends_with("Question: Which token?"));
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ohlc.csv");
        fs::write(&source, "token\n500\n").unwrap();
        let (endpoint, model) = spawn_model(2, StatusCode::SERVICE_UNAVAILABLE).await;

        let answer = agent_for(endpoint).answer(&[source], "Any bars?").await.unwrap();
        assert_eq!(answer, "Token 2885 at 1300 CE.");
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ohlc.csv");
        fs::write(&source, "token\n500\n").unwrap();
        let (endpoint, model) = spawn_model(usize::MAX, StatusCode::UNAUTHORIZED).await;

        let err = agent_for(endpoint).answer(&[source], "Any bars?").await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
