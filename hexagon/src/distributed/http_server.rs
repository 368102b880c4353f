//! Reference server for the other side of [`crate::distributed::HttpRemoteExecutor`]'s
//! wire contract: `POST /api/v1/nodes/{name}/execute` and `GET /api/v1/health`.
//!
//! Not wired into any executor automatically — a deployment registers the
//! node handlers it wants to expose remotely, builds the router, and serves
//! it with whatever `axum` listener setup fits its process. Feature-gated
//! behind `http-server` since most embedders run nodes in-process and never
//! need this.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::graph::{Node, RunContext};
use crate::checkpoint::RunnableConfig;

struct ServerState<S>
where
    S: Clone + Send + Sync + Debug + Serialize + for<'de> Deserialize<'de> + 'static,
{
    nodes: HashMap<String, Arc<dyn Node<S>>>,
}

#[derive(Deserialize)]
struct ExecuteRequest {
    #[allow(dead_code)]
    node_name: String,
    state_data: String,
}

#[derive(Serialize)]
struct ExecuteResponse {
    state_data: String,
    error: Option<String>,
}

/// Builds the axum router exposing `nodes` for remote dispatch. Node names
/// not present in `nodes` answer 404 on execute.
pub fn node_server_router<S>(nodes: HashMap<String, Arc<dyn Node<S>>>) -> Router
where
    S: Clone + Send + Sync + Debug + Serialize + for<'de> Deserialize<'de> + 'static,
{
    let state = Arc::new(ServerState { nodes });
    Router::new()
        .route("/api/v1/nodes/:name/execute", post(execute::<S>))
        .route("/api/v1/health", get(health))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    axum::http::StatusCode::OK
}

async fn execute<S>(
    State(state): State<Arc<ServerState<S>>>,
    Path(name): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> impl IntoResponse
where
    S: Clone + Send + Sync + Debug + Serialize + for<'de> Deserialize<'de> + 'static,
{
    let Some(node) = state.nodes.get(&name) else {
        return (axum::http::StatusCode::NOT_FOUND, Json(ExecuteResponse {
            state_data: String::new(),
            error: Some(format!("no node registered for '{name}'")),
        }));
    };

    let decoded = match BASE64.decode(&request.state_data) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                axum::http::StatusCode::BAD_REQUEST,
                Json(ExecuteResponse { state_data: String::new(), error: Some(e.to_string()) }),
            )
        }
    };
    let input: S = match serde_json::from_slice(&decoded) {
        Ok(s) => s,
        Err(e) => {
            return (
                axum::http::StatusCode::BAD_REQUEST,
                Json(ExecuteResponse { state_data: String::new(), error: Some(e.to_string()) }),
            )
        }
    };

    let ctx = RunContext::new(RunnableConfig::default());
    match node.run(input, &ctx).await {
        Ok(outcome) => {
            let next = match outcome {
                crate::graph::NodeOutcome::Next(s) => s,
                crate::graph::NodeOutcome::Interrupt { state, .. } => state,
            };
            let encoded = match serde_json::to_vec(&next) {
                Ok(bytes) => BASE64.encode(bytes),
                Err(e) => {
                    return (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ExecuteResponse { state_data: String::new(), error: Some(e.to_string()) }),
                    )
                }
            };
            (axum::http::StatusCode::OK, Json(ExecuteResponse { state_data: encoded, error: None }))
        }
        Err(err) => (
            axum::http::StatusCode::OK,
            Json(ExecuteResponse { state_data: String::new(), error: Some(err.to_string()) }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionError;
    use crate::graph::node_fn;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Counter {
        value: i32,
    }

    fn router() -> Router {
        let mut nodes: HashMap<String, Arc<dyn Node<Counter>>> = HashMap::new();
        nodes.insert(
            "inc".to_string(),
            node_fn("inc", |mut s: Counter| async move {
                s.value += 1;
                Ok::<_, ExecutionError>(s)
            }),
        );
        node_server_router(nodes)
    }

    #[tokio::test]
    async fn execute_runs_the_registered_node_and_returns_new_state() {
        let body = serde_json::json!({
            "node_name": "inc",
            "state_data": BASE64.encode(serde_json::to_vec(&Counter { value: 5 }).unwrap()),
        });
        let request = Request::post("/api/v1/nodes/inc/execute")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn execute_unknown_node_returns_not_found() {
        let body = serde_json::json!({ "node_name": "missing", "state_data": "" });
        let request = Request::post("/api/v1/nodes/missing/execute")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let request = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
