// src/services/api_server.rs
//! API Server for the agent identity tools
//!
//! Exposes the tool registry over HTTP:
//! - `GET /tools` lists tool descriptors
//! - `POST /tools/:method` runs a tool with the JSON body as parameters
//!
//! When a [`HandshakeResponder`] is attached, its `/initiate` and `/callback`
//! routes are served under `/agent`, so this process can also act as a
//! handshake receiver at `http://<bind_addr>/agent/`.

use crate::contracts::identity_registry::AgentRegistry;
use crate::services::responder::HandshakeResponder;
use crate::services::tools::{ToolDescriptor, ToolKit, TOOLS};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use log::info;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

/// Path the handshake responder is nested under.
pub const AGENT_PATH: &str = "/agent";

pub struct ApiServer<R> {
    tools: Arc<ToolKit<R>>,
    responder: Option<Arc<HandshakeResponder>>,
}

impl<R: AgentRegistry + 'static> ApiServer<R> {
    /// # Arguments
    /// * `tools` - Tool registry served under `/tools`
    /// * `responder` - Optional handshake receiver served under `/agent`
    pub fn new(tools: ToolKit<R>, responder: Option<HandshakeResponder>) -> Self {
        ApiServer {
            tools: Arc::new(tools),
            responder: responder.map(Arc::new),
        }
    }

    /// Builds the application router.
    pub fn router(&self) -> Router {
        let app = Router::new()
            .route("/tools", get(Self::list_tools_handler))
            .route("/tools/:method", post(Self::call_tool_handler))
            .with_state(self.tools.clone());

        match &self.responder {
            Some(responder) => app.nest(AGENT_PATH, responder.clone().routes()),
            None => app,
        }
    }

    /// Binds `addr` and serves requests until the process stops.
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(target: "agent_id::api", "API server listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }

    /// # Endpoint
    /// GET /tools
    async fn list_tools_handler() -> Json<&'static [ToolDescriptor]> {
        Json(TOOLS)
    }

    /// Runs a tool.
    ///
    /// # Endpoint
    /// POST /tools/:method
    ///
    /// # Responses
    /// - 200 OK: `{ "success": true, ... }`
    /// - 404 Not Found: no tool named `method`
    /// - 400 Bad Request: `{ "success": false, "error": ... }`
    async fn call_tool_handler(
        Path(method): Path<String>,
        State(tools): State<Arc<ToolKit<R>>>,
        Json(params): Json<Value>,
    ) -> impl IntoResponse {
        let known = TOOLS.iter().any(|t| t.method == method);
        let body = tools.call(&method, params).await;
        let status = if !known {
            StatusCode::NOT_FOUND
        } else if body["success"] == Value::Bool(true) {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(body))
    }
}
