//! Tool API handlers
//!
//! Catalog listing and tool invocation, plain and streamed.

use crate::api::streaming::create_sse_stream;
use crate::api::utils::{lookup_tool, parse_arguments};
use crate::error::AppError;
use crate::state::SharedState;
use crate::tools::{ToolDescriptor, ToolName, ToolResult};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{Json, Response},
};
use serde::Serialize;

/// Catalog listing
#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    /// Every operation with its description
    pub tools: Vec<ToolDescriptor>,
    /// Number of operations
    pub count: usize,
}

/// GET /api/tools - List every operation
pub async fn list_tools() -> Json<ToolListResponse> {
    let tools: Vec<ToolDescriptor> = ToolName::all()
        .iter()
        .copied()
        .map(ToolDescriptor::from)
        .collect();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

/// POST /api/tools/:name - Run an operation and return its result
pub async fn invoke_tool(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolResult>, AppError> {
    let tool = lookup_tool(&name)?;
    let args = parse_arguments(&body)?;

    let relay = state.relay_for(tool.as_str());
    let result = state
        .toolbox
        .invoke(tool, args, &relay, Some(state.shutdown.clone()))
        .await;

    Ok(Json(result))
}

/// POST /api/tools/:name/stream - Run an operation, streaming its notifications
pub async fn invoke_tool_stream(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let tool = lookup_tool(&name)?;
    let args = parse_arguments(&body)?;
    create_sse_stream(state, tool, args)
}
