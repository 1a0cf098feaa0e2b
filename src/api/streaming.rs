//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Runs one invocation in the background and streams its notifications,
//! then the final result, then the done signal.

use crate::error::AppError;
use crate::notify::{ChannelSink, Notification};
use crate::state::SharedState;
use crate::tools::{ToolName, ToolResult};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream::Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Last event of every stream
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// Prefix for an event reporting that the invocation itself was lost
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Start `tool` and build the SSE response that follows it
///
/// # Arguments
/// * `state` - Application state
/// * `tool` - Operation to run
/// * `args` - Operation arguments
///
/// # Returns
/// * `Result<Response, AppError>` - SSE HTTP response or error
pub fn create_sse_stream(
    state: SharedState,
    tool: ToolName,
    args: Value,
) -> Result<Response, AppError> {
    let (sink, rx) = ChannelSink::channel();
    let relay = state.relay_for(tool.as_str()).with_sink(Arc::new(sink));
    let toolbox = state.toolbox.clone();
    let cancel = state.shutdown.clone();

    // The relay moves into the task; the channel closes once the task ends.
    let handle = tokio::spawn(async move { toolbox.invoke(tool, args, &relay, Some(cancel)).await });

    let sse_stream = create_stream(rx, handle)
        .map(|data| Ok::<_, std::io::Error>(format!("data: {}\n\n", data)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Notifications as they arrive, then the result, then the done signal
fn create_stream(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    handle: JoinHandle<ToolResult>,
) -> impl Stream<Item = String> {
    use async_stream::stream;

    stream! {
        while let Some(notification) = rx.recv().await {
            match serde_json::to_string(&notification) {
                Ok(json) => yield json,
                Err(e) => tracing::debug!(error = %e, "Dropping unserializable notification"),
            }
        }

        match handle.await {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(json) => yield json,
                Err(e) => yield format!("{} {}", SSE_ERROR_PREFIX, e),
            },
            Err(e) => {
                tracing::error!(error = %e, "Streamed invocation was lost");
                yield format!("{} {}", SSE_ERROR_PREFIX, e);
            }
        }

        yield SSE_DONE_SIGNAL.to_string();
    }
}
