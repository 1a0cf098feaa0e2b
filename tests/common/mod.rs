//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use d365_tools::catalog::{EntityMatcher, EntityRegistry};
use d365_tools::gateway::{Gateway, GatewayResult, HttpMethod};
use d365_tools::notify::{Notification, NotificationRelay, NotificationSink, NotifyError, ProgressEvent};
use d365_tools::tools::Toolbox;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

/// Gateway that replays queued results and records every call.
/// Once the queue is empty every call succeeds with `{}`.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<GatewayResult>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn with_replies(replies: Vec<GatewayResult>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        _relay: &NotificationRelay,
    ) -> GatewayResult {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| GatewayResult::success("{}"))
    }
}

/// Sink that keeps everything it receives
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.event.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.received.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Sink that rejects everything
pub struct ClosedSink;

impl NotificationSink for ClosedSink {
    fn deliver(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Closed)
    }
}

pub fn toolbox(gateway: Arc<dyn Gateway>) -> Toolbox {
    let matcher = EntityMatcher::new(Arc::new(EntityRegistry::builtin()));
    Toolbox::new(gateway, matcher, 5)
}

pub fn recording_relay(tool: &str) -> (NotificationRelay, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let relay = NotificationRelay::new(tool).with_sink(sink.clone());
    (relay, sink)
}
