//! Sales order creation
//!
//! Creates a sales order header, then each line in input order. A failed
//! header ends the workflow. A failed line is recorded and the loop moves on;
//! nothing already created is rolled back.
//!
//! Stages: assemble header → create header → create lines → summarize.

use crate::gateway::{Gateway, GatewayResult, HttpMethod};
use crate::notify::{NotificationRelay, ProgressEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::watch;

/// Shown in place of an order number the backend assigned but did not return
pub const AUTO_ASSIGNED: &str = "(auto-assigned)";

const HEADER_PATH: &str = "/data/SalesOrderHeadersV2";
const LINE_PATH: &str = "/data/SalesOrderLines";

/// Sales order header arguments
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SalesOrderHeader {
    /// Company the order belongs to
    #[serde(rename = "dataAreaId")]
    pub data_area_id: String,
    /// Requested ship date (`YYYY-MM-DD`)
    #[serde(rename = "RequestedShippingDate")]
    pub requested_shipping_date: String,
    /// Ordering customer
    #[serde(rename = "CustomerAccount")]
    pub customer_account: String,
    /// Order number; the backend assigns one when absent
    #[serde(rename = "SalesOrderNumber", default)]
    pub sales_order_number: Option<String>,
}

/// Sales order line arguments
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SalesOrderLine {
    /// Item being ordered
    #[serde(rename = "ItemNumber")]
    pub item_number: String,
    /// Quantity ordered
    #[serde(rename = "OrderedSalesQuantity")]
    pub ordered_sales_quantity: f64,
    /// Shipping site
    #[serde(rename = "SiteId", default)]
    pub site_id: Option<String>,
}

/// Header part of the summary
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeaderOutcome {
    /// Order number used for the lines, or [`AUTO_ASSIGNED`]
    #[serde(rename = "SalesOrderNumber")]
    pub sales_order_number: String,
    /// Whether the header exists in the backend; `false` only in the summary
    /// attached to a header failure
    pub created: bool,
}

/// Outcome of one line
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LineOutcome {
    /// Zero-based input position
    pub index: usize,
    /// Whether the line was created
    pub ok: bool,
    /// Success note or failure detail
    pub message: String,
}

/// Aggregated workflow outcome
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkflowResult {
    /// Header identity
    pub header: HeaderOutcome,
    /// Per-line outcomes in input order
    pub lines: Vec<LineOutcome>,
    /// Set when the line loop stopped on a cancellation signal
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl WorkflowResult {
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

/// Create a header and its lines.
///
/// # Arguments
/// * `gateway` - Backend gateway
/// * `header` - Header arguments
/// * `lines` - Line arguments, created strictly in this order
/// * `relay` - Progress notifications
/// * `cancel` - When it reads `true` before a line call, no further lines are sent
///
/// # Returns
/// An error result if the header call fails (no lines attempted); otherwise a
/// success result carrying the [`WorkflowResult`] JSON, whatever the lines did.
pub async fn create_sales_order(
    gateway: &dyn Gateway,
    header: &SalesOrderHeader,
    lines: &[SalesOrderLine],
    relay: &NotificationRelay,
    cancel: Option<watch::Receiver<bool>>,
) -> GatewayResult {
    let workflow = SalesOrderWorkflow {
        gateway,
        header,
        relay,
        cancel,
    };

    let created = match workflow.create_header().await {
        Ok(created) => created,
        Err(failure) => return failure,
    };

    let order_number = match workflow.order_number(&created) {
        Some(number) => number,
        None => return workflow.unresolved_order_number(&created),
    };

    let (outcomes, cancelled) = workflow.create_lines(&order_number, lines).await;

    let summary = WorkflowResult {
        header: HeaderOutcome {
            sales_order_number: order_number,
            created: true,
        },
        lines: outcomes,
        cancelled,
    };

    tracing::info!(
        invocation_id = %relay.invocation_id(),
        order = %summary.header.sales_order_number,
        lines = summary.lines.len(),
        failed = summary.lines.iter().filter(|l| !l.ok).count(),
        "Sales order workflow finished"
    );

    GatewayResult::success(summary.render())
}

struct SalesOrderWorkflow<'a> {
    gateway: &'a dyn Gateway,
    header: &'a SalesOrderHeader,
    relay: &'a NotificationRelay,
    cancel: Option<watch::Receiver<bool>>,
}

impl SalesOrderWorkflow<'_> {
    async fn create_header(&self) -> Result<GatewayResult, GatewayResult> {
        self.relay.notify(ProgressEvent::StepStarted {
            step: "header".to_string(),
        });

        let result = self
            .gateway
            .call(
                HttpMethod::Post,
                HEADER_PATH,
                Some(header_payload(self.header)),
                self.relay,
            )
            .await;

        self.relay.notify(ProgressEvent::StepCompleted {
            step: "header".to_string(),
            ok: !result.is_error,
        });

        if result.is_error {
            tracing::warn!(
                invocation_id = %self.relay.invocation_id(),
                customer = %self.header.customer_account,
                "Sales order header creation failed"
            );
            let number = self
                .header
                .sales_order_number
                .clone()
                .unwrap_or_else(|| AUTO_ASSIGNED.to_string());
            return Err(failure_with_summary(
                format!("Failed to create sales order header: {}", result.text()),
                HeaderOutcome {
                    sales_order_number: number,
                    created: false,
                },
            ));
        }
        Ok(result)
    }

    /// Supplied number, else the one the backend put in the created record
    fn order_number(&self, created: &GatewayResult) -> Option<String> {
        if let Some(number) = &self.header.sales_order_number {
            return Some(number.clone());
        }
        created
            .json()
            .and_then(|record| record.get("SalesOrderNumber").cloned())
            .and_then(|number| number.as_str().map(str::to_string))
            .filter(|number| !number.is_empty())
    }

    fn unresolved_order_number(&self, created: &GatewayResult) -> GatewayResult {
        failure_with_summary(
            format!(
                "Sales order header was created but the response carried no SalesOrderNumber, \
                 so no lines were created. Header response: {}",
                created.text()
            ),
            HeaderOutcome {
                sales_order_number: AUTO_ASSIGNED.to_string(),
                created: true,
            },
        )
    }

    async fn create_lines(
        &self,
        order_number: &str,
        lines: &[SalesOrderLine],
    ) -> (Vec<LineOutcome>, bool) {
        self.relay.notify(ProgressEvent::StepStarted {
            step: "lines".to_string(),
        });

        let mut outcomes = Vec::with_capacity(lines.len());
        let mut cancelled = false;

        for (index, line) in lines.iter().enumerate() {
            if self.is_cancelled() {
                let remaining = lines.len() - index;
                tracing::info!(
                    invocation_id = %self.relay.invocation_id(),
                    remaining,
                    "Sales order line loop cancelled"
                );
                self.relay
                    .notify(ProgressEvent::WorkflowCancelled { remaining });
                cancelled = true;
                break;
            }

            let result = self
                .gateway
                .call(
                    HttpMethod::Post,
                    LINE_PATH,
                    Some(line_payload(self.header, order_number, line)),
                    self.relay,
                )
                .await;

            let outcome = LineOutcome {
                index,
                ok: !result.is_error,
                message: if result.is_error {
                    result.text()
                } else {
                    format!(
                        "Line {} created: item {} x {}",
                        index + 1,
                        line.item_number,
                        line.ordered_sales_quantity
                    )
                },
            };

            self.relay.notify(ProgressEvent::LineOutcome {
                index,
                ok: outcome.ok,
                message: outcome.message.clone(),
            });
            outcomes.push(outcome);
        }

        self.relay.notify(ProgressEvent::StepCompleted {
            step: "lines".to_string(),
            ok: !cancelled && outcomes.iter().all(|o| o.ok),
        });

        (outcomes, cancelled)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }
}

/// Error result for a run that stopped at the header: the failure text,
/// then a summary with no lines.
fn failure_with_summary(message: String, header: HeaderOutcome) -> GatewayResult {
    let summary = WorkflowResult {
        header,
        lines: Vec::new(),
        cancelled: false,
    };
    let mut result = GatewayResult::error(message);
    result
        .content
        .push(crate::gateway::Content::text(summary.render()));
    result
}

/// Header body; the order number is left out when not supplied
fn header_payload(header: &SalesOrderHeader) -> Value {
    let mut body = Map::new();
    body.insert("dataAreaId".to_string(), json!(header.data_area_id));
    body.insert(
        "RequestedShippingDate".to_string(),
        json!(header.requested_shipping_date),
    );
    body.insert("CustomerAccount".to_string(), json!(header.customer_account));
    if let Some(number) = &header.sales_order_number {
        body.insert("SalesOrderNumber".to_string(), json!(number));
    }
    Value::Object(body)
}

/// Line body: shared header context plus line fields
fn line_payload(header: &SalesOrderHeader, order_number: &str, line: &SalesOrderLine) -> Value {
    let mut body = Map::new();
    body.insert("dataAreaId".to_string(), json!(header.data_area_id));
    body.insert("SalesOrderNumber".to_string(), json!(order_number));
    body.insert("ItemNumber".to_string(), json!(line.item_number));
    body.insert(
        "OrderedSalesQuantity".to_string(),
        json!(line.ordered_sales_quantity),
    );
    if let Some(site) = &line.site_id {
        body.insert("SiteId".to_string(), json!(site));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned results and records every request
    struct ScriptedGateway {
        replies: Mutex<VecDeque<GatewayResult>>,
        calls: Mutex<Vec<(HttpMethod, String, Option<Value>)>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<GatewayResult>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(HttpMethod, String, Option<Value>)> {
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
            self.calls
                .lock()
                .unwrap()
                .push((method, path.to_string(), body));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| GatewayResult::error("unscripted call"))
        }
    }

    fn header(number: Option<&str>) -> SalesOrderHeader {
        SalesOrderHeader {
            data_area_id: "usmf".to_string(),
            requested_shipping_date: "2025-10-20".to_string(),
            customer_account: "US-001".to_string(),
            sales_order_number: number.map(str::to_string),
        }
    }

    fn line(item: &str, qty: f64) -> SalesOrderLine {
        SalesOrderLine {
            item_number: item.to_string(),
            ordered_sales_quantity: qty,
            site_id: None,
        }
    }

    fn summary(result: &GatewayResult) -> Value {
        result.json().expect("summary is JSON")
    }

    #[tokio::test]
    async fn test_mixed_line_outcomes_are_not_an_overall_error() {
        let gateway = ScriptedGateway::new(vec![
            GatewayResult::success(r#"{"SalesOrderNumber": "SO-100"}"#),
            GatewayResult::success("{}"),
            GatewayResult::error("Item BAD not found"),
        ]);
        let relay = NotificationRelay::new("createSalesOrder");

        let result = create_sales_order(
            &gateway,
            &header(Some("SO-100")),
            &[line("1000", 5.0), line("BAD", 1.0)],
            &relay,
            None,
        )
        .await;

        assert!(!result.is_error);
        let summary = summary(&result);
        assert_eq!(summary["header"]["SalesOrderNumber"], "SO-100");
        assert_eq!(summary["header"]["created"], true);
        assert_eq!(summary["lines"][0]["index"], 0);
        assert_eq!(summary["lines"][0]["ok"], true);
        assert_eq!(summary["lines"][1]["index"], 1);
        assert_eq!(summary["lines"][1]["ok"], false);
        assert_eq!(summary["lines"][1]["message"], "Item BAD not found");
        assert!(summary.get("cancelled").is_none());
    }

    #[tokio::test]
    async fn test_header_failure_stops_before_lines() {
        let gateway = ScriptedGateway::new(vec![GatewayResult::error("customer blocked")]);
        let relay = NotificationRelay::new("createSalesOrder");

        let result = create_sales_order(
            &gateway,
            &header(None),
            &[line("1000", 5.0), line("1001", 2.0)],
            &relay,
            None,
        )
        .await;

        assert!(result.is_error);
        assert!(result.text().contains("customer blocked"));
        assert_eq!(gateway.calls().len(), 1);

        let attached: Value = serde_json::from_str(&result.content[1].text).unwrap();
        assert_eq!(attached["header"]["created"], false);
        assert_eq!(attached["header"]["SalesOrderNumber"], AUTO_ASSIGNED);
        assert_eq!(attached["lines"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_payloads_and_ordering() {
        let gateway = ScriptedGateway::new(vec![
            GatewayResult::success("{}"),
            GatewayResult::success("{}"),
            GatewayResult::success("{}"),
        ]);
        let relay = NotificationRelay::new("createSalesOrder");
        let mut sited = line("1001", 2.0);
        sited.site_id = Some("1".to_string());

        create_sales_order(
            &gateway,
            &header(Some("SO-7")),
            &[line("1000", 5.0), sited],
            &relay,
            None,
        )
        .await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1, HEADER_PATH);
        assert_eq!(
            calls[0].2.as_ref().unwrap(),
            &json!({
                "dataAreaId": "usmf",
                "RequestedShippingDate": "2025-10-20",
                "CustomerAccount": "US-001",
                "SalesOrderNumber": "SO-7"
            })
        );
        assert_eq!(calls[1].1, LINE_PATH);
        let first_line = calls[1].2.as_ref().unwrap();
        assert_eq!(first_line["ItemNumber"], "1000");
        assert_eq!(first_line["SalesOrderNumber"], "SO-7");
        assert_eq!(first_line["dataAreaId"], "usmf");
        assert!(first_line.get("SiteId").is_none());
        assert_eq!(calls[2].2.as_ref().unwrap()["SiteId"], "1");
        assert!(calls.iter().all(|(method, _, _)| *method == HttpMethod::Post));
    }

    #[test]
    fn test_header_payload_omits_missing_order_number() {
        let payload = header_payload(&header(None));
        assert!(payload.get("SalesOrderNumber").is_none());
        assert_eq!(payload["CustomerAccount"], "US-001");
    }

    #[tokio::test]
    async fn test_auto_assigned_number_is_read_from_header_response() {
        let gateway = ScriptedGateway::new(vec![
            GatewayResult::success(r#"{"SalesOrderNumber": "000812", "dataAreaId": "usmf"}"#),
            GatewayResult::success("{}"),
        ]);
        let relay = NotificationRelay::new("createSalesOrder");

        let result =
            create_sales_order(&gateway, &header(None), &[line("1000", 1.0)], &relay, None).await;

        assert!(!result.is_error);
        assert_eq!(summary(&result)["header"]["SalesOrderNumber"], "000812");
        assert_eq!(gateway.calls()[1].2.as_ref().unwrap()["SalesOrderNumber"], "000812");
    }

    #[tokio::test]
    async fn test_unreturned_auto_number_stops_after_header() {
        let gateway = ScriptedGateway::new(vec![GatewayResult::success(
            "Operation successful (HTTP 204)",
        )]);
        let relay = NotificationRelay::new("createSalesOrder");

        let result =
            create_sales_order(&gateway, &header(None), &[line("1000", 1.0)], &relay, None).await;

        assert!(result.is_error);
        assert_eq!(gateway.calls().len(), 1);
        assert!(result.text().contains(AUTO_ASSIGNED));

        let attached: Value = serde_json::from_str(&result.content[1].text).unwrap();
        assert_eq!(attached["header"]["created"], true);
    }

    #[tokio::test]
    async fn test_cancellation_stops_line_loop() {
        let gateway = ScriptedGateway::new(vec![GatewayResult::success("{}")]);
        let relay = NotificationRelay::new("createSalesOrder");
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let result = create_sales_order(
            &gateway,
            &header(Some("SO-1")),
            &[line("1000", 1.0), line("1001", 1.0)],
            &relay,
            Some(rx),
        )
        .await;

        assert!(!result.is_error);
        let summary = summary(&result);
        assert_eq!(summary["lines"].as_array().unwrap().len(), 0);
        assert_eq!(summary["cancelled"], true);
        assert_eq!(gateway.calls().len(), 1);
    }
}
