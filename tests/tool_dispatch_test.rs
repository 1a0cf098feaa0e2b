//! End-to-end tests for operation dispatch
//!
//! These drive `Toolbox::invoke` against a scripted in-memory gateway and
//! verify requests issued, results returned and notifications emitted.

mod common;

use common::{recording_relay, toolbox, ClosedSink, ScriptedGateway};
use d365_tools::gateway::{GatewayResult, HttpMethod};
use d365_tools::notify::{NotificationRelay, ProgressEvent};
use d365_tools::tools::ToolName;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

fn sales_order_args() -> serde_json::Value {
    json!({
        "header": {
            "dataAreaId": "usmf",
            "RequestedShippingDate": "2025-10-20",
            "CustomerAccount": "US-001",
            "SalesOrderNumber": "SO-1001"
        },
        "lines": [
            {"ItemNumber": "1000", "OrderedSalesQuantity": 5},
            {"ItemNumber": "BAD", "OrderedSalesQuantity": 1}
        ]
    })
}

#[tokio::test]
async fn test_mistyped_entity_is_corrected_and_announced() {
    let gateway = ScriptedGateway::with_replies(vec![GatewayResult::success(
        r#"{"value": []}"#,
    )]);
    let (relay, sink) = recording_relay("odataQuery");

    let result = toolbox(gateway.clone())
        .invoke(
            ToolName::OdataQuery,
            json!({"entity": "CustomerV3"}),
            &relay,
            None,
        )
        .await;

    assert!(!result.is_error);
    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, HttpMethod::Get);
    assert_eq!(calls[0].path, "/data/CustomersV3?$top=5");

    assert_eq!(
        sink.events()[0],
        ProgressEvent::EntityCorrected {
            requested: "CustomerV3".to_string(),
            resolved: "CustomersV3".to_string(),
        }
    );
}

#[tokio::test]
async fn test_exact_entity_is_not_announced() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, sink) = recording_relay("odataQuery");

    toolbox(gateway.clone())
        .invoke(
            ToolName::OdataQuery,
            json!({"entity": "ReleasedProductsV2", "filter": {"ProductNumber": "D0001"}}),
            &relay,
            None,
        )
        .await;

    assert_eq!(
        gateway.calls()[0].path,
        "/data/ReleasedProductsV2?$filter=ProductNumber+eq+%27D0001%27&$top=5"
    );
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_unknown_entity_issues_no_request() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, _sink) = recording_relay("odataQuery");

    let result = toolbox(gateway.clone())
        .invoke(
            ToolName::OdataQuery,
            json!({"entity": "qqqqqqqq"}),
            &relay,
            None,
        )
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("No matching entity found for 'qqqqqqqq'"));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_company_filter_escalates_and_announces() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, sink) = recording_relay("odataQuery");

    toolbox(gateway.clone())
        .invoke(
            ToolName::OdataQuery,
            json!({"entity": "CustomersV3", "filter": {"dataAreaId": "usmf"}}),
            &relay,
            None,
        )
        .await;

    assert_eq!(
        gateway.calls()[0].path,
        "/data/CustomersV3?$filter=dataAreaId+eq+%27usmf%27&$top=5&cross-company=true"
    );
    assert!(sink.events().contains(&ProgressEvent::CrossCompanyEnabled {
        entity: "CustomersV3".to_string()
    }));
}

#[tokio::test]
async fn test_explicit_false_keeps_query_in_one_company() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, sink) = recording_relay("odataQuery");

    toolbox(gateway.clone())
        .invoke(
            ToolName::OdataQuery,
            json!({
                "entity": "CustomersV3",
                "filter": {"dataAreaId": "usmf"},
                "crossCompany": false
            }),
            &relay,
            None,
        )
        .await;

    assert!(!gateway.calls()[0].path.contains("cross-company"));
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_sales_order_mixed_lines_continue() {
    let gateway = ScriptedGateway::with_replies(vec![
        GatewayResult::success(r#"{"SalesOrderNumber": "SO-1001"}"#),
        GatewayResult::success(r#"{"LineNumber": 1}"#),
        GatewayResult::error(
            "POST /data/SalesOrderLines failed with HTTP 400: Item BAD does not exist",
        ),
    ]);
    let (relay, sink) = recording_relay("createSalesOrder");

    let result = toolbox(gateway.clone())
        .invoke(ToolName::CreateSalesOrder, sales_order_args(), &relay, None)
        .await;

    assert!(!result.is_error);
    let summary = result.json().unwrap();
    assert_eq!(summary["header"]["SalesOrderNumber"], "SO-1001");
    assert_eq!(summary["header"]["created"], true);
    assert_eq!(summary["lines"][0]["index"], 0);
    assert_eq!(summary["lines"][0]["ok"], true);
    assert_eq!(summary["lines"][1]["index"], 1);
    assert_eq!(summary["lines"][1]["ok"], false);
    assert!(summary["lines"][1]["message"]
        .as_str()
        .unwrap()
        .contains("Item BAD does not exist"));

    let paths: Vec<String> = gateway.calls().into_iter().map(|c| c.path).collect();
    assert_eq!(
        paths,
        vec![
            "/data/SalesOrderHeadersV2",
            "/data/SalesOrderLines",
            "/data/SalesOrderLines"
        ]
    );

    let line_events: Vec<ProgressEvent> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::LineOutcome { .. }))
        .collect();
    assert_eq!(line_events.len(), 2);
}

#[tokio::test]
async fn test_sales_order_header_failure_stops() {
    let gateway = ScriptedGateway::with_replies(vec![GatewayResult::error(
        "POST /data/SalesOrderHeadersV2 failed with HTTP 400: Customer not found",
    )]);
    let (relay, _sink) = recording_relay("createSalesOrder");

    let result = toolbox(gateway.clone())
        .invoke(ToolName::CreateSalesOrder, sales_order_args(), &relay, None)
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("Customer not found"));
    assert_eq!(gateway.calls().len(), 1);

    let summary: serde_json::Value = serde_json::from_str(&result.content[1].text).unwrap();
    assert_eq!(summary["header"]["SalesOrderNumber"], "SO-1001");
    assert_eq!(summary["header"]["created"], false);
    assert!(summary["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sales_order_cancelled_before_lines() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, sink) = recording_relay("createSalesOrder");
    let (_tx, rx) = watch::channel(true);

    let result = toolbox(gateway.clone())
        .invoke(
            ToolName::CreateSalesOrder,
            sales_order_args(),
            &relay,
            Some(rx),
        )
        .await;

    assert!(!result.is_error);
    let summary = result.json().unwrap();
    assert_eq!(summary["cancelled"], true);
    assert_eq!(summary["lines"].as_array().unwrap().len(), 0);
    assert_eq!(gateway.calls().len(), 1);
    assert!(sink
        .events()
        .contains(&ProgressEvent::WorkflowCancelled { remaining: 2 }));
}

#[tokio::test]
async fn test_notification_failures_do_not_change_results() {
    let gateway = ScriptedGateway::with_replies(vec![GatewayResult::success("17")]);
    let relay = NotificationRelay::new("getEntityCount").with_sink(Arc::new(ClosedSink));

    let result = toolbox(gateway.clone())
        .invoke(
            ToolName::GetEntityCount,
            json!({"entity": "Wrkers"}),
            &relay,
            None,
        )
        .await;

    assert!(!result.is_error);
    assert_eq!(result.text(), "17");
    assert_eq!(gateway.calls()[0].path, "/data/Workers/$count");
}

#[tokio::test]
async fn test_backend_error_passes_through() {
    let gateway = ScriptedGateway::with_replies(vec![GatewayResult::error(
        "POST /data/SystemUsers failed with HTTP 403: Forbidden",
    )]);
    let (relay, _sink) = recording_relay("createSystemUser");

    let result = toolbox(gateway.clone())
        .invoke(
            ToolName::CreateSystemUser,
            json!({"userData": {"UserID": "jdoe", "Alias": "jdoe@contoso.com"}}),
            &relay,
            None,
        )
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "POST /data/SystemUsers failed with HTTP 403: Forbidden"
    );
    assert_eq!(
        gateway.calls()[0].body,
        Some(json!({"UserID": "jdoe", "Alias": "jdoe@contoso.com"}))
    );
}

#[tokio::test]
async fn test_notifications_carry_invocation_identity() {
    let gateway = ScriptedGateway::with_replies(vec![]);
    let (relay, sink) = recording_relay("odataQuery");

    toolbox(gateway)
        .invoke(
            ToolName::OdataQuery,
            json!({"entity": "vendor", "filter": {"DataAreaId": "usmf"}}),
            &relay,
            None,
        )
        .await;

    let events = sink.events();
    assert!(matches!(events[0], ProgressEvent::EntityCorrected { .. }));
    assert!(matches!(events[1], ProgressEvent::CrossCompanyEnabled { .. }));
}
