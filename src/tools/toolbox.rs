//! Operation runner
//!
//! Decodes arguments, resolves entity names, builds the backend request and
//! hands it to the gateway. Whatever happens, the caller gets a result:
//! argument problems, unknown entities and even panics become error results.

use crate::catalog::EntityMatcher;
use crate::gateway::{Gateway, HttpMethod};
use crate::notify::{NotificationRelay, ProgressEvent};
use crate::query::{compile, QueryRequest};
use crate::tools::args::{
    odata_datetime, AssignUserRoleArgs, CreateCustomerArgs, CreateSalesOrderArgs,
    CreateSystemUserArgs, EntityCountArgs, UpdateCustomerArgs, UpdatePositionHierarchyArgs,
};
use crate::tools::{ToolError, ToolName, ToolResult};
use crate::workflow::create_sales_order;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

const INITIALIZE_DATA_MANAGEMENT_PATH: &str =
    "/data/DataManagementDefinitionGroups/Microsoft.Dynamics.DataEntities.InitializeDataManagement";

/// Runs catalog operations against a gateway
pub struct Toolbox {
    gateway: Arc<dyn Gateway>,
    matcher: EntityMatcher,
    default_page_size: u32,
}

impl Toolbox {
    /// Create a toolbox
    ///
    /// # Arguments
    /// * `gateway` - Backend gateway shared by all invocations
    /// * `matcher` - Entity-name resolver over the read-only registry
    /// * `default_page_size` - `$top` for queries that do not set one
    pub fn new(gateway: Arc<dyn Gateway>, matcher: EntityMatcher, default_page_size: u32) -> Self {
        Self {
            gateway,
            matcher,
            default_page_size,
        }
    }

    /// Run `tool` with JSON `args`.
    ///
    /// Never fails and never panics outward; every failure is an error result.
    pub async fn invoke(
        &self,
        tool: ToolName,
        args: Value,
        relay: &NotificationRelay,
        cancel: Option<watch::Receiver<bool>>,
    ) -> ToolResult {
        let start = Instant::now();
        tracing::info!(
            invocation_id = %relay.invocation_id(),
            tool = %tool,
            "Invoking tool"
        );

        let outcome = AssertUnwindSafe(self.dispatch(tool, args, relay, cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                tracing::error!(invocation_id = %relay.invocation_id(), tool = %tool, "Tool panicked");
                Err(ToolError::Panicked(tool.as_str()))
            });

        let result = outcome.unwrap_or_else(|e| ToolResult::error(e.to_string()));

        tracing::info!(
            invocation_id = %relay.invocation_id(),
            tool = %tool,
            is_error = result.is_error,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tool finished"
        );
        result
    }

    async fn dispatch(
        &self,
        tool: ToolName,
        args: Value,
        relay: &NotificationRelay,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ToolResult, ToolError> {
        match tool {
            ToolName::OdataQuery => self.odata_query(decode(tool, args)?, relay).await,
            ToolName::CreateCustomer => {
                let args: CreateCustomerArgs = decode(tool, args)?;
                Ok(self
                    .post("/data/CustomersV3", Value::Object(args.customer_data), relay)
                    .await)
            }
            ToolName::UpdateCustomer => {
                let args: UpdateCustomerArgs = decode(tool, args)?;
                let path = format!(
                    "/data/CustomersV3(dataAreaId='{}',CustomerAccount='{}')",
                    args.data_area_id, args.customer_account
                );
                Ok(self
                    .patch(&path, Value::Object(args.update_data), relay)
                    .await)
            }
            ToolName::GetEntityCount => self.entity_count(decode(tool, args)?, relay).await,
            ToolName::CreateSystemUser => {
                let args: CreateSystemUserArgs = decode(tool, args)?;
                Ok(self
                    .post("/data/SystemUsers", Value::Object(args.user_data), relay)
                    .await)
            }
            ToolName::AssignUserRole => {
                let args: AssignUserRoleArgs = decode(tool, args)?;
                Ok(self
                    .post(
                        "/data/SecurityUserRoleAssociations",
                        Value::Object(args.association_data),
                        relay,
                    )
                    .await)
            }
            ToolName::UpdatePositionHierarchy => {
                let args: UpdatePositionHierarchyArgs = decode(tool, args)?;
                let path = format!(
                    "/data/PositionHierarchies(PositionId='{}',HierarchyTypeName='{}',ValidFrom={},ValidTo={})",
                    args.position_id,
                    args.hierarchy_type_name,
                    odata_datetime(&args.valid_from),
                    odata_datetime(&args.valid_to)
                );
                Ok(self
                    .patch(&path, Value::Object(args.update_data), relay)
                    .await)
            }
            ToolName::InitializeDataManagement => {
                Ok(self
                    .post(INITIALIZE_DATA_MANAGEMENT_PATH, json!({}), relay)
                    .await)
            }
            ToolName::GetODataMetadata => Ok(self
                .gateway
                .call(HttpMethod::Get, "/data/$metadata", None, relay)
                .await),
            ToolName::CreateSalesOrder => {
                let args: CreateSalesOrderArgs = decode(tool, args)?;
                if args.lines.is_empty() {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.as_str(),
                        reason: "at least one line is required".to_string(),
                    });
                }
                Ok(create_sales_order(
                    self.gateway.as_ref(),
                    &args.header,
                    &args.lines,
                    relay,
                    cancel,
                )
                .await)
            }
        }
    }

    async fn odata_query(
        &self,
        mut request: QueryRequest,
        relay: &NotificationRelay,
    ) -> Result<ToolResult, ToolError> {
        request.entity = self.resolve_entity(&request.entity, relay)?;

        let compiled = compile(&request, self.default_page_size);
        tracing::debug!(
            entity = %request.entity,
            top = compiled.param("$top").unwrap_or_default(),
            cross_company = compiled.is_cross_company(),
            "Compiled query"
        );
        if compiled.cross_company_escalated {
            tracing::debug!(entity = %request.entity, "Company filter enabled cross-company");
            relay.notify(ProgressEvent::CrossCompanyEnabled {
                entity: request.entity.clone(),
            });
        }

        Ok(self
            .gateway
            .call(HttpMethod::Get, &compiled.to_url(), None, relay)
            .await)
    }

    async fn entity_count(
        &self,
        args: EntityCountArgs,
        relay: &NotificationRelay,
    ) -> Result<ToolResult, ToolError> {
        let entity = self.resolve_entity(&args.entity, relay)?;
        let mut path = format!("/data/{}/$count", entity);
        if args.cross_company == Some(true) {
            path.push_str("?cross-company=true");
        }
        Ok(self.gateway.call(HttpMethod::Get, &path, None, relay).await)
    }

    /// Canonical name for `raw`, announcing any correction
    fn resolve_entity(&self, raw: &str, relay: &NotificationRelay) -> Result<String, ToolError> {
        let found = self
            .matcher
            .resolve(raw)
            .ok_or_else(|| ToolError::EntityNotFound(raw.to_string()))?;

        if found.is_correction(raw) {
            relay.notify(ProgressEvent::EntityCorrected {
                requested: raw.to_string(),
                resolved: found.name.clone(),
            });
        }
        Ok(found.name)
    }

    async fn post(&self, path: &str, body: Value, relay: &NotificationRelay) -> ToolResult {
        self.gateway
            .call(HttpMethod::Post, path, Some(body), relay)
            .await
    }

    async fn patch(&self, path: &str, body: Value, relay: &NotificationRelay) -> ToolResult {
        self.gateway
            .call(HttpMethod::Patch, path, Some(body), relay)
            .await
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.as_str(),
        reason: e.to_string(),
    })
}
