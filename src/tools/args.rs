//! Operation arguments
//!
//! Typed argument shapes decoded from the caller's JSON. Shape validation
//! beyond what serde enforces is the caller's responsibility.

use crate::workflow::{SalesOrderHeader, SalesOrderLine};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// `createCustomer`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerArgs {
    /// Customer record fields
    pub customer_data: Map<String, Value>,
}

/// `updateCustomer`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerArgs {
    /// Company of the customer
    pub data_area_id: String,
    /// Customer account number
    pub customer_account: String,
    /// Fields to change
    pub update_data: Map<String, Value>,
}

/// `getEntityCount`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCountArgs {
    /// Entity-set name (fuzzy-matched)
    pub entity: String,
    /// Count across all companies
    #[serde(default)]
    pub cross_company: Option<bool>,
}

/// `createSystemUser`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSystemUserArgs {
    /// User record fields
    pub user_data: Map<String, Value>,
}

/// `assignUserRole`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignUserRoleArgs {
    /// Association record fields
    pub association_data: Map<String, Value>,
}

/// `updatePositionHierarchy`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionHierarchyArgs {
    /// Position identifier
    pub position_id: String,
    /// Hierarchy type
    pub hierarchy_type_name: String,
    /// Start of the validity period
    pub valid_from: DateTime<Utc>,
    /// End of the validity period
    pub valid_to: DateTime<Utc>,
    /// Fields to change
    pub update_data: Map<String, Value>,
}

/// `createSalesOrder`
#[derive(Debug, Deserialize)]
pub struct CreateSalesOrderArgs {
    /// Header fields
    pub header: SalesOrderHeader,
    /// Lines, at least one
    pub lines: Vec<SalesOrderLine>,
}

/// OData datetime literal with second precision, e.g. `2024-01-01T00:00:00Z`
pub fn odata_datetime(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_hierarchy_datetimes_normalize_to_utc() {
        let args: UpdatePositionHierarchyArgs = serde_json::from_value(json!({
            "positionId": "000276",
            "hierarchyTypeName": "Line",
            "validFrom": "2024-01-01T02:00:00+02:00",
            "validTo": "2154-12-31T23:59:59Z",
            "updateData": {"ParentPositionId": "000100"}
        }))
        .unwrap();

        assert_eq!(odata_datetime(&args.valid_from), "2024-01-01T00:00:00Z");
        assert_eq!(odata_datetime(&args.valid_to), "2154-12-31T23:59:59Z");
    }

    #[test]
    fn test_invalid_datetime_is_rejected() {
        let result: Result<UpdatePositionHierarchyArgs, _> = serde_json::from_value(json!({
            "positionId": "000276",
            "hierarchyTypeName": "Line",
            "validFrom": "yesterday",
            "validTo": "2154-12-31T23:59:59Z",
            "updateData": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_data_must_be_an_object() {
        let result: Result<CreateCustomerArgs, _> =
            serde_json::from_value(json!({"customerData": "US-001"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_sales_order_site_is_optional() {
        let args: CreateSalesOrderArgs = serde_json::from_value(json!({
            "header": {
                "dataAreaId": "usmf",
                "RequestedShippingDate": "2025-10-20",
                "CustomerAccount": "US-001"
            },
            "lines": [
                {"ItemNumber": "1000", "OrderedSalesQuantity": 5},
                {"ItemNumber": "1001", "OrderedSalesQuantity": 2.5, "SiteId": "1"}
            ]
        }))
        .unwrap();

        assert_eq!(args.header.sales_order_number, None);
        assert_eq!(args.lines[0].site_id, None);
        assert_eq!(args.lines[0].ordered_sales_quantity, 5.0);
        assert_eq!(args.lines[1].site_id.as_deref(), Some("1"));
    }
}
