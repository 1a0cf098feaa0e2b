//! Operation catalog
//!
//! The fixed set of callable operations with their wire names.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every callable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Query an entity collection
    OdataQuery,
    /// Create a customer
    CreateCustomer,
    /// Update a customer by company and account
    UpdateCustomer,
    /// Count rows in an entity collection
    GetEntityCount,
    /// Create a system user
    CreateSystemUser,
    /// Assign a security role to a user
    AssignUserRole,
    /// Update a position hierarchy row
    UpdatePositionHierarchy,
    /// Run the data management initialization action
    InitializeDataManagement,
    /// Fetch the service metadata document
    GetODataMetadata,
    /// Create a sales order header and its lines
    CreateSalesOrder,
}

impl ToolName {
    /// All operations in catalog order
    pub fn all() -> &'static [ToolName] {
        &[
            ToolName::OdataQuery,
            ToolName::CreateCustomer,
            ToolName::UpdateCustomer,
            ToolName::GetEntityCount,
            ToolName::CreateSystemUser,
            ToolName::AssignUserRole,
            ToolName::UpdatePositionHierarchy,
            ToolName::InitializeDataManagement,
            ToolName::GetODataMetadata,
            ToolName::CreateSalesOrder,
        ]
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::OdataQuery => "odataQuery",
            ToolName::CreateCustomer => "createCustomer",
            ToolName::UpdateCustomer => "updateCustomer",
            ToolName::GetEntityCount => "getEntityCount",
            ToolName::CreateSystemUser => "createSystemUser",
            ToolName::AssignUserRole => "assignUserRole",
            ToolName::UpdatePositionHierarchy => "updatePositionHierarchy",
            ToolName::InitializeDataManagement => "action_initializeDataManagement",
            ToolName::GetODataMetadata => "getODataMetadata",
            ToolName::CreateSalesOrder => "createSalesOrder",
        }
    }

    /// One-line description for catalog listings
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::OdataQuery => {
                "Query any entity collection with optional $select, $filter, $expand, $top, $skip and cross-company scope. Entity names are fuzzy-matched."
            }
            ToolName::CreateCustomer => "Create a customer record (CustomersV3).",
            ToolName::UpdateCustomer => {
                "Update a customer identified by dataAreaId and customerAccount."
            }
            ToolName::GetEntityCount => "Count the records in an entity collection.",
            ToolName::CreateSystemUser => "Create a system user (SystemUsers).",
            ToolName::AssignUserRole => {
                "Assign a security role to a user (SecurityUserRoleAssociations)."
            }
            ToolName::UpdatePositionHierarchy => {
                "Update a position hierarchy row identified by position, hierarchy type and validity period."
            }
            ToolName::InitializeDataManagement => {
                "Run the InitializeDataManagement action on DataManagementDefinitionGroups."
            }
            ToolName::GetODataMetadata => "Fetch the OData $metadata document.",
            ToolName::CreateSalesOrder => {
                "Create a sales order header, then each line in order. Line failures are reported per line."
            }
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::all()
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Catalog entry as listed over HTTP
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Wire name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
}

impl From<ToolName> for ToolDescriptor {
    fn from(tool: ToolName) -> Self {
        Self {
            name: tool.as_str(),
            description: tool.description(),
        }
    }
}
