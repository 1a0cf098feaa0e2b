//! Entity registry
//!
//! Immutable set of canonical entity-set names. Built once at startup, either
//! from the builtin list or from a versioned JSON catalog file, then shared
//! read-only by every invocation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Canonical entity-set names shipped with the service.
const BUILTIN_ENTITIES: &[&str] = &[
    "CustomersV3",
    "CustomersV2",
    "CustomerGroups",
    "CustomerPostalAddresses",
    "VendorsV2",
    "VendorGroups",
    "ReleasedProductsV2",
    "ProductsV2",
    "ProductCategories",
    "SalesOrderHeadersV2",
    "SalesOrderLines",
    "SalesQuotationHeadersV2",
    "SalesQuotationLines",
    "PurchaseOrderHeadersV2",
    "PurchaseOrderLinesV2",
    "SystemUsers",
    "SecurityRoles",
    "SecurityUserRoleAssociations",
    "PositionHierarchies",
    "PositionHierarchyTypes",
    "Positions",
    "Workers",
    "Employees",
    "LegalEntities",
    "Warehouses",
    "OperationalSites",
    "InventoryOnHandEntries",
    "MainAccounts",
    "LedgerJournalHeaders",
    "LedgerJournalLines",
    "Currencies",
    "PaymentTerms",
    "DeliveryTerms",
    "DataManagementDefinitionGroups",
];

/// Errors raised while loading a catalog file
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Catalog file could not be read
    #[error("Failed to read entity catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid JSON for the expected shape
    #[error("Invalid entity catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog format version is not supported
    #[error("Unsupported entity catalog version: {0}")]
    UnsupportedVersion(u32),

    /// Catalog contains no usable names
    #[error("Entity catalog is empty")]
    Empty,
}

/// On-disk catalog layout
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    /// Format version (only 1 is understood)
    version: u32,
    /// Canonical entity-set names
    entities: Vec<String>,
}

/// Read-only set of canonical entity-set names
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    names: BTreeSet<String>,
}

impl EntityRegistry {
    /// Build a registry from any collection of names.
    ///
    /// Blank names are dropped and surrounding whitespace is trimmed.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    /// Registry over the builtin entity list
    pub fn builtin() -> Self {
        Self::new(BUILTIN_ENTITIES.iter().copied())
    }

    /// Load a registry from a JSON catalog file
    ///
    /// # Arguments
    /// * `path` - Path to a file shaped like `{"version": 1, "entities": [...]}`
    ///
    /// # Returns
    /// * `Ok(EntityRegistry)` - Registry holding the file's names
    /// * `Err(RegistryError)` - If the file is unreadable, malformed, or empty
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let json = fs::read_to_string(path.as_ref())?;
        let data: CatalogFile = serde_json::from_str(&json)?;

        if data.version != 1 {
            return Err(RegistryError::UnsupportedVersion(data.version));
        }

        let registry = Self::new(data.entities);
        if registry.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(registry)
    }

    /// Whether `name` is a canonical entry (exact, case-sensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterate canonical names in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of canonical names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry holds no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
