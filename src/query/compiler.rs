//! Query compiler
//!
//! Builds the ordered query parameters for an entity collection read.
//! Compilation is infallible: values are passed through as given, and filter
//! values are single-quoted without escaping.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Filter key that pins a query to a single company partition
pub const COMPANY_FIELD: &str = "dataAreaId";

/// Structured query request as received from the caller
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Entity-set name (raw until resolved)
    pub entity: String,
    /// `$select` value, emitted verbatim
    #[serde(default)]
    pub select: Option<String>,
    /// Field equality filters, in caller order
    #[serde(default)]
    pub filter: Option<FilterMap>,
    /// `$expand` value, emitted verbatim
    #[serde(default)]
    pub expand: Option<String>,
    /// Page size; only positive values are honoured
    #[serde(default)]
    pub top: Option<i64>,
    /// Rows to skip; emitted only when positive
    #[serde(default)]
    pub skip: Option<i64>,
    /// Explicit cross-company choice; `None` allows auto-escalation
    #[serde(default)]
    pub cross_company: Option<bool>,
}

/// Insertion-ordered field → value filter map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMap(Vec<(String, String)>);

impl FilterMap {
    /// Build from ordered pairs
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether the map has no pairs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any key names the company-scoping field (case-insensitive)
    pub fn scopes_company(&self) -> bool {
        self.0
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(COMPANY_FIELD))
    }

    /// `k eq 'v'` clauses joined with ` and `
    pub fn to_clause(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{} eq '{}'", key, value))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl<'de> Deserialize<'de> for FilterMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FilterVisitor;

        impl<'de> Visitor<'de> for FilterVisitor {
            type Value = FilterMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<FilterMap, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(serde::de::Error::custom(format!(
                                "filter value for '{}' must be a scalar, got {}",
                                key, other
                            )))
                        }
                    };
                    pairs.push((key, value));
                }
                Ok(FilterMap(pairs))
            }
        }

        deserializer.deserialize_map(FilterVisitor)
    }
}

/// Compiled request: collection path plus ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Collection path, e.g. `/data/CustomersV3`
    pub path: String,
    /// Query parameters in emission order
    pub params: Vec<(String, String)>,
    /// True when cross-company was switched on by the company filter
    pub cross_company_escalated: bool,
}

impl CompiledQuery {
    /// Value of the first parameter named `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether cross-company mode is emitted
    pub fn is_cross_company(&self) -> bool {
        self.param("cross-company") == Some("true")
    }

    /// Path plus encoded query string. Keys are emitted literally; values are
    /// form-url-encoded.
    pub fn to_url(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(key, value)| {
                let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{}={}", key, encoded)
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// Compile `req` into query parameters.
///
/// Parameter order is `$select`, `$filter`, `$expand`, `$top`, `$skip`,
/// `cross-company`. `$top` is always present, falling back to
/// `default_page_size` when the request carries no positive value.
pub fn compile(req: &QueryRequest, default_page_size: u32) -> CompiledQuery {
    let mut params = Vec::new();

    if let Some(select) = &req.select {
        params.push(("$select".to_string(), select.clone()));
    }

    let filter = req.filter.as_ref().filter(|f| !f.is_empty());
    if let Some(filter) = filter {
        params.push(("$filter".to_string(), filter.to_clause()));
    }

    if let Some(expand) = &req.expand {
        params.push(("$expand".to_string(), expand.clone()));
    }

    let top = req
        .top
        .filter(|top| *top > 0)
        .unwrap_or(i64::from(default_page_size));
    params.push(("$top".to_string(), top.to_string()));

    if let Some(skip) = req.skip.filter(|skip| *skip > 0) {
        params.push(("$skip".to_string(), skip.to_string()));
    }

    let escalated =
        req.cross_company.is_none() && filter.map(FilterMap::scopes_company).unwrap_or(false);
    if req.cross_company == Some(true) || escalated {
        params.push(("cross-company".to_string(), "true".to_string()));
    }

    CompiledQuery {
        path: format!("/data/{}", req.entity),
        params,
        cross_company_escalated: escalated,
    }
}
