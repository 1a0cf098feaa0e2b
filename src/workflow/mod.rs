//! Composite workflows
//!
//! Multi-step operations that create a parent record and its dependent
//! children through the gateway, one awaited call at a time.

pub mod sales_order;

pub use sales_order::{
    create_sales_order, HeaderOutcome, LineOutcome, SalesOrderHeader, SalesOrderLine,
    WorkflowResult, AUTO_ASSIGNED,
};
