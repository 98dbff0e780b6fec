//! Warehouse Reconciliation Library
//!
//! Read-time reconciliation of inward lots against the release, delivery,
//! warehouse-inspection, bank and client collections that reference them,
//! producing one denormalized report row with computed balances per lot.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod circuit_breaker;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod fields;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::{load_config, ReportConfig};
pub use diagnostics::{Diagnostic, ReportContext, RequestId};
pub use errors::{LookupFailure, ServiceError, StoreError};
pub use models::{sort_rows, Document, PrimaryRecord, ReportRow, RowOrder};
pub use repositories::{DocumentStore, InMemoryStore};
pub use services::reports::{LotEnricher, ReportBatchDriver, ReportWindow};
