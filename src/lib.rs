//! Reconciliation engine and CLI plumbing for managing broadcasts on an
//! Ant Media Server style REST API.

pub mod address;
pub mod batch;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod desired;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod identity;
pub mod inventory;
pub mod models;
pub mod reconcile;
pub mod transport;

pub use batch::{BatchExecutor, BatchOutcome, Lifecycle, Operation};
pub use config::{AppConfig, ServerProfile};
pub use desired::{DesiredStreamSpec, StreamKind};
pub use error::{Error, Result};
pub use identity::IdGenerator;
pub use reconcile::{reconcile, ReconciliationResult};
pub use transport::{HttpTransport, Transport};
