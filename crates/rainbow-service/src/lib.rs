//! Protocol-agnostic query layer for the rainbow label-healing service.
//!
//! Transports (HTTP, MCP) are thin adapters over [`QueryService`]; every
//! operation here is read-only and side-effect-free with respect to stored
//! state.
//!
//! - `resolver`: pure constraint-checking resolution logic
//! - `response`: the wire envelopes shared by all transports
//! - `query`: the [`QueryService`] facade over one shared store handle

pub mod query;
pub mod resolver;
pub mod response;

pub use query::QueryService;
pub use resolver::{resolve, HealOutcome};
pub use response::{
    error_codes, CountResponse, HealResponse, HealthResponse, LabelSetSummary, VersionInfo,
    VersionResponse,
};
