//! Async client for the Coverity Connect REST API.
//!
//! The crate is split into:
//! - [`config`]: connection settings read from named inputs (environment or an injected lookup)
//! - [`model`]: typed records for projects, streams, defects and users
//! - [`client`]: the HTTP client and the [`CoverityApi`] seam consumed by the MCP layer

pub mod client;
pub mod config;
pub mod error;
pub mod model;
mod response;
pub mod safety;

pub use client::{CoverityApi, CoverityClient};
pub use config::{ConnectionConfig, ProxyConfig, Settings};
pub use error::{ConfigError, CoverityError, Result};
pub use model::{
    Defect, DefectDetail, DefectEvent, DefectQuery, Project, RoleAssignment, RoleScope, Severity,
    Stream, User, UserQuery, UserSummary,
};
