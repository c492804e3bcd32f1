//! MCP surface over a Coverity Connect server.
//!
//! [`CoverityServer`] implements rmcp's `ServerHandler`: tools for projects, streams, defects and
//! users, parameterized resources, and a couple of canned prompts. All remote access goes through
//! an injected [`coverity_connect_client::CoverityApi`].

pub mod cli;
mod outcome;
mod params;
mod prompts;
mod resources;
pub mod roles;
mod server;
pub mod summary;
pub mod transport;

pub use server::CoverityServer;
