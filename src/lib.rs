//! demdesk: a flat-file tracker for DEM (Digital Enhancement
//! Management) project records with enrichment, reporting, document
//! intelligence, and an HTTP API.

pub mod chats;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod extract;
pub mod llm;
pub mod prompts;
pub mod report;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
pub mod util;
