//! Configuration module for bm25d
//!
//! This module defines the service configuration and its file/env sources.

mod service_config;

pub use service_config::ServiceConfig;
