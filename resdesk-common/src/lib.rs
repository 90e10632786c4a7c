//! # ResDesk Common Library
//!
//! Shared code for the ResDesk research-assistant service:
//! - Domain model (Article, Workspace, taxonomy types)
//! - Event types (ResdeskEvent enum) and the EventBus
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
