//! # mcsync Common Library
//!
//! Shared code for the music collection sync engine:
//! - Error type
//! - TOML configuration model and resolution
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
