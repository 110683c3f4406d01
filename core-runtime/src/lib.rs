//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the audio fallback crates:
//! - Logging and tracing setup (`tracing-subscriber`, host `LoggerSink` bridging)
//! - Runtime error types

pub mod error;
pub mod logging;

pub use error::{Error, Result};
