//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the audio
//! fallback core.
//!
//! ## Traits
//!
//! - [`PlaybackSurface`](playback::PlaybackSurface) - the native media element:
//!   acquires/releases playable resources, loads them, stops playback
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! On native targets bridges must be `Send + Sync` so they can sit behind an
//! `Arc`. On `wasm32` the bound is dropped (see [`platform`]).

pub mod error;
pub mod logging;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use platform::PlatformSendSync;
pub use playback::{PlaybackSurface, ResourceUrl};
