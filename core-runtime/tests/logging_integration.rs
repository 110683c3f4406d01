//! Integration tests for logging configuration

use bridge_traits::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::Arc;

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("core_playback=debug")
        .with_spans(false)
        .with_target(false)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.filter.as_deref(), Some("core_playback=debug"));
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.logger_sink.is_some());
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_debug_output_hides_sink() {
    let config = LoggingConfig::default().with_logger_sink(Arc::new(ConsoleLogger::default()));
    let rendered = format!("{:?}", config);
    assert!(rendered.contains("logger_sink: true"));
}

// Only one global subscriber per test binary, so both calls live in one test.
#[test]
fn test_second_initialization_is_rejected() {
    let first = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));
    assert!(first.is_ok());

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::AlreadyInitialized(_))));
}

#[test]
fn test_invalid_filter_fails_before_install() {
    let result = init_logging(LoggingConfig::default().with_filter("core_playback=loud"));
    assert!(matches!(result, Err(Error::Config(_))));
}
