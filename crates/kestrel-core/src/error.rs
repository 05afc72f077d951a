//! Error types for Kestrel core.
//!
//! Most graph and signal operations degrade to no-ops on stale ids instead of
//! failing; the errors here cover the calls that hand back a value or need a
//! live, attached object to do anything at all.

use thiserror::Error;

use crate::object::ObjectId;

/// The main error type for Kestrel core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The object id is invalid or the object has been destroyed.
    #[error("invalid or destroyed object {0:?}")]
    InvalidObject(ObjectId),

    /// The object is being torn down and cannot take new children.
    #[error("object {0:?} is being destroyed")]
    ObjectDestroying(ObjectId),

    /// The object's handler is currently running and cannot be borrowed again.
    #[error("object {0:?} is busy handling another call")]
    ObjectBusy(ObjectId),

    /// A typed access named the wrong concrete type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Attempted to set an object as its own parent or ancestor.
    #[error("cannot set an object as its own parent or ancestor")]
    CircularParentage,

    /// The object is not attached to an event queue.
    #[error("object {0:?} is not attached to an event queue")]
    NoEventQueue(ObjectId),

    /// Timer-related error.
    #[error("timer error: {0}")]
    Timer(#[from] TimerError),

    /// Native platform error.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Timer-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer id is invalid or the timer has already been removed.
    #[error("invalid or expired timer id")]
    InvalidTimer,
}

/// Errors reported by a native platform layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// No display connection could be opened.
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),

    /// The native window could not be created.
    #[error("failed to create window: {0}")]
    WindowCreation(String),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for Kestrel core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
