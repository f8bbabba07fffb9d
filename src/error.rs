//! Error taxonomy
//!
//! Mirrors the layered error style used for `FsError` in the teacher repo:
//! one `thiserror` enum per domain, a top-level enum that `#[from]`-wires
//! them together, plus an escape hatch for arbitrary action failures.

use std::fmt;

use thiserror::Error;

use crate::pipeline::Timing;

/// Errors raised while tokens are being matched against the command tree.
#[derive(Error, Debug, Clone)]
pub enum UsageError {
    #[error("unknown flag: --{name}")]
    UnknownLongFlag { name: String },

    #[error("unknown flag: -{name}")]
    UnknownShortFlag { name: char },

    #[error("flag --{name} requires a value")]
    MissingValue { name: String },

    #[error("unexpected argument: {token}")]
    UnexpectedPositional { token: String },

    #[error("flag --{name} cannot appear after positional arguments were given")]
    FlagAfterArgs { name: String },

    #[error("flag -{name} cannot be used as a positional in this context")]
    FlagCannotBeUsedAsArg { name: char },

    #[error("-{name}=VALUE is only accepted for flags declared with a long name")]
    ShortEqualsMisuse { name: char },

    #[error("{name} takes no value; use --{name} or --no-{name}")]
    UnexpectedValueForBoolean { name: String },
}

/// Errors raised while the option/value model validates or coerces text.
#[derive(Error, Debug, Clone)]
pub enum ValueError {
    #[error("invalid value {text:?} for {name}: {reason}")]
    Coercion {
        name: String,
        text: String,
        reason: String,
    },

    #[error("{name} requires key=value pairs, got {text:?}")]
    MalformedPair { name: String, text: String },
}

/// Errors raised by validation that runs after parsing (required options,
/// arg-counter shortfalls, transform rejections).
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("required option {name} was not provided")]
    RequiredMissing { name: String },

    #[error("{name}: path does not exist")]
    MustExist { name: String },

    #[error("{name}: expected {expected} more argument(s)")]
    ArgCounterShortfall { name: String, expected: usize },

    #[error("{name}: {reason}")]
    TransformRejected { name: String, reason: String },
}

/// Programmer/configuration errors: duplicate names, bad identifiers,
/// timing misuse. Carries the context path the same way the teacher's
/// control-flow errors carry accumulated stdout/stderr.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("{path}: duplicate name {name:?}")]
    DuplicateName { path: String, name: String },

    #[error("{name:?} is not a valid flag/arg identifier")]
    InvalidIdentifier { name: String },

    #[error("{path}: unregistered value type {type_name:?}")]
    UnregisteredValueType { path: String, type_name: String },

    #[error("{path} at {timing:?}: timing already past, cannot schedule for {requested:?}")]
    TimingTooLate {
        path: String,
        timing: Timing,
        requested: Timing,
    },

    #[error("{path}: implicit value already set")]
    ImplicitValueAlreadySet { path: String },

    #[error("{path}: SetValue is only meaningful on a flag or arg context")]
    NotAValueTarget { path: String },
}

/// The unified error surface returned by `Context` methods and `App::run`.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Arbitrary failure returned from user action code.
    #[error("{0}")]
    Action(Box<dyn std::error::Error + Send + Sync>),

    /// `Exit(code)` performs an orderly return with the encoded code,
    /// without it being treated as failure.
    #[error("exit({0})")]
    Exit(i32),

    /// `SkipCommand` aborts the Action phase without error.
    #[error("skip command")]
    SkipCommand,
}

impl CliError {
    pub fn action(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CliError::Action(Box::new(err))
    }

    /// Exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Exit(code) => *code,
            CliError::SkipCommand => 0,
            _ => 1,
        }
    }

    pub fn is_skip_command(&self) -> bool {
        matches!(self, CliError::SkipCommand)
    }
}

/// `InternalError` wraps a `ConfigError` with the context path/timing it
/// occurred at, as described in spec §7 item 3.
#[derive(Debug, Clone)]
pub struct InternalError {
    pub path: String,
    pub source: ConfigError,
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error at {}: {}", self.path, self.source)
    }
}

impl std::error::Error for InternalError {}

pub type Result<T> = std::result::Result<T, CliError>;
