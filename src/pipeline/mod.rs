//! Lifecycle pipeline engine: timing phases, bubble/tunnel
//! traversal, the normalized action surface, and the context addressable
//! during traversal.

pub mod action;
pub mod builtins;
pub mod context;
pub mod engine;
pub mod fs;
pub mod slots;
pub mod synopsis;
pub mod timing;

pub use action::{Action, ActionPipeline, CommandNotFoundFn};
pub use context::{CancellationToken, Context, Io, Target};
pub use slots::PipelineSlots;
pub use timing::Timing;
