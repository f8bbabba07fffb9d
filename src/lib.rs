//! cliforge - a declarative command-tree CLI engine
//!
//! Declare a tree of commands, flags, and positional args, attach actions
//! at four lifecycle timings (Initialize, Before, Action, After), and hand
//! `App` your argv. Parsing, dependency-ordered dispatch, and tree
//! mutation during Initialize are all handled by `pipeline`/`parser`; this
//! crate supplies the value model, the option/arg-counter layer, and the
//! command tree they sit on.

pub mod app;
pub mod argcount;
pub mod command;
pub mod diagnostics;
pub mod error;
pub mod option;
pub mod parser;
pub mod pipeline;
pub mod value;

pub use app::{App, ExitOutcome};
pub use command::{ArgSlot, CommandNode, CommandTree, FlagSlot, NodeId};
pub use error::{CliError, Result};
pub use pipeline::{Action, CancellationToken, Context, Io, Target, Timing};
pub use value::Value;
