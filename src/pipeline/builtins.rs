//! Built-in actions, grouped by concern the way the spec lists
//! them. Every function here returns a plain `Action`: a value, not a
//! trait object dispatched on at declaration time, so attaching one to a
//! flag/arg/command is just `.pipeline.push(Timing::Initial, builtins::required())`
//! (or the equivalent builder call) like any other action.
//!
//! Tree-shape mutations (`AddFlag`, `RemoveAlias`, `Named`, ...) go through
//! `Context::queue_mutation` rather than mutating the arena directly —
//! the same apply-queue discipline `engine::run_initialize` drains to a
//! fix point.

use std::path::PathBuf;

use crate::command::{ArgSlot, FlagSlot, MetaValue, PathPattern};
use crate::error::{CliError, ValidationError};
use crate::option::TransformFn;

use super::action::Action;
use super::context::{Context, Target};
use super::timing::Timing;

fn own_name(ctx: &Context<'_>) -> String {
    match ctx.target {
        Target::Command(id) => ctx.tree.node(id).name.clone(),
        Target::Flag(id, idx) => ctx.tree.node(id).flags[idx].name.clone(),
        Target::Arg(id, idx) => ctx.tree.node(id).args[idx].name.clone(),
    }
}

// ---------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------

pub fn data(key: impl Into<String>, value: impl Into<MetaValue>) -> Action {
    let (key, value) = (key.into(), value.into());
    Action::infallible(move |ctx| ctx.set_data(key.clone(), value.clone()))
}

/// `Category(name)`: mutates `CommandNode::category` directly when
/// attached to a command; for a flag/arg (which carry no dedicated
/// category field) it falls back to the metadata bag under `"category"`.
pub fn category(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        if let Target::Command(id) = ctx.target {
            let name = name.clone();
            ctx.queue_mutation(move |tree| {
                tree.node_mut(id).category = name;
                Ok(())
            });
        } else {
            ctx.set_data("category", name.clone());
        }
        Ok(())
    })
}

pub fn help_text(text: impl Into<String>) -> Action {
    data("help_text", text.into())
}

pub fn usage_text(text: impl Into<String>) -> Action {
    data("usage_text", text.into())
}

pub fn manual_text(text: impl Into<String>) -> Action {
    data("manual_text", text.into())
}

pub fn description(value: MetaValue) -> Action {
    data("description", value)
}

/// `Alias(name...)`: extends the target's alias list. Commands and flags
/// carry an alias list; args don't, so
/// this is a no-op there.
pub fn alias(names: impl IntoIterator<Item = String>) -> Action {
    let names: Vec<String> = names.into_iter().collect();
    Action::new(move |ctx| {
        let names = names.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).aliases.extend(names),
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].aliases.extend(names),
                Target::Arg(_, _) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

/// `Named(name)`: renames the target. Pattern matching for hooks is
/// evaluated against live tree state at traversal time rather than a
/// cached index (see DESIGN.md), so a rename here is immediately visible
/// to hooks without a separate "reinitialize the descendant-hook scan"
/// step.
pub fn named(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        let name = name.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).name = name,
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].name = name,
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].name = name,
            }
            Ok(())
        });
        Ok(())
    })
}

pub fn set_completion(kind: &'static str) -> Action {
    data("completion_kind", kind.to_string())
}

// ---------------------------------------------------------------------
// Value control
// ---------------------------------------------------------------------

/// `SetValue(v)`: see `Context::set_value`, which is where the
/// implicit-value discipline actually lives.
pub fn set_value<T: 'static + Clone + Send + Sync>(value: T) -> Action {
    Action::new(move |ctx| ctx.set_value(value.clone()))
}

pub fn set_data(key: impl Into<String>, value: impl Into<MetaValue>) -> Action {
    data(key, value)
}

pub fn transform(f: TransformFn) -> Action {
    Action::new(move |ctx| {
        let f = f.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].transform = Some(f),
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].transform = Some(f),
                Target::Command(_) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

/// `Implies(dep, value)`: queues an assignment on a sibling flag of the
/// same command, text-coerced the same way argv binding would, and marks
/// it as implied so its Action runs even though it was never `Seen()`
///.
pub fn implies(flag_name: impl Into<String>, value: impl Into<String>) -> Action {
    let (flag_name, value) = (flag_name.into(), value.into());
    Action::new(move |ctx| {
        let node = ctx.command_node();
        if let Some(flag) = node.flags.iter().find(|f| f.name == flag_name) {
            let text = crate::parser::apply_transform(flag, value.clone());
            flag.value.borrow_mut().set(&text, crate::parser::set_opts(flag))?;
            let mut state = flag.state.borrow_mut();
            state.internal.seen_implied = true;
            state.trigger();
        }
        Ok(())
    })
}

pub fn optional_value(default: impl Into<String>) -> Action {
    let default = default.into();
    Action::new(move |ctx| {
        let default = default.clone();
        if let Target::Flag(id, idx) = ctx.target {
            ctx.queue_mutation(move |tree| {
                tree.node_mut(id).flags[idx].optional_default = Some(default);
                Ok(())
            });
        }
        Ok(())
    })
}

/// Shorthand for `OptionalValue("")` — a bare flag accepts being present
/// with no explicit value at all.
pub fn optional() -> Action {
    optional_value(String::new())
}

/// `NoArgs`: asserts the command takes no positionals. Declared args are
/// left alone (a command may legitimately declare none); this only fires
/// if one somehow got bound, which only happens if a caller attaches
/// `NoArgs` to a command that also declares args — a configuration
/// mistake this surfaces rather than silently allows.
pub fn no_args() -> Action {
    Action::new(|ctx| {
        for arg in &ctx.command_node().args {
            if arg.state.borrow().seen() {
                return Err(crate::error::UsageError::UnexpectedPositional {
                    token: arg.value.borrow().string(),
                }
                .into());
            }
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------
// Visibility / lifecycle
// ---------------------------------------------------------------------

pub fn hidden() -> Action {
    Action::new(|ctx| {
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).options.hidden = true,
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].options.hidden = true,
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].options.hidden = true,
            }
            Ok(())
        });
        Ok(())
    })
}

pub fn visible() -> Action {
    Action::new(|ctx| {
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).options.visible = true,
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].options.visible = true,
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].options.visible = true,
            }
            Ok(())
        });
        Ok(())
    })
}

pub fn disable_auto_visibility() -> Action {
    Action::new(|ctx| {
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).options.disable_auto_visibility = true,
                Target::Flag(id, idx) => {
                    tree.node_mut(id).flags[idx].options.disable_auto_visibility = true
                }
                Target::Arg(id, idx) => {
                    tree.node_mut(id).args[idx].options.disable_auto_visibility = true
                }
            }
            Ok(())
        });
        Ok(())
    })
}

/// `Exits`: only meaningful on a flag. After the flag's own Action runs successfully, the run exits 0.
pub fn exits() -> Action {
    Action::new(|ctx| {
        if let Target::Flag(id, idx) = ctx.target {
            ctx.queue_mutation(move |tree| {
                tree.node_mut(id).flags[idx].options.exits = true;
                Ok(())
            });
        }
        Ok(())
    })
}

pub fn required() -> Action {
    Action::new(|ctx| {
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].options.required = true,
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].options.required = true,
                Target::Command(_) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

/// `MustExist`: a Before-time validation that the bound text names a path
/// that exists in the injected `Fs`. No-op until the option has a value.
pub fn must_exist() -> Action {
    Action::new(|ctx| {
        let Some(text) = ctx.value_string() else {
            return Ok(());
        };
        if text.is_empty() || ctx.io.fs.exists(&text) {
            return Ok(());
        }
        Err(ValidationError::MustExist { name: own_name(ctx) }.into())
    })
}

/// `WorkingDirectory`: marks the target's metadata bag so downstream
/// actions can recognize which flag governs the command's working
/// directory. The actual `chdir` is left to application code (the core
/// doesn't own process-global cwd state outside of what actions choose to
/// do with `ctx.io.fs`).
pub fn working_directory() -> Action {
    data("is_working_directory", "true")
}

// ---------------------------------------------------------------------
// Tree mutation (Initialize only)
// ---------------------------------------------------------------------

pub fn add_flag<F>(build: F) -> Action
where
    F: Fn() -> FlagSlot + Send + Sync + 'static,
{
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let slot = build();
        ctx.queue_mutation(move |tree| tree.add_flag(node, slot));
        Ok(())
    })
}

pub fn add_arg<F>(build: F) -> Action
where
    F: Fn() -> ArgSlot + Send + Sync + 'static,
{
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let slot = build();
        ctx.queue_mutation(move |tree| tree.add_arg(node, slot));
        Ok(())
    })
}

pub fn add_command(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let name = name.clone();
        ctx.queue_mutation(move |tree| tree.add_command(node, name).map(|_| ()));
        Ok(())
    })
}

pub fn remove_flag(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let name = name.clone();
        ctx.queue_mutation(move |tree| {
            tree.remove_flag(node, &name);
            Ok(())
        });
        Ok(())
    })
}

pub fn remove_arg(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let name = name.clone();
        ctx.queue_mutation(move |tree| {
            tree.remove_arg(node, &name);
            Ok(())
        });
        Ok(())
    })
}

pub fn remove_command(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::new(move |ctx| {
        let node = ctx.target.command_node();
        let name = name.clone();
        ctx.queue_mutation(move |tree| {
            tree.remove_command(node, &name);
            Ok(())
        });
        Ok(())
    })
}

pub fn remove_alias(alias: impl Into<String>) -> Action {
    let alias = alias.into();
    Action::new(move |ctx| {
        let alias = alias.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Command(id) => tree.node_mut(id).aliases.retain(|a| a != &alias),
                Target::Flag(id, idx) => {
                    tree.node_mut(id).flags[idx].aliases.retain(|a| a != &alias)
                }
                Target::Arg(_, _) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

// ---------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------

pub fn hook_before(pattern: impl AsRef<str>, action: Action) -> Action {
    let pattern = PathPattern::parse(pattern.as_ref());
    Action::new(move |ctx| {
        ctx.hook_before(pattern.clone(), action.clone());
        Ok(())
    })
}

pub fn hook_after(pattern: impl AsRef<str>, action: Action) -> Action {
    let pattern = PathPattern::parse(pattern.as_ref());
    Action::new(move |ctx| {
        ctx.hook_after(pattern.clone(), action.clone());
        Ok(())
    })
}

/// General form: schedules `action` to run at `timing` for this context.
pub fn at(timing: Timing, action: Action) -> Action {
    Action::new(move |ctx| ctx.schedule(timing, action.clone()))
}

pub fn hook(timing: Timing, action: Action) -> Action {
    at(timing, action)
}

pub fn before(action: Action) -> Action {
    at(Timing::Before, action)
}

pub fn after(action: Action) -> Action {
    at(Timing::After, action)
}

pub fn use_action(action: Action) -> Action {
    at(Timing::Initial, action)
}

/// `IfMatch(filter, action)`: `action` only runs when `filter` accepts the
/// running context.
pub fn if_match<F>(filter: F, action: Action) -> Action
where
    F: Fn(&Context<'_>) -> bool + Send + Sync + 'static,
{
    Action::new(move |ctx| {
        if filter(ctx) {
            action.call(ctx)
        } else {
            Ok(())
        }
    })
}

/// `Customize(pattern, action)`: registers `action` to run at Initialize
/// for every descendant context whose path matches `pattern`, the
/// Initialize-phase counterpart of `HookBefore`/`HookAfter`.
pub fn customize(pattern: impl AsRef<str>, action: Action) -> Action {
    let pattern = PathPattern::parse(pattern.as_ref());
    Action::new(move |ctx| {
        ctx.hook_initial(pattern.clone(), action.clone());
        Ok(())
    })
}

// ---------------------------------------------------------------------
// Env / file sourcing
// ---------------------------------------------------------------------

/// `FromEnv(vars...)`: declares the env vars consulted during this
/// option's own Before. The actual consultation happens
/// in `engine::apply_flag_sources`/`apply_arg_sources`; this just extends
/// the declared list, so calling it more than once accumulates rather
/// than replaces.
pub fn from_env(vars: impl IntoIterator<Item = String>) -> Action {
    let vars: Vec<String> = vars.into_iter().collect();
    Action::new(move |ctx| {
        let vars = vars.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].env_vars.extend(vars),
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].env_vars.extend(vars),
                Target::Command(_) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

/// `FromFilePath(path)`: consulted when every `FromEnv` source was empty.
pub fn from_file_path(path: impl Into<PathBuf>) -> Action {
    let path = path.into();
    Action::new(move |ctx| {
        let path = path.clone();
        let target = ctx.target;
        ctx.queue_mutation(move |tree| {
            match target {
                Target::Flag(id, idx) => tree.node_mut(id).flags[idx].file_source = Some(path),
                Target::Arg(id, idx) => tree.node_mut(id).args[idx].file_source = Some(path),
                Target::Command(_) => {}
            }
            Ok(())
        });
        Ok(())
    })
}

// ---------------------------------------------------------------------
// Signals / exit
// ---------------------------------------------------------------------

/// `HandleSignal(sigs...)`: installs a signal → cancellation bridge (spec
/// §5) via `signal_hook::flag::register`, the same one-line pattern the
/// `signal-hook` crate's own docs show for a graceful-shutdown flag.
pub fn handle_signal(sigs: impl IntoIterator<Item = i32>) -> Action {
    let sigs: Vec<i32> = sigs.into_iter().collect();
    Action::new(move |ctx| {
        let flag = ctx.cancel.as_flag();
        for &sig in &sigs {
            signal_hook::flag::register(sig, flag.clone()).map_err(CliError::action)?;
        }
        Ok(())
    })
}

pub fn exit(code: i32) -> Action {
    Action::new(move |_ctx| Err(CliError::Exit(code)))
}

/// `SkipCommand`: attached to a command's, flag's, or arg's
/// Before, this aborts only the Action phase — After still runs normally
/// (see `engine::execute_path`).
pub fn skip_command() -> Action {
    Action::new(|_ctx| Err(CliError::SkipCommand))
}

/// `Assert(cond, msg)`: a cheap declarative guard, the same failure shape
/// a `Transform` rejection uses.
pub fn assert(cond: bool, msg: impl Into<String>) -> Action {
    let msg = msg.into();
    Action::new(move |ctx| {
        if cond {
            Ok(())
        } else {
            Err(ValidationError::TransformRejected {
                name: own_name(ctx),
                reason: msg.clone(),
            }
            .into())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandTree, FlagSlot};
    use crate::pipeline::engine::run_initialize;
    use crate::pipeline::{CancellationToken, Io};
    use crate::value::builtins::BoolValue;

    fn io_cancel() -> (Io, CancellationToken) {
        (Io::real(), CancellationToken::new())
    }

    #[test]
    fn add_flag_during_initialize_is_itself_initialized() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.node_mut(root).pipeline.push(
            Timing::Initial,
            add_flag(|| FlagSlot::new("late", Box::new(BoolValue::default()))),
        );
        let (io, cancel) = io_cancel();
        run_initialize(&mut tree, &io, &cancel).unwrap();
        assert_eq!(tree.node(root).flags.len(), 1);
        assert_eq!(tree.node(root).flags[0].name, "late");
    }

    #[test]
    fn named_renames_live_for_pattern_matching() {
        let mut tree = CommandTree::new("app");
        let root = tree.root_id();
        tree.node_mut(root).pipeline.push(Timing::Initial, named("renamed"));
        let (io, cancel) = io_cancel();
        run_initialize(&mut tree, &io, &cancel).unwrap();
        assert_eq!(tree.node(root).name, "renamed");
    }
}
