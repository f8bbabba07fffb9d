//! Sample program wiring the library end to end: a two-level command tree
//! with a persistent flag, a non-persistent one, an `Implies` dependency, a
//! variadic positional, and a couple of pattern-matched hooks.
//!
//! Run it a few different ways to see the pieces interact:
//!
//!   cliforge-demo greet Ada
//!   cliforge-demo --global greet --loud Ada hello world
//!   cliforge-demo greet formal Ada
//!   RUST_LOG=debug cliforge-demo greet Ada

use std::process::ExitCode;

use cliforge::command::{ArgSlot, FlagSlot};
use cliforge::pipeline::{builtins, Action, Timing};
use cliforge::value::builtins::{BoolValue, I32Value, StringListValue, StringValue};
use cliforge::App;

fn main() -> ExitCode {
    cliforge::diagnostics::init_tracing();

    let mut app = App::new("app");
    let root = app.root_id();

    // A persistent flag: visible to every descendant command unless a
    // descendant redeclares it or marks its own copy `NonPersistent`.
    app.tree_mut()
        .add_flag(root, FlagSlot::new("global", Box::new(BoolValue::default())).negatable())
        .unwrap();

    // Logged once per invocation from `HookBefore`/`HookAfter` registered on
    // the root against `*` — matches every command at any depth.
    app.tree_mut().node_mut(root).pipeline.push(
        Timing::Initial,
        builtins::hook_before("*", Action::infallible(|ctx| {
            println!("-> entering `{}`", ctx.path_string());
        })),
    );
    app.tree_mut().node_mut(root).pipeline.push(
        Timing::Initial,
        builtins::hook_after("*", Action::infallible(|ctx| {
            println!("<- leaving `{}`", ctx.path_string());
        })),
    );

    // `Customize("*", ...)` mutates the tree for every descendant during
    // Initialize: every command in the tree (not the root itself, since the
    // pattern is matched against each node's own path) gets a hidden
    // `--traced` flag it never has to declare by hand.
    app.tree_mut().node_mut(root).pipeline.push(
        Timing::Initial,
        builtins::customize(
            "*",
            builtins::add_flag(|| FlagSlot::new("traced", Box::new(BoolValue::default())).hidden()),
        ),
    );

    let greet = app.tree_mut().add_command(root, "greet").unwrap();
    app.tree_mut()
        .add_flag(
            greet,
            FlagSlot::new("local", Box::new(BoolValue::default())).non_persistent(),
        )
        .unwrap();
    app.tree_mut()
        .add_flag(greet, FlagSlot::new("loud", Box::new(BoolValue::default())).negatable())
        .unwrap();
    app.tree_mut()
        .add_flag(greet, FlagSlot::new("volume", Box::new(I32Value::default())).alias("v"))
        .unwrap();

    // `Implies`: when `--loud` lands on true, `--volume` is set to 10 at
    // Before time even though nobody typed `--volume` on the command line.
    {
        let loud_idx = app.tree().node(greet).flags.iter().position(|f| f.name == "loud").unwrap();
        app.tree_mut().node_mut(greet).flags[loud_idx].pipeline.push(
            Timing::Before,
            builtins::if_match(
                |ctx| ctx.value_string().as_deref() == Some("true"),
                builtins::implies("volume", "10"),
            ),
        );
    }

    app.tree_mut()
        .add_arg(greet, ArgSlot::new("name", Box::new(StringValue::default()), 1).required())
        .unwrap();
    app.tree_mut()
        .add_arg(greet, ArgSlot::new("words", Box::new(StringListValue::default()), -1))
        .unwrap();

    app.tree_mut().node_mut(greet).pipeline.push(
        Timing::Action,
        Action::infallible(|ctx| {
            let node = ctx.tree.node(ctx.target.command_node());
            let flag = |n: &str| node.flags.iter().find(|f| f.name == n).unwrap();
            let arg = |n: &str| node.args.iter().find(|a| a.name == n).unwrap();
            let volume = cliforge::value::dereference::<i32>(&**flag("volume").value.borrow()).unwrap_or(0);
            let words: Vec<String> =
                cliforge::value::dereference(&**arg("words").value.borrow()).unwrap_or_default();
            let greeting = if words.is_empty() {
                "Hello".to_string()
            } else {
                words.join(" ")
            };
            let name = arg("name").value.borrow().string();
            if volume > 0 {
                println!("{}, {name}! (volume {volume})", greeting.to_uppercase());
            } else {
                println!("{greeting}, {name}!");
            }
        }),
    );

    // A nested subcommand: `--local` (declared `NonPersistent` above) is
    // not visible here, but `--global` still is.
    let formal = app.tree_mut().add_command(greet, "formal").unwrap();
    app.tree_mut()
        .add_arg(formal, ArgSlot::new("name", Box::new(StringValue::default()), 1).required())
        .unwrap();
    app.tree_mut().node_mut(formal).pipeline.push(
        Timing::Action,
        Action::infallible(|ctx| {
            let node = ctx.tree.node(ctx.target.command_node());
            println!("Good day, {}.", node.args[0].value.borrow().string());
        }),
    );

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let outcome = app.run(argv);
    ExitCode::from(outcome.code() as u8)
}
