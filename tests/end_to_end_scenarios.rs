//! Whole-pipeline integration scenarios exercising `App`/`CommandTree`
//! through the public surface rather than any one module in isolation.

use std::sync::{Arc, Mutex};

use cliforge::command::{ArgSlot, FlagSlot};
use cliforge::pipeline::{builtins, fs::RealFs, Action, CancellationToken, Context, Io, Target, Timing};
use cliforge::value::builtins::{BoolValue, StringListValue, StringValue};
use cliforge::value::dereference;
use cliforge::{App, ExitOutcome};

fn sink_io() -> (Io, CancellationToken) {
    (
        Io::new(std::io::sink(), std::io::sink(), std::io::empty(), Arc::new(RealFs)),
        CancellationToken::new(),
    )
}

/// Scenario 1: a negatable boolean flag defaults to `true` when present
/// bare, and its synopsis mirrors the negation form.
#[test]
fn boolean_flag_sets_true_and_synopsis_shows_negation_mirror() {
    let mut app = App::new("app");
    let root = app.root_id();
    app.tree_mut()
        .add_flag(root, FlagSlot::new("flag", Box::new(BoolValue::default())).alias("f").negatable())
        .unwrap();

    let rendered = cliforge::pipeline::synopsis::render(app.tree(), root);
    assert!(rendered.contains("--[no-]flag"), "rendered synopsis was: {rendered}");

    let (io, cancel) = sink_io();
    let outcome = app.run_with_io(vec!["--flag".to_string()], io, cancel);
    assert_eq!(outcome, ExitOutcome::Success);
}

/// Scenario 2: `--no-flag` sets the value false and still runs the primary
/// flag's Action, observing its own name as `"flag"` (not `"no-flag"`).
#[test]
fn negated_flag_sets_false_and_fires_primary_action_under_its_own_name() {
    let mut app = App::new("app");
    let root = app.root_id();
    let observed_name: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    {
        let observed_name = observed_name.clone();
        app.tree_mut()
            .add_flag(
                root,
                FlagSlot::new("flag", Box::new(BoolValue::default())).negatable(),
            )
            .unwrap();
        app.tree_mut().node_mut(root).flags[0].pipeline.push(
            Timing::Action,
            Action::infallible(move |ctx| {
                if let Target::Flag(id, idx) = ctx.target {
                    *observed_name.lock().unwrap() = Some(ctx.tree.node(id).flags[idx].name.clone());
                }
            }),
        );
    }

    let (io, cancel) = sink_io();
    let outcome = app.run_with_io(vec!["--no-flag".to_string()], io, cancel);
    assert_eq!(outcome, ExitOutcome::Success);
    assert_eq!(*observed_name.lock().unwrap(), Some("flag".to_string()));
}

/// Scenario 3: a comma inside a positional token is not a command
/// boundary — `t,a,b` binds whole to `t`, unaffected by the following `u`.
#[test]
fn positional_comma_survives_the_command_boundary() {
    let mut app = App::new("app");
    let root = app.root_id();
    let sub = app.tree_mut().add_command(root, "sub").unwrap();
    app.tree_mut()
        .add_arg(sub, ArgSlot::new("t", Box::new(StringValue::default()), 1))
        .unwrap();
    app.tree_mut()
        .add_arg(sub, ArgSlot::new("u", Box::new(StringValue::default()), 1))
        .unwrap();

    let t_value: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let u_value: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    {
        let t_value = t_value.clone();
        let u_value = u_value.clone();
        app.tree_mut().node_mut(sub).pipeline.push(
            Timing::Action,
            Action::infallible(move |ctx| {
                let node = ctx.tree.node(ctx.target.command_node());
                *t_value.lock().unwrap() = node.args[0].value.borrow().string();
                *u_value.lock().unwrap() = node.args[1].value.borrow().string();
            }),
        );
    }

    let (io, cancel) = sink_io();
    let outcome = app.run_with_io(
        vec!["sub".to_string(), "t,a,b".to_string(), "u".to_string()],
        io,
        cancel,
    );
    assert_eq!(outcome, ExitOutcome::Success);
    assert_eq!(*t_value.lock().unwrap(), "t,a,b");
    assert_eq!(*u_value.lock().unwrap(), "u");
}

/// Scenario 4: an unmatched top-level token falls through
/// `HandleCommandNotFound`, which redirects to a fixed subcommand. The
/// redirect reinterprets the failing token as that subcommand's own first
/// token, and the Action sees the fully reconstructed argv.
#[test]
fn command_not_found_redirect_reconstructs_argv_for_the_target_command() {
    let mut app = App::new("app");
    let root = app.root_id();
    let exec = app.tree_mut().add_command(root, "exec").unwrap();
    app.tree_mut()
        .add_arg(exec, ArgSlot::new("cmd", Box::new(StringValue::default()), 1))
        .unwrap();
    app.tree_mut()
        .add_arg(exec, ArgSlot::new("args", Box::new(StringListValue::default()), -2))
        .unwrap();
    app.tree_mut()
        .add_flag(exec, FlagSlot::new("f", Box::new(BoolValue::default())))
        .unwrap();

    let not_found: cliforge::pipeline::CommandNotFoundFn =
        Arc::new(|_ctx: &mut Context<'_>, _candidate: &str| Ok(Some("exec".to_string())));
    app.tree_mut().node_mut(root).command_not_found = Some(not_found);

    let seen_argv: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_cmd: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let seen_args: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_flag: Arc<Mutex<bool>> = Arc::new(Mutex::new(false));
    {
        let seen_argv = seen_argv.clone();
        let seen_cmd = seen_cmd.clone();
        let seen_args = seen_args.clone();
        let seen_flag = seen_flag.clone();
        app.tree_mut().node_mut(exec).pipeline.push(
            Timing::Action,
            Action::infallible(move |ctx| {
                *seen_argv.lock().unwrap() = ctx.argv.clone();
                let node = ctx.tree.node(ctx.target.command_node());
                *seen_cmd.lock().unwrap() = node.args[0].value.borrow().string();
                *seen_args.lock().unwrap() =
                    dereference(&**node.args[1].value.borrow()).unwrap_or_default();
                *seen_flag.lock().unwrap() = node.flags[0].value.borrow().string() == "true";
            }),
        );
    }

    let (io, cancel) = sink_io();
    let outcome = app.run_with_io(
        vec!["tail".to_string(), "/var/output/logs".to_string(), "-f".to_string()],
        io,
        cancel,
    );
    assert_eq!(outcome, ExitOutcome::Success);
    assert_eq!(
        *seen_argv.lock().unwrap(),
        vec!["exec", "tail", "/var/output/logs", "-f"]
    );
    assert_eq!(*seen_cmd.lock().unwrap(), "tail");
    assert_eq!(*seen_args.lock().unwrap(), vec!["/var/output/logs".to_string()]);
    assert!(*seen_flag.lock().unwrap());
}

/// Scenario 5: bubble-Before / leaf-Action / tunnel-After ordering for a
/// three-level path, with a root-level `HookBefore`/`HookAfter` matching
/// every command (`*`).
#[test]
fn hook_order_follows_bubble_then_tunnel_discipline() {
    use pretty_assertions::assert_eq;

    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new("app");
    let root = app.root_id();

    let push = |log: Arc<Mutex<Vec<String>>>, label: &'static str| {
        Action::infallible(move |_ctx| log.lock().unwrap().push(label.to_string()))
    };

    app.tree_mut().node_mut(root).pipeline.push(Timing::Before, push(log.clone(), "before app"));
    app.tree_mut().node_mut(root).pipeline.push(Timing::After, push(log.clone(), "after app"));
    app.tree_mut().node_mut(root).pipeline.push(
        Timing::Initial,
        builtins::hook_before("*", push(log.clone(), "app hook before")),
    );
    app.tree_mut().node_mut(root).pipeline.push(
        Timing::Initial,
        builtins::hook_after("*", push(log.clone(), "app hook after")),
    );

    let sub = app.tree_mut().add_command(root, "sub").unwrap();
    app.tree_mut().node_mut(sub).pipeline.push(Timing::Before, push(log.clone(), "before sub"));
    app.tree_mut().node_mut(sub).pipeline.push(Timing::After, push(log.clone(), "after sub"));

    let dom = app.tree_mut().add_command(sub, "dom").unwrap();
    app.tree_mut().node_mut(dom).pipeline.push(Timing::Before, push(log.clone(), "before dom"));
    app.tree_mut().node_mut(dom).pipeline.push(Timing::Action, push(log.clone(), "dom"));
    app.tree_mut().node_mut(dom).pipeline.push(Timing::After, push(log.clone(), "after dom"));

    let (io, cancel) = sink_io();
    let outcome = app.run_with_io(vec!["sub".to_string(), "dom".to_string()], io, cancel);
    assert_eq!(outcome, ExitOutcome::Success);

    assert_eq!(
        log.lock().unwrap().clone(),
        vec![
            "before app",
            "before sub",
            "before dom",
            "app hook before",
            "dom",
            "after dom",
            "after sub",
            "app hook after",
            "after app",
        ]
    );
}

/// Scenario 6: a persistent flag declared on an ancestor runs its Before
/// ahead of a descendant's own local flag, regardless of the order the two
/// flags appeared on the command line.
#[test]
fn ancestor_persistent_flag_before_precedes_descendant_local_flag_before() {
    use pretty_assertions::assert_eq;

    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new("app");
    let root = app.root_id();

    app.tree_mut()
        .add_flag(root, FlagSlot::new("global", Box::new(BoolValue::default())))
        .unwrap();
    {
        let log = log.clone();
        app.tree_mut().node_mut(root).flags[0].pipeline.push(
            Timing::Before,
            Action::infallible(move |_ctx| log.lock().unwrap().push("before --global".to_string())),
        );
    }

    let sub = app.tree_mut().add_command(root, "sub").unwrap();
    app.tree_mut()
        .add_flag(sub, FlagSlot::new("local", Box::new(BoolValue::default())))
        .unwrap();
    {
        let log = log.clone();
        app.tree_mut().node_mut(sub).flags[0].pipeline.push(
            Timing::Before,
            Action::infallible(move |_ctx| log.lock().unwrap().push("before --local".to_string())),
        );
    }

    let (io, cancel) = sink_io();
    // `--local` appears on the command line before `--global`; the
    // execution order must still favor the ancestor's flag.
    let outcome = app.run_with_io(
        vec!["sub".to_string(), "--local".to_string(), "--global".to_string()],
        io,
        cancel,
    );
    assert_eq!(outcome, ExitOutcome::Success);
    assert_eq!(log.lock().unwrap().clone(), vec!["before --global", "before --local"]);
}
