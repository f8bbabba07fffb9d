//! Context: the addressable location during
//! traversal, carrying writers, the file-system abstraction, the
//! cancellation token, and lookup methods that walk to the root.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::command::{CommandNode, CommandTree, MetaValue, NodeId};
use crate::error::{CliError, ConfigError, Result};

use super::action::Action;
use super::timing::Timing;

/// Which node in the command tree this context addresses: the command
/// itself, or one of its flags/args by declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Command(NodeId),
    Flag(NodeId, usize),
    Arg(NodeId, usize),
}

impl Target {
    /// The command node that owns this target (itself, for `Command`).
    pub fn command_node(&self) -> NodeId {
        match self {
            Target::Command(id) => *id,
            Target::Flag(id, _) => *id,
            Target::Arg(id, _) => *id,
        }
    }
}

/// The writers/reader/filesystem bundle threaded through every context.
/// `Arc<Mutex<..>>` rather than plain references because actions are
/// `Send + Sync` closures that may be registered once and invoked from
/// different stack depths across the run.
#[derive(Clone)]
pub struct Io {
    pub stdout: Arc<Mutex<dyn Write + Send>>,
    pub stderr: Arc<Mutex<dyn Write + Send>>,
    pub stdin: Arc<Mutex<dyn Read + Send>>,
    pub fs: Arc<dyn super::fs::Fs>,
}

impl Io {
    pub fn new(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
        stdin: impl Read + Send + 'static,
        fs: Arc<dyn super::fs::Fs>,
    ) -> Self {
        Self {
            stdout: Arc::new(Mutex::new(stdout)),
            stderr: Arc::new(Mutex::new(stderr)),
            stdin: Arc::new(Mutex::new(stdin)),
            fs,
        }
    }

    /// Real stdout/stderr/stdin and the real filesystem — what `App::run`
    /// uses outside of tests.
    pub fn real() -> Self {
        Self::new(std::io::stdout(), std::io::stderr(), std::io::stdin(), Arc::new(super::fs::RealFs))
    }
}

/// An ambient, cooperative cancellation flag.
/// Actions are expected to poll `is_cancelled()` at I/O points; the engine
/// itself only checks it between parsed tokens.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, exposed so `HandleSignal` can hand it to
    /// `signal_hook::flag::register` directly instead of re-deriving a
    /// second atomic that the engine never observes.
    pub fn as_flag(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

/// A queued tree-structure edit, applied by the engine once no context
/// still borrows the tree. Only legal during
/// Initialize; queued as a closure so `AddFlag`/`AddCommand`/etc. can be
/// expressed without giving every mutation its own enum variant.
pub(crate) type Mutation = Box<dyn FnOnce(&mut CommandTree) -> std::result::Result<(), ConfigError>>;

pub(crate) type MutationQueue = Rc<RefCell<Vec<Mutation>>>;

pub(crate) fn new_mutation_queue() -> MutationQueue {
    Rc::new(RefCell::new(Vec::new()))
}

/// Owns one `MutationQueue` for a single `run_initialize` pass (or a
/// one-off context that has no meaningful use for queued edits). Each
/// `Context` created against it shares the same underlying `Vec` via
/// `queue()`; `drain()` collects everything accumulated once the pass
/// unwinds.
pub(crate) struct MutationQueueHandle(MutationQueue);

impl MutationQueueHandle {
    pub(crate) fn new() -> Self {
        Self(new_mutation_queue())
    }

    pub(crate) fn queue(&self) -> MutationQueue {
        self.0.clone()
    }

    pub(crate) fn drain(&self) -> Vec<Mutation> {
        self.0.borrow_mut().drain(..).collect()
    }
}

pub struct Context<'a> {
    pub timing: Timing,
    pub tree: &'a CommandTree,
    pub target: Target,
    pub io: Io,
    pub cancel: CancellationToken,
    /// The argv visible to the currently executing command.
    pub argv: Vec<String>,
    pub(crate) mutations: MutationQueue,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        timing: Timing,
        tree: &'a CommandTree,
        target: Target,
        io: Io,
        cancel: CancellationToken,
        argv: Vec<String>,
        mutations: MutationQueue,
    ) -> Self {
        Self {
            timing,
            tree,
            target,
            io,
            cancel,
            argv,
            mutations,
        }
    }

    pub fn command_node(&self) -> &'a CommandNode {
        self.tree.node(self.target.command_node())
    }

    pub fn path_names(&self) -> Vec<String> {
        self.tree.path_names(self.target.command_node())
    }

    pub fn path_string(&self) -> String {
        self.path_names().join(" ")
    }

    /// `Data`/key-value lookup: the target's own bag first,
    /// then each ancestor command's bag, read-through to the root.
    pub fn data(&self, key: &str) -> Option<MetaValue> {
        if let Some(v) = self.own_metadata(key) {
            return Some(v);
        }
        let mut cur = Some(self.target.command_node());
        loop {
            let id = cur?;
            let node = self.tree.node(id);
            if let Some(v) = node.metadata.borrow().get(key) {
                return Some(v.clone());
            }
            cur = node.parent;
        }
    }

    fn own_metadata(&self, key: &str) -> Option<MetaValue> {
        match self.target {
            Target::Command(id) => self.tree.node(id).metadata.borrow().get(key).cloned(),
            Target::Flag(id, idx) => self.tree.node(id).flags[idx].metadata.borrow().get(key).cloned(),
            Target::Arg(id, idx) => self.tree.node(id).args[idx].metadata.borrow().get(key).cloned(),
        }
    }

    /// `SetData`/`Data(k, v)`: writes into the target's own bag, not an
    /// ancestor's.
    pub fn set_data(&self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let (key, value) = (key.into(), value.into());
        match self.target {
            Target::Command(id) => {
                self.tree.node(id).metadata.borrow_mut().insert(key, value);
            }
            Target::Flag(id, idx) => {
                self.tree.node(id).flags[idx].metadata.borrow_mut().insert(key, value);
            }
            Target::Arg(id, idx) => {
                self.tree.node(id).args[idx].metadata.borrow_mut().insert(key, value);
            }
        }
    }

    /// Schedules `action` to run at `requested` timing: immediately if
    /// `requested` is the current phase, queued if it lies ahead,
    /// `ConfigError::TimingTooLate` if it has already passed.
    pub fn schedule(&mut self, requested: Timing, action: Action) -> Result<()> {
        use std::cmp::Ordering as CmpOrdering;
        match requested.cmp(&self.timing) {
            CmpOrdering::Less => Err(CliError::Config(ConfigError::TimingTooLate {
                path: self.path_string(),
                timing: self.timing,
                requested,
            })),
            CmpOrdering::Equal => action.call(self),
            CmpOrdering::Greater => {
                self.pipeline_slots().push(requested, action);
                Ok(())
            }
        }
    }

    fn pipeline_slots(&self) -> &'a super::slots::PipelineSlots {
        match self.target {
            Target::Command(id) => &self.tree.node(id).pipeline,
            Target::Flag(id, idx) => &self.tree.node(id).flags[idx].pipeline,
            Target::Arg(id, idx) => &self.tree.node(id).args[idx].pipeline,
        }
    }

    /// `c.Action(fn)` / `c.Before(fn)` / `c.After(fn)` / `c.Use(fn)` (spec
    /// §4.F): thin Context-method spellings of `schedule` at the matching
    /// timing, for actions that call them imperatively from inside a
    /// running pipeline rather than declaring them up front.
    pub fn action(&mut self, action: Action) -> Result<()> {
        self.schedule(Timing::Action, action)
    }

    pub fn before(&mut self, action: Action) -> Result<()> {
        self.schedule(Timing::Before, action)
    }

    pub fn after(&mut self, action: Action) -> Result<()> {
        self.schedule(Timing::After, action)
    }

    pub fn use_(&mut self, action: Action) -> Result<()> {
        self.schedule(Timing::Initial, action)
    }

    /// `HookBefore(pattern, action)`: registers a hook on
    /// this context's own target, matched against the leaf's path during
    /// the bubble traversal.
    pub fn hook_before(&self, pattern: crate::command::PathPattern, action: Action) {
        self.pipeline_slots().push_hook_before(pattern, action);
    }

    /// `HookAfter(pattern, action)`, matched during the tunnel traversal.
    pub fn hook_after(&self, pattern: crate::command::PathPattern, action: Action) {
        self.pipeline_slots().push_hook_after(pattern, action);
    }

    /// `Customize(pattern, action)`: matched during the Initialize tunnel
    /// traversal, before each matching descendant's own Initialize runs.
    pub fn hook_initial(&self, pattern: crate::command::PathPattern, action: Action) {
        self.pipeline_slots().push_hook_initial(pattern, action);
    }

    /// Current textual value of this context's own flag/arg target, used
    /// by `MustExist`/synopsis rendering. `None` for a `Command` target.
    pub fn value_string(&self) -> Option<String> {
        match self.target {
            Target::Command(_) => None,
            Target::Flag(id, idx) => Some(self.tree.node(id).flags[idx].value.borrow().string()),
            Target::Arg(id, idx) => Some(self.tree.node(id).args[idx].value.borrow().string()),
        }
    }

    /// `SetValue(v)`: assigns a native-typed value directly,
    /// respecting the implicit-value single-assignment discipline (spec
    /// invariant 5) when the target flag/arg declares it.
    pub fn set_value<T: 'static>(&self, value: T) -> Result<()> {
        match self.target {
            Target::Command(_) => Err(CliError::Config(ConfigError::NotAValueTarget {
                path: self.path_string(),
            })),
            Target::Flag(id, idx) => {
                let flag = &self.tree.node(id).flags[idx];
                if flag.options.implicit_value {
                    let mut state = flag.state.borrow_mut();
                    if state.implicit_assigned {
                        return Err(CliError::Config(ConfigError::ImplicitValueAlreadySet {
                            path: self.path_string(),
                        }));
                    }
                    state.implicit_assigned = true;
                }
                if !crate::value::set_typed(&mut **flag.value.borrow_mut(), value) {
                    return Err(CliError::Config(ConfigError::UnregisteredValueType {
                        path: self.path_string(),
                        type_name: std::any::type_name::<T>().to_string(),
                    }));
                }
                Ok(())
            }
            Target::Arg(id, idx) => {
                let arg = &self.tree.node(id).args[idx];
                if arg.options.implicit_value {
                    let mut state = arg.state.borrow_mut();
                    if state.implicit_assigned {
                        return Err(CliError::Config(ConfigError::ImplicitValueAlreadySet {
                            path: self.path_string(),
                        }));
                    }
                    state.implicit_assigned = true;
                }
                if !crate::value::set_typed(&mut **arg.value.borrow_mut(), value) {
                    return Err(CliError::Config(ConfigError::UnregisteredValueType {
                        path: self.path_string(),
                        type_name: std::any::type_name::<T>().to_string(),
                    }));
                }
                Ok(())
            }
        }
    }

    /// Queues a tree-structure edit to be applied once the current
    /// Initialize traversal unwinds. Only
    /// meaningful during Initialize; calling it later just defers the
    /// edit to the end of the (already-finished) fix-point loop, which is
    /// harmless but pointless, so builtin actions only call this from
    /// Initialize-phase actions (`AddFlag`, `AddCommand`, ...).
    pub fn queue_mutation(
        &self,
        f: impl FnOnce(&mut CommandTree) -> std::result::Result<(), ConfigError> + 'static,
    ) {
        self.mutations.borrow_mut().push(Box::new(f));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
