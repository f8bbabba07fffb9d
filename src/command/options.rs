//! Options bitsets.
//!
//! Modeled as plain `bool` fields rather than packed bits: nothing in this
//! crate serializes the bitset across a wire, and a flags struct reads the
//! same way the teacher reads its `ExecutionLimits`/`BashOptions` structs —
//! a flat struct of named toggles, not a hand-rolled bitmask.

/// Command-level Options bitset.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    pub skip_flag_parsing: bool,
    pub disallow_flags_after_args: bool,
    pub right_to_left: bool,
    pub hidden: bool,
    pub visible: bool,
    pub disable_auto_visibility: bool,
    pub implicit_action: bool,
}

/// Flag-level Options bitset: mirrors the command-level policies that make
/// sense per-flag plus flag-specific ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagOptions {
    /// Auto-generate a negating mirror `--no-X`.
    pub no: bool,
    pub required: bool,
    pub non_persistent: bool,
    pub disable_splitting: bool,
    pub merge: bool,
    /// On success, exit 0 right after this flag's Action.
    pub exits: bool,
    pub hidden: bool,
    pub visible: bool,
    pub disable_auto_visibility: bool,
    /// ImpliedAction: runs Action even when not Seen.
    pub implied_action: bool,
    /// The value can be set at most once via the in-phase `SetValue`
    /// channel (spec invariant 5).
    pub implicit_value: bool,
}

/// Arg-level options (a narrower set than Flag's — no short/long form or
/// negation mirror, but the same visibility/required/implied knobs).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgOptions {
    pub required: bool,
    pub hidden: bool,
    pub visible: bool,
    pub disable_auto_visibility: bool,
    pub implied_action: bool,
    pub implicit_value: bool,
    pub disable_splitting: bool,
    pub merge: bool,
}
