//! Option model: the unified parse-time state shared by flags and args —
//! occurrence count, raw bindings, and a bundle of internal-flag bits. Kept as a
//! plain struct behind a `RefCell` on the owning `FlagSlot`/`ArgSlot` so
//! the command tree itself stays an immutable arena after Initialize
//! while parse state is still mutable in place.

use std::sync::Arc;

/// Post-parse text transform applied to a flag/arg's raw string before it
/// reaches the value store.
pub type TransformFn = Arc<dyn Fn(String) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct InternalFlags {
    pub initialized: bool,
    pub hidden: bool,
    pub required: bool,
    pub seen_implied: bool,
    pub trigger_requested: bool,
    pub destination_implicitly_created: bool,
    pub robust_parse_mode: bool,
    pub skip_flag_parsing: bool,
    pub disable_auto_visibility: bool,
}

#[derive(Debug, Default)]
pub struct OptionState {
    bindings: Vec<String>,
    occurrences: usize,
    pub internal: InternalFlags,
    /// Whether the in-phase `SetValue` channel has already assigned an
    /// implicit-value-disciplined destination (spec invariant 5).
    pub implicit_assigned: bool,
}

impl OptionState {
    pub fn record_occurrence(&mut self, raw: impl Into<String>) {
        self.bindings.push(raw.into());
        self.occurrences += 1;
    }

    /// `Trigger()` forces a non-Seen option to run its Action without
    /// recording a textual occurrence. Idempotent.
    pub fn trigger(&mut self) {
        self.internal.trigger_requested = true;
    }

    pub fn seen(&self) -> bool {
        self.occurrences > 0
    }

    /// Whether this option's Action phase should run: Seen, triggered, or
    /// carrying `ImpliedAction` (checked by the caller and folded into
    /// `trigger_requested` before this is read).
    pub fn should_run_action(&self) -> bool {
        self.seen() || self.internal.trigger_requested || self.internal.seen_implied
    }

    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    pub fn raw_occurrences(&self) -> &[String] {
        &self.bindings
    }

    pub fn count(&self) -> usize {
        self.occurrences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_occurrences_len_matches_occurrences() {
        let mut s = OptionState::default();
        s.record_occurrence("a");
        s.record_occurrence("b");
        assert_eq!(s.raw_occurrences().len(), s.occurrences());
        assert!(s.seen());
    }

    #[test]
    fn trigger_makes_non_seen_option_run() {
        let mut s = OptionState::default();
        assert!(!s.should_run_action());
        s.trigger();
        assert!(s.should_run_action());
    }
}
