//! Arg-counter
//!
//! One instance per positional arg, deciding whether the next token
//! belongs to it — a closed enum of outcomes plus concrete structs
//! implementing a shared trait, the small per-kind strategy-object shape.

use std::fmt;

use crate::error::ValidationError;

/// Result of offering one token to a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeOutcome {
    /// The token was consumed by this counter.
    Accepted,
    /// This counter is full; the token must be offered to the next one.
    EndOfArguments,
    /// Intersperse-mode sentinel: the token is flag-shaped and must be
    /// deferred to the flag lane without ending this counter.
    CannotUseFlag,
}

pub trait ArgCounter: fmt::Debug + Send + Sync {
    fn take(&mut self, token: &str, is_flag_shaped: bool) -> TakeOutcome;

    /// Finalization: errors when a `Discrete` counter is short.
    fn done(&self, name: &str) -> Result<(), ValidationError>;

    /// How many tokens this counter has accepted so far.
    fn taken(&self) -> usize;
}

/// Exactly `n` tokens.
#[derive(Debug, Clone)]
pub struct Discrete {
    pub n: usize,
    taken: usize,
}

impl Discrete {
    pub fn new(n: usize) -> Self {
        Self { n, taken: 0 }
    }
}

impl ArgCounter for Discrete {
    fn take(&mut self, _token: &str, _is_flag_shaped: bool) -> TakeOutcome {
        if self.taken >= self.n {
            return TakeOutcome::EndOfArguments;
        }
        self.taken += 1;
        TakeOutcome::Accepted
    }

    fn done(&self, name: &str) -> Result<(), ValidationError> {
        if self.taken < self.n {
            Err(ValidationError::ArgCounterShortfall {
                name: name.to_string(),
                expected: self.n - self.taken,
            })
        } else {
            Ok(())
        }
    }

    fn taken(&self) -> usize {
        self.taken
    }
}

/// At most one token; optional unless flagged `require_seen`.
#[derive(Debug, Clone, Default)]
pub struct DefaultCounter {
    taken: usize,
    pub require_seen: bool,
}

impl ArgCounter for DefaultCounter {
    fn take(&mut self, _token: &str, _is_flag_shaped: bool) -> TakeOutcome {
        if self.taken >= 1 {
            return TakeOutcome::EndOfArguments;
        }
        self.taken += 1;
        TakeOutcome::Accepted
    }

    fn done(&self, name: &str) -> Result<(), ValidationError> {
        if self.require_seen && self.taken == 0 {
            Err(ValidationError::ArgCounterShortfall {
                name: name.to_string(),
                expected: 1,
            })
        } else {
            Ok(())
        }
    }

    fn taken(&self) -> usize {
        self.taken
    }
}

/// Unbounded; optionally stops before a flag-shaped token, or defers it to
/// the flag lane (intersperse) without terminating.
#[derive(Debug, Clone, Default)]
pub struct VarArgs {
    pub stop_on_flags: bool,
    pub intersperse: bool,
    taken: usize,
}

impl VarArgs {
    pub fn greedy() -> Self {
        Self {
            stop_on_flags: false,
            intersperse: false,
            taken: 0,
        }
    }

    pub fn stop_on_flag() -> Self {
        Self {
            stop_on_flags: true,
            intersperse: false,
            taken: 0,
        }
    }

    pub fn intersperse() -> Self {
        Self {
            stop_on_flags: false,
            intersperse: true,
            taken: 0,
        }
    }
}

impl ArgCounter for VarArgs {
    fn take(&mut self, _token: &str, is_flag_shaped: bool) -> TakeOutcome {
        if is_flag_shaped {
            if self.intersperse {
                return TakeOutcome::CannotUseFlag;
            }
            if self.stop_on_flags {
                return TakeOutcome::EndOfArguments;
            }
        }
        self.taken += 1;
        TakeOutcome::Accepted
    }

    fn done(&self, _name: &str) -> Result<(), ValidationError> {
        Ok(())
    }

    fn taken(&self) -> usize {
        self.taken
    }
}

/// Takes tokens while a predicate holds, up to `max` (0 = unbounded).
pub struct Matches {
    pub predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
    pub max: usize,
    taken: usize,
}

impl fmt::Debug for Matches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matches")
            .field("max", &self.max)
            .field("taken", &self.taken)
            .finish()
    }
}

impl Matches {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static, max: usize) -> Self {
        Self {
            predicate: Box::new(predicate),
            max,
            taken: 0,
        }
    }
}

impl ArgCounter for Matches {
    fn take(&mut self, token: &str, _is_flag_shaped: bool) -> TakeOutcome {
        if self.max > 0 && self.taken >= self.max {
            return TakeOutcome::EndOfArguments;
        }
        if !(self.predicate)(token) {
            return TakeOutcome::EndOfArguments;
        }
        self.taken += 1;
        TakeOutcome::Accepted
    }

    fn done(&self, _name: &str) -> Result<(), ValidationError> {
        Ok(())
    }

    fn taken(&self) -> usize {
        self.taken
    }
}

/// Conventional-integer constructor: n>=1 => Discrete(n), 0 =>
/// Default, -1 => greedy, -2 => stop-on-flag, -3 => intersperse.
pub fn from_conventional_count(n: i64) -> Box<dyn ArgCounter> {
    match n {
        1.. => Box::new(Discrete::new(n as usize)),
        0 => Box::new(DefaultCounter::default()),
        -1 => Box::new(VarArgs::greedy()),
        -2 => Box::new(VarArgs::stop_on_flag()),
        -3 => Box::new(VarArgs::intersperse()),
        _ => Box::new(VarArgs::greedy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_ends_after_n_and_errors_when_short() {
        let mut c = Discrete::new(2);
        assert_eq!(c.take("a", false), TakeOutcome::Accepted);
        assert_eq!(c.take("b", false), TakeOutcome::Accepted);
        assert_eq!(c.take("c", false), TakeOutcome::EndOfArguments);
        assert!(c.done("x").is_ok());

        let mut short = Discrete::new(2);
        short.take("a", false);
        assert!(short.done("x").is_err());
    }

    #[test]
    fn default_counter_takes_one() {
        let mut c = DefaultCounter::default();
        assert_eq!(c.take("a", false), TakeOutcome::Accepted);
        assert_eq!(c.take("b", false), TakeOutcome::EndOfArguments);
    }

    #[test]
    fn greedy_takes_flag_shaped_tokens_verbatim() {
        let mut c = VarArgs::greedy();
        assert_eq!(c.take("-x", true), TakeOutcome::Accepted);
    }

    #[test]
    fn stop_on_flag_ends_before_flag() {
        let mut c = VarArgs::stop_on_flag();
        assert_eq!(c.take("a", false), TakeOutcome::Accepted);
        assert_eq!(c.take("-f", true), TakeOutcome::EndOfArguments);
    }

    #[test]
    fn intersperse_defers_flag_without_ending() {
        let mut c = VarArgs::intersperse();
        assert_eq!(c.take("argX", false), TakeOutcome::Accepted);
        assert_eq!(c.take("-f", true), TakeOutcome::CannotUseFlag);
        assert_eq!(c.take("argY", false), TakeOutcome::Accepted);
        assert_eq!(c.taken(), 2);
    }
}
