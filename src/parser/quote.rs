//! Shell quoting/splitting: `split(join(xs)) == xs`, used to render a
//! parsed invocation back into a single human-readable line — in
//! diagnostics (`tracing::debug!` spans around token consumption) and in
//! `PartialBindings`'s debug rendering for shell-completion producers —
//! and to split a single string (an env var, a response-file line) back
//! into argv-shaped tokens.
//!
//! Thin wrapper over the `shlex` crate rather than a hand-rolled quoting
//! routine, for the same reason anything the ecosystem already solves
//! correctly doesn't get a second implementation here.

/// Joins `tokens` into one shell-quoted line; every token round-trips back
/// out of `split` unchanged.
pub fn join<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    shlex::try_join(tokens).unwrap_or_default()
}

/// Splits a shell-quoted line into tokens. `None` on unbalanced quoting,
/// mirroring `shlex::split`'s own failure mode.
pub fn split(line: &str) -> Option<Vec<String>> {
    shlex::split(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_then_split_round_trips_shell_safe_tokens() {
        let xs = vec!["app", "sub", "--name", "hello world", "path/with spaces"];
        let joined = join(xs.iter().copied());
        let split_back = split(&joined).unwrap();
        assert_eq!(split_back, xs);
    }

    #[test]
    fn split_rejects_unbalanced_quoting() {
        assert!(split("unterminated \"quote").is_none());
    }
}
