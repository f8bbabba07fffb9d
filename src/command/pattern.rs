//! Path patterns.
//!
//! A pattern is matched right-anchored against a context path: the last
//! `pattern.len()` tokens of the path must align with the pattern's
//! segments, and any extra prefix is implicitly accepted — which is what
//! the spec means by "a leading `*` is implicit".

/// One token of a context's path: which command we're under, or — for a
/// flag/arg context — the trailing flag/arg token appended to the command
/// chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextToken {
    Command(String),
    Flag(String),
    Arg(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    AnyCommand,
    SpecificCommand(String),
    AnyFlag,
    SpecificFlag(String),
    AnyArg,
    SpecificArg(String),
    /// `<->` — reserved for the expression extension (out of scope here;
    /// accepted in the grammar, matches nothing concrete).
    AnyExpression,
}

impl Segment {
    fn matches(&self, token: &ContextToken) -> bool {
        match (self, token) {
            (Segment::AnyCommand, ContextToken::Command(_)) => true,
            (Segment::SpecificCommand(n), ContextToken::Command(name)) => n == name,
            (Segment::AnyFlag, ContextToken::Flag(_)) => true,
            (Segment::SpecificFlag(n), ContextToken::Flag(name)) => n == name,
            (Segment::AnyArg, ContextToken::Arg(_)) => true,
            (Segment::SpecificArg(n), ContextToken::Arg(name)) => n == name,
            (Segment::AnyExpression, _) => false,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathPattern {
    pub segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split_whitespace()
            .map(Self::parse_segment)
            .collect();
        Self { segments }
    }

    fn parse_segment(tok: &str) -> Segment {
        if tok == "*" {
            Segment::AnyCommand
        } else if tok == "-" {
            Segment::AnyFlag
        } else if tok == "<>" {
            Segment::AnyArg
        } else if tok == "<->" {
            Segment::AnyExpression
        } else if let Some(name) = tok.strip_prefix("<").and_then(|s| s.strip_suffix(">")) {
            Segment::SpecificArg(name.to_string())
        } else if let Some(name) = tok.strip_prefix("--") {
            Segment::SpecificFlag(name.to_string())
        } else if let Some(name) = tok.strip_prefix('-') {
            Segment::SpecificFlag(name.to_string())
        } else {
            Segment::SpecificCommand(tok.to_string())
        }
    }

    pub fn matches(&self, tokens: &[ContextToken]) -> bool {
        if self.segments.len() > tokens.len() {
            return false;
        }
        let offset = tokens.len() - self.segments.len();
        self.segments
            .iter()
            .zip(&tokens[offset..])
            .all(|(seg, tok)| seg.matches(tok))
    }

    /// Convenience used by `CommandTree::matches_pattern` where only the
    /// command-name chain is available (no flag/arg tail).
    pub fn matches_path(&self, names: &[String]) -> bool {
        let tokens: Vec<ContextToken> = names.iter().cloned().map(ContextToken::Command).collect();
        self.matches(&tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_any_depth() {
        let pat = PathPattern::parse("*");
        assert!(pat.matches_path(&["app".into()]));
        assert!(pat.matches_path(&["app".into(), "sub".into(), "dom".into()]));
    }

    #[test]
    fn specific_command_is_right_anchored() {
        let pat = PathPattern::parse("sub dom");
        assert!(pat.matches_path(&["app".into(), "sub".into(), "dom".into()]));
        assert!(!pat.matches_path(&["app".into(), "dom".into(), "sub".into()]));
        assert!(!pat.matches_path(&["sub".into()]));
    }

    #[test]
    fn specific_flag_segment_matches_flag_token() {
        let pat = PathPattern::parse("sub --local");
        let tokens = vec![
            ContextToken::Command("app".into()),
            ContextToken::Command("sub".into()),
            ContextToken::Flag("local".into()),
        ];
        assert!(pat.matches(&tokens));
    }
}
