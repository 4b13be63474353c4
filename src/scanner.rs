//! Splits a grammar description into rules, before any tokenizing happens.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::error::{FailureReason, GrammarError};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*<([A-Za-z_][A-Za-z0-9_-]*)>\s*::=(.*)$").unwrap_or_else(|e| panic!("{e}"))
});

/// A piece of a rule body, on the line it was written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub(crate) line: usize,
    pub(crate) text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRule<'a> {
    pub(crate) name: &'a str,
    pub(crate) line: usize,
    pub(crate) segments: Vec<Segment<'a>>,
}

pub(crate) fn scan(src: &str) -> Result<Vec<RawRule<'_>>, GrammarError> {
    let mut rules: Vec<RawRule<'_>> = vec![];
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (n, text) in src.lines().enumerate() {
        let line = n + 1;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(captures) = HEADER.captures(text) {
            let (Some(name), Some(body)) = (captures.get(1), captures.get(2)) else {
                unreachable!("header pattern has two groups")
            };
            let name = name.as_str();
            if let Some(&first_line) = first_seen.get(name) {
                return Err(GrammarError::syntax(
                    line,
                    FailureReason::DuplicateRule {
                        name: name.to_string(),
                        first_line,
                    },
                ));
            }
            first_seen.insert(name, line);
            rules.push(RawRule {
                name,
                line,
                segments: vec![Segment {
                    line,
                    text: body.as_str(),
                }],
            });
            continue;
        }

        // Only a `::=` outside of any quoted text makes a line a header attempt.
        let unquoted = trimmed.split(['\'', '"']).next().unwrap_or_default();
        if unquoted.contains("::=") {
            return Err(GrammarError::syntax(
                line,
                FailureReason::InvalidRuleHeader(trimmed.to_string()),
            ));
        }

        match rules.last_mut() {
            Some(rule) => rule.segments.push(Segment { line, text }),
            None => return Err(GrammarError::syntax(line, FailureReason::MissingRuleHeader)),
        }
    }

    Ok(rules)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn headers_and_continuations() {
        let src = "# a comment\n<expr> ::= Add <expr> '+' NUMBER\n\n   | Num NUMBER\n<x-y> ::= X 'x'";
        let rules = scan(src).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "expr");
        assert_eq!(rules[0].line, 2);
        let lines: Vec<_> = rules[0].segments.iter().map(|s| s.line).collect();
        assert_eq!(lines, [2, 4]);
        assert_eq!(rules[0].segments[0].text, " Add <expr> '+' NUMBER");
        assert_eq!(rules[1].name, "x-y");
    }

    #[test]
    fn quoted_header_sigil_continues() {
        let rules = scan("<a> ::= A 'x'\n  | B '::='").unwrap();
        assert_eq!(rules[0].segments.len(), 2);
    }

    #[test]
    fn failures() {
        let err = scan("Foo 'x'\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.reason(), Some(&FailureReason::MissingRuleHeader));

        let err = scan("<a> ::= A 'x'\n<b c> ::= B 'y'").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err.reason(), Some(FailureReason::InvalidRuleHeader(_))));

        let err = scan("<a> ::= A 'x'\n\n<a> ::= B 'y'").unwrap_err();
        insta::assert_compact_debug_snapshot!(err, @r#"Syntax { line: 3, reason: DuplicateRule { name: "a", first_line: 1 } }"#);
    }
}
