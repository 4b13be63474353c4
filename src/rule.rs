use std::collections::{HashSet, VecDeque};

use crate::{
    error::{FailureReason, GrammarError},
    lexing::{split_alternates, tokenize},
    production::{Production, ProductionPart, parse_alternate},
    scanner::scan,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    /// Line the alternate starts on.
    pub line: usize,
    pub production: Production,
}

/// One `<name> ::= ...` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    /// Line of the rule header.
    pub line: usize,
    pub alternates: Vec<Alternate>,
}

impl Rule {
    /// Names of the rules this one refers to, breadth-first and without
    /// repeats.
    pub fn nonterminals(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        let mut queue: VecDeque<&ProductionPart> = VecDeque::new();
        for alternate in &self.alternates {
            match &alternate.production {
                Production::Alias { rule } => names.push(rule),
                Production::Named { parts, .. } => queue.extend(parts),
            }
        }
        while let Some(part) = queue.pop_front() {
            if let ProductionPart::Rule(name) = part {
                names.push(name);
            }
            queue.extend(part.children());
        }

        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(*name));
        names
    }

    /// The line of the first alternate mentioning `name`.
    pub(crate) fn line_referring_to(&self, name: &str) -> usize {
        fn mentions(part: &ProductionPart, name: &str) -> bool {
            matches!(part, ProductionPart::Rule(r) if r == name)
                || part.children().into_iter().any(|p| mentions(p, name))
        }

        self.alternates
            .iter()
            .find(|alternate| match &alternate.production {
                Production::Alias { rule } => rule == name,
                Production::Named { parts, .. } => parts.iter().any(|p| mentions(p, name)),
            })
            .map_or(self.line, |alternate| alternate.line)
    }
}

/// Parses a grammar description into its rules, in the order they are
/// written, without turning them into languages.
///
/// A reference to a rule the description never defines is an error.
pub fn parse_description(src: &str) -> Result<Vec<Rule>, GrammarError> {
    let mut rules = vec![];
    for raw in scan(src)? {
        let pieces = tokenize(&raw.segments)?;
        let mut alternates = vec![];
        for alternate in split_alternates(pieces) {
            let line = alternate.first().map_or(raw.line, |p| p.line);
            alternates.push(Alternate {
                line,
                production: parse_alternate(&alternate, line)?,
            });
        }
        rules.push(Rule {
            name: raw.name.to_string(),
            line: raw.line,
            alternates,
        });
    }

    let defined: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    for rule in &rules {
        if let Some(missing) = rule
            .nonterminals()
            .into_iter()
            .find(|name| !defined.contains(name))
        {
            return Err(GrammarError::syntax(
                rule.line_referring_to(missing),
                FailureReason::UndefinedRule(missing.to_string()),
            ));
        }
    }

    log::debug!("parsed grammar description with {} rules", rules.len());
    Ok(rules)
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::*;

    #[test]
    fn nonterminals_order() {
        let src = "<r> ::= Pair { <a> <b> } <c> | <d>\n | Again <c>* <e>&{<f>}\n<a> ::= A 'a'\n<b> ::= <a>\n<c> ::= <a>\n<d> ::= <a>\n<e> ::= <a>\n<f> ::= <a>";
        let rules = parse_description(src).unwrap_or_else(|e| panic!("{e}"));
        assert_compact_debug_snapshot!(rules[0].nonterminals(), @r#"["d", "c", "a", "b", "e", "f"]"#);
    }

    #[test]
    fn alternates_keep_their_lines() {
        let src = "<expr> ::= Add <expr> '+' NUMBER\n\n  | Num NUMBER\n";
        let rules = parse_description(src).unwrap();
        let lines: Vec<_> = rules[0].alternates.iter().map(|a| a.line).collect();
        assert_eq!(lines, [1, 3]);
        assert_eq!(rules[0].line, 1);
    }

    #[test]
    fn undefined_rule() {
        let src = "<a> ::= A 'x'\n<b> ::= B 'y'\n | C <missing>";
        let err = parse_description(src).unwrap_err();
        assert_eq!(err.to_string(), "line 3: reference to undefined rule `<missing>`");
    }

    #[test]
    fn errors_carry_lines() {
        let err = parse_description("<a> ::= A 'x'\n\n<b> ::= B 'y' |").unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.reason(), Some(&FailureReason::EmptyAlternate));
    }
}
