use std::{ops::Range, path::PathBuf};

use ariadne::{Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// A grammar description that could not be compiled.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("failed to read grammar file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: FailureReason },
}

impl GrammarError {
    pub(crate) fn syntax(line: usize, reason: FailureReason) -> GrammarError {
        GrammarError::Syntax { line, reason }
    }

    /// The 1-based line the error was found on, if it came from the text.
    pub fn line(&self) -> Option<usize> {
        match self {
            GrammarError::Io { .. } => None,
            GrammarError::Syntax { line, .. } => Some(*line),
        }
    }

    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            GrammarError::Io { .. } => None,
            GrammarError::Syntax { reason, .. } => Some(reason),
        }
    }

    /// Renders the error against the description it came from, pointing at
    /// the offending line. The output carries no colour codes.
    pub fn report(&self, src: &str) -> String {
        let GrammarError::Syntax { line, reason } = self else {
            return self.to_string();
        };
        let span = line_span(src, *line);

        let mut rendered = Vec::new();
        let written = Report::build(ReportKind::Error, span.clone())
            .with_config(Config::default().with_color(false))
            .with_message(format!("invalid grammar on line {line}"))
            .with_label(Label::new(span).with_message(reason.to_string()))
            .finish()
            .write(Source::from(src), &mut rendered);

        match written {
            Ok(()) => String::from_utf8_lossy(&rendered).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Character range of the 1-based `line` in `src`, clamped to the end of the
/// text for lines past it.
fn line_span(src: &str, line: usize) -> Range<usize> {
    let mut start = 0;
    for (n, text) in src.split('\n').enumerate() {
        let len = text.trim_end_matches('\r').chars().count();
        if n + 1 == line {
            return start..start + len;
        }
        start += text.chars().count() + 1;
    }
    let end = src.chars().count();
    end..end
}

/// Why a grammar description was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("text before the first rule header")]
    MissingRuleHeader,
    #[error("malformed rule header `{0}`")]
    InvalidRuleHeader(String),
    #[error("rule `<{name}>` is already defined on line {first_line}")]
    DuplicateRule { name: String, first_line: usize },
    #[error("unbalanced quote")]
    UnbalancedQuote,
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("unexpected `{0}`")]
    UnexpectedSigil(char),
    #[error("unknown special token `{0}`")]
    UnknownSpecial(String),
    #[error("rule reference is missing its closing `>`")]
    UnterminatedRuleReference,
    #[error("unbalanced brace")]
    UnbalancedBrace,
    #[error("empty brace group")]
    EmptyGroup,
    #[error("empty alternate")]
    EmptyAlternate,
    #[error("alternate must start with a capitalized name or be a lone rule reference, found {0}")]
    AlternateStart(String),
    #[error("head name `{0}` can only start an alternate")]
    MisplacedHeadName(String),
    #[error("parameter `{0}` is not followed by `:`")]
    ParameterWithoutColon(String),
    #[error("`&` must be followed by a brace group")]
    SeparatorWithoutGroup,
    #[error("`{0}` has nothing to apply to")]
    DanglingModifier(char),
    #[error("reference to undefined rule `<{0}>`")]
    UndefinedRule(String),
}

/// A parse that completed but whose result was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("rule `{rule}` produced {alternatives} parses, more than the limit of {limit}")]
    TooAmbiguous {
        rule: String,
        alternatives: usize,
        limit: usize,
    },
}
