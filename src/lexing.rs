use std::fmt::Display;

use logos::Logos;

use crate::{
    error::{FailureReason, GrammarError},
    scanner::Segment,
};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub(crate) enum RawToken<'a> {
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("@")]
    Lift,
    #[token("&")]
    Separated,
    #[token("*")]
    Star,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("|")]
    Bar,
    #[regex(r"'[^']*'", unquote)]
    #[regex(r#""[^"]*""#, unquote)]
    Quoted(&'a str),
    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*", |lex| lex.slice())]
    Word(&'a str),
}

fn unquote<'a>(lex: &mut logos::Lexer<'a, RawToken<'a>>) -> &'a str {
    let quoted = lex.slice();
    &quoted[1..quoted.len() - 1]
}

impl Display for RawToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sigil = match self {
            RawToken::Quoted(text) => return write!(f, "'{text}'"),
            RawToken::Word(word) => return write!(f, "`{word}`"),
            RawToken::OpenAngle => '<',
            RawToken::CloseAngle => '>',
            RawToken::OpenBrace => '{',
            RawToken::CloseBrace => '}',
            RawToken::Lift => '@',
            RawToken::Separated => '&',
            RawToken::Star => '*',
            RawToken::Question => '?',
            RawToken::Colon => ':',
            RawToken::Bar => '|',
        };
        write!(f, "`{sigil}`")
    }
}

/// A lexed token and the line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Piece<'a> {
    pub(crate) line: usize,
    pub(crate) token: RawToken<'a>,
}

pub(crate) fn tokenize<'a>(segments: &[Segment<'a>]) -> Result<Vec<Piece<'a>>, GrammarError> {
    let mut output = vec![];
    for segment in segments {
        let lexer = RawToken::lexer(segment.text).spanned();
        for (token, span) in lexer {
            let Ok(token) = token else {
                let rest = &segment.text[span.start..];
                let reason = match rest.chars().next() {
                    Some('\'' | '"') | None => FailureReason::UnbalancedQuote,
                    Some(c) => FailureReason::UnexpectedCharacter(c),
                };
                return Err(GrammarError::syntax(segment.line, reason));
            };
            output.push(Piece {
                line: segment.line,
                token,
            });
        }
    }
    Ok(output)
}

/// Splits a rule body on `|`. A bar in front of the first alternate is
/// allowed, so rules can start every alternate on its own line.
pub(crate) fn split_alternates(pieces: Vec<Piece<'_>>) -> Vec<Vec<Piece<'_>>> {
    let mut pieces = pieces.into_iter().peekable();
    pieces.next_if(|p| p.token == RawToken::Bar);

    let mut alternates = vec![vec![]];
    for piece in pieces {
        if piece.token == RawToken::Bar {
            alternates.push(vec![]);
        } else if let Some(current) = alternates.last_mut() {
            current.push(piece);
        }
    }
    alternates
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::*;

    fn segment(text: &str) -> Vec<Segment<'_>> {
        vec![Segment { line: 1, text }]
    }

    fn tokens(text: &str) -> Vec<RawToken<'_>> {
        tokenize(&segment(text))
            .unwrap_or_else(|e| panic!("{e}"))
            .into_iter()
            .map(|p| p.token)
            .collect()
    }

    #[test]
    fn basic_token_test() {
        let tokens = tokens(" Call f: <expr> args: {<expr>}&{','}? @NAME* \"|\"");
        assert_compact_debug_snapshot!(tokens, @r#"[Word("Call"), Word("f"), Colon, OpenAngle, Word("expr"), CloseAngle, Word("args"), Colon, OpenBrace, OpenAngle, Word("expr"), CloseAngle, CloseBrace, Separated, OpenBrace, Quoted(","), CloseBrace, Question, Lift, Word("NAME"), Star, Quoted("|")]"#);
    }

    #[test]
    fn quoted_bar_does_not_split() {
        let pieces = tokenize(&segment("A 'a|b' | B \"'\"")).unwrap();
        let alternates = split_alternates(pieces);
        assert_eq!(alternates.len(), 2);
        assert_eq!(alternates[0][1].token, RawToken::Quoted("a|b"));
        assert_eq!(alternates[1][1].token, RawToken::Quoted("'"));
    }

    #[test]
    fn leading_bar() {
        let pieces = tokenize(&[
            Segment { line: 1, text: "" },
            Segment { line: 2, text: "| A 'a'" },
            Segment { line: 3, text: "| B 'b'" },
        ])
        .unwrap();
        let alternates = split_alternates(pieces);
        assert_eq!(alternates.len(), 2);
        assert_eq!(alternates[1][0].line, 3);
    }

    #[test]
    fn lex_failures() {
        let err = tokenize(&segment("A 'open")).unwrap_err();
        assert_eq!(err.reason(), Some(&FailureReason::UnbalancedQuote));

        let err = tokenize(&[Segment { line: 7, text: "A % 'x'" }]).unwrap_err();
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.reason(), Some(&FailureReason::UnexpectedCharacter('%')));
    }

    #[test]
    fn token_display() {
        assert_eq!(RawToken::Star.to_string(), "`*`");
        assert_eq!(RawToken::Quoted("x").to_string(), "'x'");
        assert_eq!(RawToken::Word("Foo").to_string(), "`Foo`");
    }
}
