use std::{
    fmt::Display,
    iter::{Peekable, once},
    slice,
    str::FromStr,
};

use strum::{EnumDiscriminants, IntoStaticStr};

use crate::{
    error::{FailureReason, GrammarError},
    lexing::{Piece, RawToken},
    token::TokenClass,
};

/// One alternate of a rule, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production {
    /// A lone `<rule>`: the alternate is exactly that rule.
    Alias { rule: String },
    /// A capitalized head name followed by the parts it is made of.
    Named {
        name: String,
        parts: Vec<ProductionPart>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(PartKind), derive(IntoStaticStr))]
pub enum ProductionPart {
    /// Quoted text. The description syntax has no escapes, so text holding
    /// both kinds of quote cannot come from a parse, and prints in a form
    /// that does not read back.
    Literal(String),
    Special(TokenClass),
    Rule(String),
    Repeat(Box<ProductionPart>),
    Optional(Box<ProductionPart>),
    /// `item&{separator}`: zero or more items with separators between them.
    Separated {
        item: Box<ProductionPart>,
        separator: Vec<ProductionPart>,
    },
    /// `name: part`, naming a field for whoever builds trees from the forest.
    Param {
        name: String,
        part: Box<ProductionPart>,
    },
    /// `@part`
    Lifted(Box<ProductionPart>),
    /// `{...}`
    Group(Vec<ProductionPart>),
}

impl ProductionPart {
    pub fn kind(&self) -> &'static str {
        PartKind::from(self).into()
    }

    /// The parts directly inside this one.
    pub(crate) fn children(&self) -> Vec<&ProductionPart> {
        match self {
            ProductionPart::Literal(_) | ProductionPart::Special(_) | ProductionPart::Rule(_) => vec![],
            ProductionPart::Repeat(part)
            | ProductionPart::Optional(part)
            | ProductionPart::Lifted(part)
            | ProductionPart::Param { part, .. } => vec![&**part],
            ProductionPart::Separated { item, separator } => {
                once(&**item).chain(separator).collect()
            }
            ProductionPart::Group(parts) => parts.iter().collect(),
        }
    }
}

impl Display for ProductionPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductionPart::Literal(text) if text.contains('\'') => write!(f, "\"{text}\""),
            ProductionPart::Literal(text) => write!(f, "'{text}'"),
            ProductionPart::Special(class) => write!(f, "{class}"),
            ProductionPart::Rule(name) => write!(f, "<{name}>"),
            ProductionPart::Repeat(part) => write!(f, "{part}*"),
            ProductionPart::Optional(part) => write!(f, "{part}?"),
            ProductionPart::Separated { item, separator } => {
                write!(f, "{item}&{{ {} }}", Spaced(separator))
            }
            ProductionPart::Param { name, part } => write!(f, "{name}: {part}"),
            ProductionPart::Lifted(part) => write!(f, "@{part}"),
            ProductionPart::Group(parts) => write!(f, "{{ {} }}", Spaced(parts)),
        }
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Production::Alias { rule } => write!(f, "<{rule}>"),
            Production::Named { name, parts } if parts.is_empty() => write!(f, "{name}"),
            Production::Named { name, parts } => write!(f, "{name} {}", Spaced(parts)),
        }
    }
}

struct Spaced<'p>(&'p [ProductionPart]);

impl Display for Spaced<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (n, part) in self.0.iter().enumerate() {
            if n > 0 {
                write!(f, " ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// A token after classification, with groups already nested.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sym<'a> {
    Literal(&'a str),
    Special(TokenClass),
    RuleRef(&'a str),
    Head(&'a str),
    ParamName(&'a str),
    Group(Vec<Classified<'a>>),
    Sigil(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Classified<'a> {
    line: usize,
    sym: Sym<'a>,
}

fn is_screaming(word: &str) -> bool {
    word.len() >= 2
        && word.starts_with(|c: char| c.is_ascii_uppercase())
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn classify_word(word: &str) -> Result<Sym<'_>, FailureReason> {
    if is_screaming(word) {
        TokenClass::from_str(word)
            .map(Sym::Special)
            .map_err(|_| FailureReason::UnknownSpecial(word.to_string()))
    } else if word.starts_with(|c: char| c.is_ascii_uppercase()) {
        Ok(Sym::Head(word))
    } else {
        Ok(Sym::ParamName(word))
    }
}

/// Classifies pieces up to the brace closing the group opened on `opened_on`,
/// or to the end of the alternate when `opened_on` is `None`.
fn classify<'a>(
    pieces: &mut slice::Iter<'_, Piece<'a>>,
    opened_on: Option<usize>,
) -> Result<Vec<Classified<'a>>, GrammarError> {
    let mut output = vec![];
    while let Some(piece) = pieces.next() {
        let line = piece.line;
        let sym = match piece.token {
            RawToken::Quoted(text) => Sym::Literal(text),
            RawToken::Word(word) => {
                classify_word(word).map_err(|reason| GrammarError::syntax(line, reason))?
            }
            RawToken::OpenAngle => {
                let name = match pieces.next().map(|p| p.token) {
                    Some(RawToken::Word(name)) => name,
                    _ => {
                        return Err(GrammarError::syntax(
                            line,
                            FailureReason::UnterminatedRuleReference,
                        ));
                    }
                };
                if pieces.next().map(|p| p.token) != Some(RawToken::CloseAngle) {
                    return Err(GrammarError::syntax(
                        line,
                        FailureReason::UnterminatedRuleReference,
                    ));
                }
                Sym::RuleRef(name)
            }
            RawToken::OpenBrace => Sym::Group(classify(pieces, Some(line))?),
            RawToken::CloseBrace => {
                return match opened_on {
                    Some(_) => Ok(output),
                    None => Err(GrammarError::syntax(line, FailureReason::UnbalancedBrace)),
                };
            }
            RawToken::CloseAngle => Sym::Sigil('>'),
            RawToken::Lift => Sym::Sigil('@'),
            RawToken::Separated => Sym::Sigil('&'),
            RawToken::Star => Sym::Sigil('*'),
            RawToken::Question => Sym::Sigil('?'),
            RawToken::Colon => Sym::Sigil(':'),
            RawToken::Bar => Sym::Sigil('|'),
        };
        output.push(Classified { line, sym });
    }
    match opened_on {
        Some(line) => Err(GrammarError::syntax(line, FailureReason::UnbalancedBrace)),
        None => Ok(output),
    }
}

type SymIter<'s, 'a> = Peekable<slice::Iter<'s, Classified<'a>>>;

/// Parses one `|`-separated alternate. `line` is used when the alternate is
/// empty and there is no token to take a line from.
pub(crate) fn parse_alternate(pieces: &[Piece<'_>], line: usize) -> Result<Production, GrammarError> {
    let classified = classify(&mut pieces.iter(), None)?;

    match classified.as_slice() {
        [] => Err(GrammarError::syntax(line, FailureReason::EmptyAlternate)),
        [Classified {
            sym: Sym::RuleRef(rule),
            ..
        }] => Ok(Production::Alias {
            rule: (*rule).to_string(),
        }),
        [
            Classified {
                sym: Sym::Head(name),
                ..
            },
            rest @ ..,
        ] => {
            let mut syms = rest.iter().peekable();
            let mut parts = vec![];
            while syms.peek().is_some() {
                parts.push(parse_part(&mut syms)?);
            }
            Ok(Production::Named {
                name: (*name).to_string(),
                parts,
            })
        }
        [first, ..] => Err(GrammarError::syntax(
            first.line,
            FailureReason::AlternateStart(describe(&first.sym)),
        )),
    }
}

fn describe(sym: &Sym<'_>) -> String {
    match sym {
        Sym::Literal(text) => format!("'{text}'"),
        Sym::Special(class) => format!("`{class}`"),
        Sym::RuleRef(name) => format!("`<{name}>`"),
        Sym::Head(word) | Sym::ParamName(word) => format!("`{word}`"),
        Sym::Group(_) => "a brace group".to_string(),
        Sym::Sigil(c) => format!("`{c}`"),
    }
}

fn parse_sequence(group: &[Classified<'_>], line: usize) -> Result<Vec<ProductionPart>, GrammarError> {
    if group.is_empty() {
        return Err(GrammarError::syntax(line, FailureReason::EmptyGroup));
    }
    let mut syms = group.iter().peekable();
    let mut parts = vec![];
    while syms.peek().is_some() {
        parts.push(parse_part(&mut syms)?);
    }
    Ok(parts)
}

/// One part with its prefix forms and any postfix modifiers.
fn parse_part(syms: &mut SymIter<'_, '_>) -> Result<ProductionPart, GrammarError> {
    let Some(Classified { line, sym }) = syms.next() else {
        unreachable!("parse_part is only called with input remaining")
    };
    let line = *line;

    let mut part = match sym {
        Sym::Literal(text) => ProductionPart::Literal((*text).to_string()),
        Sym::Special(class) => ProductionPart::Special(*class),
        Sym::RuleRef(name) => ProductionPart::Rule((*name).to_string()),
        Sym::Group(inner) => ProductionPart::Group(parse_sequence(inner, line)?),
        Sym::ParamName(name) => {
            if !matches!(syms.next(), Some(Classified { sym: Sym::Sigil(':'), .. })) {
                return Err(GrammarError::syntax(
                    line,
                    FailureReason::ParameterWithoutColon((*name).to_string()),
                ));
            }
            if syms.peek().is_none() {
                return Err(GrammarError::syntax(line, FailureReason::DanglingModifier(':')));
            }
            return Ok(ProductionPart::Param {
                name: (*name).to_string(),
                part: Box::new(parse_part(syms)?),
            });
        }
        Sym::Sigil('@') => {
            if syms.peek().is_none() {
                return Err(GrammarError::syntax(line, FailureReason::DanglingModifier('@')));
            }
            return Ok(ProductionPart::Lifted(Box::new(parse_part(syms)?)));
        }
        Sym::Head(name) => {
            return Err(GrammarError::syntax(
                line,
                FailureReason::MisplacedHeadName((*name).to_string()),
            ));
        }
        Sym::Sigil(c @ ('*' | '?' | '&')) => {
            return Err(GrammarError::syntax(line, FailureReason::DanglingModifier(*c)));
        }
        Sym::Sigil(c) => return Err(GrammarError::syntax(line, FailureReason::UnexpectedSigil(*c))),
    };

    while let Some(Classified {
        line,
        sym: Sym::Sigil(c @ ('*' | '?' | '&')),
    }) = syms.peek()
    {
        let line = *line;
        let c = *c;
        syms.next();
        part = match c {
            '*' => ProductionPart::Repeat(Box::new(part)),
            '?' => ProductionPart::Optional(Box::new(part)),
            _ => match syms.next() {
                Some(Classified {
                    sym: Sym::Group(separator),
                    line,
                }) => ProductionPart::Separated {
                    item: Box::new(part),
                    separator: parse_sequence(separator, *line)?,
                },
                _ => return Err(GrammarError::syntax(line, FailureReason::SeparatorWithoutGroup)),
            },
        };
    }
    Ok(part)
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::*;
    use crate::{lexing::tokenize, scanner::Segment};

    fn parse(text: &str) -> Result<Production, GrammarError> {
        let pieces = tokenize(&[Segment { line: 1, text }])?;
        parse_alternate(&pieces, 1)
    }

    fn failure(text: &str) -> FailureReason {
        match parse(text) {
            Ok(p) => panic!("{text} parsed as {p:?}"),
            Err(e) => e.reason().cloned().unwrap_or_else(|| panic!("{e}")),
        }
    }

    #[test]
    fn alias() {
        assert_compact_debug_snapshot!(parse("<expr>").unwrap(), @r#"Alias { rule: "expr" }"#);
    }

    #[test]
    fn named_parts() {
        let p = parse("Add left: <expr> '+' right: <term> NEWLINE").unwrap();
        assert_compact_debug_snapshot!(p, @r#"Named { name: "Add", parts: [Param { name: "left", part: Rule("expr") }, Literal("+"), Param { name: "right", part: Rule("term") }, Special(Newline)] }"#);
    }

    #[test]
    fn modifiers_bind_left_to_right() {
        let p = parse("Call args: <expr>&{','}? @NAME*").unwrap();
        assert_compact_debug_snapshot!(p, @r#"Named { name: "Call", parts: [Param { name: "args", part: Optional(Separated { item: Rule("expr"), separator: [Literal(",")] }) }, Lifted(Repeat(Special(Name)))] }"#);
    }

    #[test]
    fn groups_nest() {
        let p = parse("Block { NEWLINE { <stmt> ';' }* }").unwrap();
        assert_compact_debug_snapshot!(p, @r#"Named { name: "Block", parts: [Group([Special(Newline), Repeat(Group([Rule("stmt"), Literal(";")]))])] }"#);
    }

    #[test]
    fn head_name_only() {
        assert_compact_debug_snapshot!(parse("Nothing").unwrap(), @r#"Named { name: "Nothing", parts: [] }"#);
    }

    #[test]
    fn failures() {
        assert_eq!(failure("Foo BOGUS"), FailureReason::UnknownSpecial("BOGUS".into()));
        assert_eq!(failure("Foo <bar"), FailureReason::UnterminatedRuleReference);
        assert_eq!(failure("Foo <'x'>"), FailureReason::UnterminatedRuleReference);
        assert_eq!(failure("Foo { 'x'"), FailureReason::UnbalancedBrace);
        assert_eq!(failure("Foo 'x' }"), FailureReason::UnbalancedBrace);
        assert_eq!(failure("Foo {}"), FailureReason::EmptyGroup);
        assert_eq!(failure(""), FailureReason::EmptyAlternate);
        assert_eq!(failure("'x' Foo"), FailureReason::AlternateStart("'x'".into()));
        assert_eq!(failure("<a> <b>"), FailureReason::AlternateStart("`<a>`".into()));
        assert_eq!(failure("Foo Bar"), FailureReason::MisplacedHeadName("Bar".into()));
        assert_eq!(failure("Foo name <x>"), FailureReason::ParameterWithoutColon("name".into()));
        assert_eq!(failure("Foo <x>&','"), FailureReason::SeparatorWithoutGroup);
        assert_eq!(failure("Foo * <x>"), FailureReason::DanglingModifier('*'));
        assert_eq!(failure("Foo <x> @"), FailureReason::DanglingModifier('@'));
        assert_eq!(failure("Foo name:"), FailureReason::DanglingModifier(':'));
        assert_eq!(failure("Foo : <x>"), FailureReason::UnexpectedSigil(':'));
    }

    #[test]
    fn display_reads_back() {
        let src = "Call f: @<expr> args: { <expr> NAME? }&{ ',' } \"'\"*";
        let p = parse(src).unwrap();
        assert_eq!(p.to_string(), src);
        assert_eq!(parse(&p.to_string()).unwrap(), p);
    }

    #[test]
    fn quotes_pick_the_other_kind() {
        for src in ["Say \"it's\"", "Say '\"hi\"'"] {
            let p = parse(src).unwrap();
            assert_eq!(p.to_string(), src);
        }
        let both = ProductionPart::Literal("'\"".into());
        assert!(parse(&format!("Say {both}")).is_err());
    }

    #[test]
    fn part_kinds() {
        let part = ProductionPart::Repeat(Box::new(ProductionPart::Literal("x".into())));
        assert_eq!(part.kind(), "Repeat");
        assert_eq!(part.children().len(), 1);
    }
}
