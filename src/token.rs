use std::{
    fmt::{Debug, Display},
    hash::Hash,
    rc::Rc,
};

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

/// A terminal symbol the engine derives over.
///
/// The engine never looks inside a token beyond equality, its [`TokenClass`]
/// and whether its text matches a literal from a grammar description.
pub trait Token: Clone + Eq + Hash + Debug + 'static {
    fn class(&self) -> TokenClass;
    fn has_text(&self, text: &str) -> bool;
}

/// The fixed table of special-token names a grammar description may use.
///
/// External lexers classify their output into these; a grammar naming anything
/// else fails to compile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenClass {
    Indent,
    Dedent,
    Newline,
    Comma,
    Colon,
    Semicolon,
    Dot,
    #[strum(serialize = "LPAREN")]
    LeftParen,
    #[strum(serialize = "RPAREN")]
    RightParen,
    #[strum(serialize = "LBRACKET")]
    LeftBracket,
    #[strum(serialize = "RBRACKET")]
    RightBracket,
    #[strum(serialize = "LBRACE")]
    LeftBrace,
    #[strum(serialize = "RBRACE")]
    RightBrace,
    Equals,
    Arrow,
    Name,
    Class,
    Number,
    String,
    Operator,
    /// End-of-input marker; callers append it when their grammar expects one.
    End,
}

impl TokenClass {
    /// The class a single punctuation character lexes to, if it has its own entry.
    pub fn of_punctuation(c: char) -> Option<TokenClass> {
        #![allow(clippy::enum_glob_use)]
        use TokenClass::*;
        let class = match c {
            ',' => Comma,
            ':' => Colon,
            ';' => Semicolon,
            '.' => Dot,
            '(' => LeftParen,
            ')' => RightParen,
            '[' => LeftBracket,
            ']' => RightBracket,
            '{' => LeftBrace,
            '}' => RightBrace,
            '=' => Equals,
            _ => return None,
        };
        Some(class)
    }
}

/// A token as handed over by an external lexer: a class plus optional text.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Lexeme {
    pub class: TokenClass,
    pub text: Option<Rc<str>>,
}

impl Lexeme {
    pub fn new(class: TokenClass, text: impl Into<Rc<str>>) -> Lexeme {
        Lexeme {
            class,
            text: Some(text.into()),
        }
    }

    /// A token that carries no text, like `INDENT` or `END`.
    pub fn bare(class: TokenClass) -> Lexeme {
        Lexeme { class, text: None }
    }
}

impl Token for Lexeme {
    fn class(&self) -> TokenClass {
        self.class
    }

    fn has_text(&self, text: &str) -> bool {
        self.text.as_deref() == Some(text)
    }
}

impl Debug for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let class = self.class;
        match &self.text {
            Some(text) => write!(f, "{class}({:?})", &**text),
            None => write!(f, "{class}"),
        }
    }
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "{}", self.class),
        }
    }
}

impl Token for char {
    fn class(&self) -> TokenClass {
        if self.is_alphabetic() || *self == '_' {
            TokenClass::Name
        } else if self.is_ascii_digit() {
            TokenClass::Number
        } else if *self == '\n' {
            TokenClass::Newline
        } else {
            TokenClass::of_punctuation(*self).unwrap_or(TokenClass::Operator)
        }
    }

    fn has_text(&self, text: &str) -> bool {
        let mut buffer = [0; 4];
        self.encode_utf8(&mut buffer) == text
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn special_names() {
        assert_eq!(TokenClass::from_str("NEWLINE"), Ok(TokenClass::Newline));
        assert_eq!(TokenClass::from_str("LPAREN"), Ok(TokenClass::LeftParen));
        assert_eq!(TokenClass::Dedent.to_string(), "DEDENT");
        assert!(TokenClass::from_str("LEFT_PAREN").is_err());
        assert!(TokenClass::from_str("name").is_err());
    }

    #[test]
    fn char_tokens() {
        assert_eq!('x'.class(), TokenClass::Name);
        assert_eq!('7'.class(), TokenClass::Number);
        assert_eq!(','.class(), TokenClass::Comma);
        assert_eq!('+'.class(), TokenClass::Operator);
        assert!('é'.has_text("é"));
        assert!(!'e'.has_text("ee"));
    }

    #[test]
    fn lexeme_debug() {
        let tokens = [
            Lexeme::new(TokenClass::Name, "x"),
            Lexeme::bare(TokenClass::Indent),
        ];
        insta::assert_compact_debug_snapshot!(tokens, @r#"[NAME("x"), INDENT]"#);
        assert!(tokens[0].has_text("x"));
        assert!(!tokens[1].has_text(""));
    }
}
