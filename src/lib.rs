#![forbid(unsafe_code)]
#![warn(explicit_outlives_requirements)]
#![warn(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![warn(missing_copy_implementations)]
#![warn(redundant_lifetimes)]
//#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]
#![allow(clippy::must_use_candidate)]
//! Parsing with Brzozowski derivatives, generalised to produce every parse of
//! an input as a shared packed parse forest.
//!
//! A [`Grammar`] is compiled from a BNF-style description:
//!
//! ```text
//! # comments start with a hash
//! <expr> ::= Add left: <expr> '+' right: NUMBER
//!          | Num NUMBER
//! <args> ::= Args items: <expr>&{','}
//! ```
//!
//! Each alternate is either a lone `<rule>` or a capitalized head name
//! followed by its parts: quoted literals, special token names such as
//! `NUMBER` or `NEWLINE`, rule references and brace groups, with the postfix
//! modifiers `*`, `?` and `&{separator}`. Parameter names (`name: part`) and
//! lifts (`@part`) are kept in the parsed [`Production`]s and have no effect on
//! what is accepted.
//!
//! [`Grammar::parse_rule`] then derives a rule by each input token in turn and
//! returns the resulting [`Forest`]: empty when nothing parses, with several
//! alternatives when the input is ambiguous.

mod collapse;
mod config;
mod debug;
mod engine;
mod error;
mod forest;
mod grammar;
pub mod lang;
mod lexing;
mod linguify;
mod memo;
mod production;
mod proptesting;
mod rule;
mod scanner;
mod token;

pub use config::GrammarConfig;
pub use error::{FailureReason, GrammarError, ParseError};
pub use forest::{Forest, ParseTree};
pub use grammar::Grammar;
pub use memo::CellId;
pub use production::{Production, ProductionPart};
pub use rule::{Alternate, Rule, parse_description};
pub use token::{Lexeme, Token, TokenClass};
