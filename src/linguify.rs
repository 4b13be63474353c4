//! Turns parsed grammar descriptions into languages.
//!
//! Parameter names and lifts only matter to code that builds typed trees from
//! the forest, so they leave no trace in the language.

use std::rc::Rc;

use crate::{
    engine::RuleTable,
    lang::{self, Lang, Terminal, alt_all, concat_all, literal, opt, rep, sep_by},
    production::{Production, ProductionPart},
    rule::Rule,
    token::Token,
};

pub(crate) fn linguify_rules<T: Token>(rules: &[Rule]) -> RuleTable<T> {
    rules
        .iter()
        .map(|rule| (Rc::<str>::from(rule.name.as_str()), linguify(rule)))
        .collect()
}

/// The choice between every alternate of `rule`.
pub(crate) fn linguify<T: Token>(rule: &Rule) -> Lang<T> {
    alt_all(
        rule.alternates
            .iter()
            .map(|alternate| production(&alternate.production)),
    )
}

fn production<T: Token>(production: &Production) -> Lang<T> {
    match production {
        Production::Alias { rule } => lang::rule(rule.as_str()),
        Production::Named { parts, .. } => sequence(parts),
    }
}

fn sequence<T: Token>(parts: &[ProductionPart]) -> Lang<T> {
    concat_all(parts.iter().map(part))
}

fn part<T: Token>(p: &ProductionPart) -> Lang<T> {
    match p {
        ProductionPart::Literal(text) => literal(Terminal::Text(text.as_str().into())),
        ProductionPart::Special(class) => literal(Terminal::Class(*class)),
        ProductionPart::Rule(name) => lang::rule(name.as_str()),
        ProductionPart::Repeat(inner) => rep(part(inner)),
        ProductionPart::Optional(inner) => opt(part(inner)),
        ProductionPart::Separated { item, separator } => sep_by(part(item), sequence(separator)),
        ProductionPart::Param { part: inner, .. } | ProductionPart::Lifted(inner) => part(inner),
        ProductionPart::Group(parts) => sequence(parts),
    }
}
