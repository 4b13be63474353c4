#![cfg(test)]
use crate::engine::{Engine, table};
use crate::forest::{Forest, ParseTree};
use crate::lang::{self, Lang, Terminal, literal, rep};
use crate::lexing::{split_alternates, tokenize};
use crate::production::{Production, ProductionPart, parse_alternate};
use crate::scanner::Segment;
use crate::token::{Lexeme, Token, TokenClass};
use display_tree::AsTree;
use proptest::prelude::*;
use proptest::prop_oneof;

const RULE_NAME: &str = "[a-z][a-z0-9_]{0,5}";
const PARAM_NAME: &str = "[a-z][a-z0-9]{0,4}";
const HEAD_NAME: &str = "[A-Z][a-z]{1,5}";
const SINGLE_QUOTABLE: &str = "[a-z+*|,;(){}<>:@&?\"]{1,3}";
const DOUBLE_QUOTABLE: &str = "[a-z+*|,;(){}<>:@&?']{1,3}";

fn atom_strategy() -> impl Strategy<Value = ProductionPart> {
    prop_oneof![
        SINGLE_QUOTABLE.prop_map(ProductionPart::Literal),
        DOUBLE_QUOTABLE.prop_map(ProductionPart::Literal),
        any::<TokenClass>().prop_map(ProductionPart::Special),
        RULE_NAME.prop_map(ProductionPart::Rule),
    ]
}

/// `part`, or `part` under one of the prefix forms.
fn prefixed(
    part: impl Strategy<Value = ProductionPart> + Clone,
) -> impl Strategy<Value = ProductionPart> + Clone {
    prop_oneof![
        3 => part.clone(),
        1 => (PARAM_NAME, part.clone()).prop_map(|(name, part)| ProductionPart::Param {
            name,
            part: Box::new(part),
        }),
        1 => part.prop_map(|part| ProductionPart::Lifted(Box::new(part))),
    ]
}

/// Parts shaped the way the parser builds them: postfix modifiers never
/// apply directly to a prefix form.
fn part_strategy() -> impl Strategy<Value = ProductionPart> {
    let operand = atom_strategy().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|part| ProductionPart::Repeat(Box::new(part))),
            inner
                .clone()
                .prop_map(|part| ProductionPart::Optional(Box::new(part))),
            (inner.clone(), prop::collection::vec(prefixed(inner.clone()), 1..3)).prop_map(
                |(item, separator)| ProductionPart::Separated {
                    item: Box::new(item),
                    separator,
                }
            ),
            prop::collection::vec(prefixed(inner), 1..3).prop_map(ProductionPart::Group),
        ]
    });
    prefixed(operand)
}

fn production_strategy() -> impl Strategy<Value = Production> {
    prop_oneof![
        1 => RULE_NAME.prop_map(|rule| Production::Alias { rule }),
        4 => (HEAD_NAME, prop::collection::vec(part_strategy(), 0..4))
            .prop_map(|(name, parts)| Production::Named { name, parts }),
    ]
}

fn forest_strategy() -> impl Strategy<Value = Forest<char>> {
    let leaf = prop_oneof![
        Just(ParseTree::Empty),
        Just(ParseTree::Eps),
        prop::char::range('a', 'e').prop_map(ParseTree::Char),
    ];
    let tree = leaf.prop_recursive(4, 32, 3, |inner| {
        let forest = prop::collection::vec(inner, 0..3).prop_map(Forest::from);
        prop_oneof![
            (forest.clone(), forest.clone()).prop_map(|(l, r)| ParseTree::Pair(l, r)),
            forest.prop_map(ParseTree::Rep),
        ]
    });
    prop::collection::vec(tree, 0..3).prop_map(Forest::from)
}

fn reparse(p: &Production) -> Production {
    let text = p.to_string();
    let pieces = tokenize(&[Segment { line: 1, text: &text }]).unwrap_or_else(|e| panic!("{e}"));
    let mut alternates = split_alternates(pieces);
    assert_eq!(alternates.len(), 1, "{text} split into several alternates");
    let pieces = alternates.pop().unwrap_or_default();
    parse_alternate(&pieces, 1).unwrap_or_else(|e| panic!("{text}: {e}"))
}

proptest! {
    #[test]
    fn display_roundtrip(original in production_strategy()) {
        let actual = reparse(&original);
        prop_assert_eq!(actual, original);
    }

    #[test]
    fn collapse_is_idempotent(forest in forest_strategy()) {
        let once = forest.collapse();
        let twice = once.collapse();
        if once != twice {
            eprintln!("Once:\n{}\nTwice:\n{}", AsTree::new(&once), AsTree::new(&twice));
        }
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn collapse_leaves_no_empty_trees(forest in forest_strategy()) {
        fn clean(forest: &Forest<char>) -> bool {
            forest.iter().all(|tree| match tree {
                ParseTree::Empty => false,
                ParseTree::Eps | ParseTree::Char(_) => true,
                ParseTree::Pair(l, r) => !l.is_eps() && !r.is_eps() && clean(l) && clean(r),
                ParseTree::Rep(inner) => clean(inner),
            })
        }
        prop_assert!(clean(&forest.collapse()));
    }

    #[test]
    fn class_literals_accept_their_class(class in any::<TokenClass>(), other in any::<TokenClass>()) {
        let engine = Engine::new(table::<Lexeme>([]));
        let token = Lexeme::bare(other);
        let derived = engine.derive(&literal(Terminal::Class(class)), &token);
        if class == other {
            prop_assert!(engine.is_nullable(&derived));
            prop_assert_eq!(engine.parse_null(&derived), Forest::leaf(token));
        } else {
            prop_assert_eq!(derived, Lang::Empty);
        }
    }

    #[test]
    fn constants_derive_to_nothing(c in any::<char>()) {
        let engine = Engine::new(table::<char>([]));
        prop_assert_eq!(engine.derive(&lang::empty(), &c), Lang::Empty);
        prop_assert_eq!(engine.derive(&lang::eps(), &c), Lang::Empty);
        prop_assert!(engine.is_nullable(&rep(literal(Terminal::Exact(c)))));
        prop_assert_eq!(c.class() == TokenClass::Number, c.is_ascii_digit());
    }
}
