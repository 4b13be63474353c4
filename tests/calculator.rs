use std::{fs, iter::Peekable, str::Chars};

use derivgram::{Grammar, Lexeme, ParseTree, Production, TokenClass, parse_description};

const CALC: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/grammars/calc.bnf");

fn calculator() -> Grammar {
    Grammar::compile(CALC).unwrap_or_else(|e| panic!("{e}"))
}

fn take_while(chars: &mut Peekable<Chars<'_>>, first: char, pred: fn(&char) -> bool) -> String {
    let mut word = String::from(first);
    while let Some(c) = chars.next_if(pred) {
        word.push(c);
    }
    word
}

/// One statement per line, each ending in a `NEWLINE` token.
fn lex(src: &str) -> Vec<Lexeme> {
    let mut tokens = vec![];
    for line in src.lines() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            let token = if c.is_whitespace() {
                continue;
            } else if c.is_ascii_digit() {
                Lexeme::new(TokenClass::Number, take_while(&mut chars, c, char::is_ascii_digit))
            } else if c.is_alphabetic() {
                Lexeme::new(TokenClass::Name, take_while(&mut chars, c, |c| c.is_alphanumeric()))
            } else {
                let class = TokenClass::of_punctuation(c).unwrap_or(TokenClass::Operator);
                Lexeme::new(class, c.to_string())
            };
            tokens.push(token);
        }
        tokens.push(Lexeme::bare(TokenClass::Newline));
    }
    tokens
}

#[test]
fn compiles_from_file() {
    let grammar = calculator();
    assert_eq!(grammar.rule_names(), ["expr", "stmt", "term"]);
}

#[test]
fn statements_parse_once() {
    let grammar = calculator();
    let srcs = [
        "print 1",
        "print 1 + 2 + 3",
        "print (1)",
        "x = f()",
        "x = f(1, 2 + y)",
        "total = (a + b) + g(h(c), 4)",
    ];
    for src in srcs {
        let forest = grammar.parse_rule("stmt", lex(src));
        assert_eq!(forest.len(), 1, "{src}: {forest:?}");
    }
}

#[test]
fn rejected_statements() {
    let grammar = calculator();
    let srcs = ["print 1 +", "x =", "print f(1,)", "print (1", "1 = x", "print 1 2"];
    for src in srcs {
        let forest = grammar.parse_rule("stmt", lex(src));
        assert!(forest.is_empty(), "{src}: {forest:?}");
    }
}

#[test]
fn newline_is_required() {
    let grammar = calculator();
    let mut tokens = lex("print 1");
    assert_eq!(tokens.pop(), Some(Lexeme::bare(TokenClass::Newline)));
    assert!(grammar.parse_rule("stmt", tokens).is_empty());
}

#[test]
fn empty_argument_list_is_an_empty_repetition() {
    let grammar = calculator();
    let forest = grammar.parse_rule("term", lex("f()").into_iter().filter(|t| t.class != TokenClass::Newline));
    assert_eq!(forest.len(), 1);

    fn has_empty_rep(tree: &ParseTree<Lexeme>) -> bool {
        match tree {
            ParseTree::Rep(items) => items.is_empty(),
            ParseTree::Pair(l, r) => l.iter().chain(r.iter()).any(has_empty_rep),
            ParseTree::Empty | ParseTree::Eps | ParseTree::Char(_) => false,
        }
    }
    assert!(forest.iter().any(has_empty_rep), "{forest:?}");
}

#[test]
fn grammar_is_reusable() {
    let grammar = calculator();
    for _ in 0..3 {
        assert_eq!(grammar.parse_rule("stmt", lex("x = 1 + 2")).len(), 1);
        assert!(grammar.parse_rule("stmt", lex("x = + 2")).is_empty());
    }
}

#[test]
fn description_structure() {
    let src = fs::read_to_string(CALC).unwrap_or_else(|e| panic!("{e}"));
    let rules = parse_description(&src).unwrap_or_else(|e| panic!("{e}"));

    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["stmt", "expr", "term"]);

    let term = &rules[2];
    let lines: Vec<_> = term.alternates.iter().map(|a| a.line).collect();
    assert_eq!(lines, [10, 11, 12, 13]);
    assert_eq!(
        term.alternates[2].production.to_string(),
        "Call callee: NAME '(' args: <expr>&{ ',' } ')'"
    );
    assert_eq!(term.nonterminals(), ["expr"]);

    let expr = &rules[1];
    assert_eq!(
        expr.alternates[1].production,
        Production::Alias {
            rule: "term".into()
        }
    );
    assert_eq!(expr.nonterminals(), ["term", "expr"]);
}
