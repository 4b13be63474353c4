use std::{fmt::Debug, fs, path::Path, rc::Rc};

use crate::{
    config::GrammarConfig,
    engine::{Engine, RuleTable},
    error::{GrammarError, ParseError},
    forest::Forest,
    lang::{self, Lang},
    linguify::linguify_rules,
    rule::parse_description,
    token::{Lexeme, Token},
};

/// A compiled set of named rules, together with the derivative cache parses
/// against them share.
///
/// The cache is kept between parses, so repeated parses get cheaper, and is
/// cleared once it grows past [`GrammarConfig::max_cached_cells`]. It is not
/// synchronised, which keeps `Grammar` on one thread.
pub struct Grammar<T = Lexeme> {
    engine: Engine<T>,
    config: GrammarConfig,
}

impl<T: Token> Grammar<T> {
    /// Reads and compiles the grammar description at `path`.
    pub fn compile(path: impl AsRef<Path>) -> Result<Grammar<T>, GrammarError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("compiling grammar {}", path.display());
        Grammar::new(&src)
    }

    /// Compiles a grammar description held in memory.
    pub fn new(src: &str) -> Result<Grammar<T>, GrammarError> {
        let rules = parse_description(src)?;
        Ok(Grammar::from_table(linguify_rules(&rules)))
    }

    /// Builds a grammar from hand-written terms.
    pub fn from_rules<N: Into<Rc<str>>>(rules: impl IntoIterator<Item = (N, Lang<T>)>) -> Grammar<T> {
        rules
            .into_iter()
            .map(|(name, l)| (Into::<Rc<str>>::into(name), l))
            .collect()
    }

    fn from_table(table: RuleTable<T>) -> Grammar<T> {
        log::debug!("built grammar with {} rules", table.len());
        Grammar {
            engine: Engine::new(table),
            config: GrammarConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GrammarConfig) -> Grammar<T> {
        self.config = config;
        self
    }

    pub fn config(&self) -> GrammarConfig {
        self.config
    }

    /// Every parse of `tokens` as rule `name`, with epsilon padding collapsed.
    ///
    /// An empty forest means no parse, and more than one alternative means the
    /// input is ambiguous under this grammar. An unknown rule parses nothing.
    pub fn parse_rule(&self, name: &str, tokens: impl IntoIterator<Item = T>) -> Forest<T> {
        if !self.contains_rule(name) {
            log::debug!("no rule named <{name}>");
            return Forest::empty();
        }

        if self.engine.cell_count() > self.config.cell_limit() {
            self.clear_cache();
        }

        let mut l = lang::rule(name);
        for (n, token) in tokens.into_iter().enumerate() {
            l = self.engine.compact(&self.engine.derive(&l, &token));
            if l.is_empty() {
                log::debug!("<{name}> rejected token {n}: {token:?}");
                return Forest::empty();
            }
        }

        let forest = self.engine.parse_null(&l).collapse();
        log::debug!(
            "<{name}> parsed with {} alternatives, {} cells cached",
            forest.len(),
            self.engine.cell_count()
        );
        forest
    }

    /// As [`parse_rule`](Self::parse_rule), refusing forests with more
    /// alternatives than the configured limit.
    pub fn try_parse_rule(
        &self,
        name: &str,
        tokens: impl IntoIterator<Item = T>,
    ) -> Result<Forest<T>, ParseError> {
        let forest = self.parse_rule(name, tokens);
        let limit = self.config.alternative_limit();
        if forest.len() > limit {
            return Err(ParseError::TooAmbiguous {
                rule: name.to_string(),
                alternatives: forest.len(),
                limit,
            });
        }
        Ok(forest)
    }

    /// Releases the derivative cells kept from earlier parses.
    ///
    /// Terms returned by [`derive`](Self::derive) before the call refer to
    /// released cells and panic when used. [`parse_rule`](Self::parse_rule)
    /// does this by itself once the cache outgrows
    /// [`GrammarConfig::max_cached_cells`].
    pub fn clear_cache(&self) {
        self.engine.clear_cache();
    }

    /// Derivative cells currently cached.
    pub fn cached_cells(&self) -> usize {
        self.engine.cell_count()
    }

    /// The definition of rule `name`, or `Empty` when there is no such rule.
    pub fn get_rule(&self, name: &str) -> Lang<T> {
        self.engine.rules().get(name).cloned().unwrap_or(Lang::Empty)
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.engine.rules().get(name).is_some()
    }

    /// Rule names in alphabetical order.
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.engine.rules().names().collect();
        names.sort_unstable();
        names
    }

    /// One derivative step. Terms from another grammar, or from before a
    /// [`clear_cache`](Self::clear_cache), must not be passed in.
    pub fn derive(&self, l: &Lang<T>, token: &T) -> Lang<T> {
        self.engine.derive(l, token)
    }

    pub fn is_nullable(&self, l: &Lang<T>) -> bool {
        self.engine.is_nullable(l)
    }

    /// The raw forest of empty matches of `l`, before collapsing.
    pub fn parse_null(&self, l: &Lang<T>) -> Forest<T> {
        self.engine.parse_null(l)
    }
}

impl<T: Token> FromIterator<(Rc<str>, Lang<T>)> for Grammar<T> {
    fn from_iter<I: IntoIterator<Item = (Rc<str>, Lang<T>)>>(iter: I) -> Self {
        Grammar::from_table(iter.into_iter().collect())
    }
}

impl<T: Token> Debug for Grammar<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.engine.rules().len())
            .field("cells", &self.engine.cell_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::*;
    use crate::lang::{Terminal, alt, concat, literal, rule};

    fn grammar(src: &str) -> Grammar<char> {
        Grammar::new(src).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn sequence_shape() {
        let g = grammar("<l> ::= L 'x' 'y'");
        assert_compact_debug_snapshot!(g.parse_rule("l", "xy".chars()), @"[Pair([Char('x')], [Char('y')])]");
        assert!(g.parse_rule("l", "xz".chars()).is_empty());
        assert!(g.parse_rule("l", "xyy".chars()).is_empty());
    }

    #[test]
    fn empty_input() {
        let g = grammar("<o> ::= O 'x'?\n<l> ::= L 'x'");
        assert_compact_debug_snapshot!(g.parse_rule("o", []), @"[Eps]");
        assert!(g.parse_rule("l", []).is_empty());
    }

    #[test]
    fn ambiguity_is_kept() {
        let g = grammar("<s> ::= <a> | <b>\n<a> ::= A 'x'\n<b> ::= B NAME");
        let forest = g.parse_rule("s", "x".chars());
        assert_compact_debug_snapshot!(forest, @"[Char('x'), Char('x')]");
    }

    #[test]
    fn unknown_rule() {
        let g = grammar("<a> ::= A 'x'");
        assert!(g.parse_rule("nope", "x".chars()).is_empty());
        assert_eq!(g.get_rule("nope"), Lang::Empty);
        assert!(!g.contains_rule("nope"));
    }

    #[test]
    fn separated_list_is_flat() {
        let g = grammar("<l> ::= L <item>&{','}\n<item> ::= Item NAME");
        let forest = g.parse_rule("l", "a,b,c".chars());
        assert_compact_debug_snapshot!(forest, @"[Rep([Char('a'), Char('b'), Char('c')])]");
        assert_compact_debug_snapshot!(g.parse_rule("l", []), @"[Rep([])]");
        assert!(g.parse_rule("l", "a,".chars()).is_empty());
    }

    #[test]
    fn bounded_ambiguity() {
        let g = grammar("<s> ::= <a> | <b>\n<a> ::= A 'x'\n<b> ::= B NAME")
            .with_config(GrammarConfig::default().max_alternatives(1));
        let err = g.try_parse_rule("s", "x".chars()).unwrap_err();
        assert_eq!(err.to_string(), "rule `s` produced 2 parses, more than the limit of 1");
        assert!(g.try_parse_rule("a", "x".chars()).is_ok());
    }

    #[test]
    fn hand_written_rules() {
        let g = Grammar::from_rules([(
            "l",
            alt(concat(rule("l"), literal(Terminal::Exact('a'))), literal(Terminal::Exact('a'))),
        )]);
        assert_eq!(g.rule_names(), ["l"]);
        assert_eq!(g.parse_rule("l", "aaaa".chars()).len(), 1);
        assert!(g.is_nullable(&g.derive(&g.get_rule("l"), &'a')));
        assert!(!g.is_nullable(&g.get_rule("l")));
    }

    #[test]
    fn cache_stays_bounded() {
        use crate::token::{Lexeme, TokenClass};

        let g: Grammar = Grammar::new("<s> ::= S NAME '=' NUMBER")
            .unwrap_or_else(|e| panic!("{e}"))
            .with_config(GrammarConfig::default().max_cached_cells(10));
        for i in 0..200 {
            let tokens = [
                Lexeme::new(TokenClass::Name, format!("v{i}")),
                Lexeme::new(TokenClass::Equals, "="),
                Lexeme::new(TokenClass::Number, i.to_string()),
            ];
            assert_eq!(g.parse_rule("s", tokens).len(), 1);
            assert!(g.cached_cells() <= 13, "{g:?}");
        }

        g.clear_cache();
        assert_eq!(g.cached_cells(), 0);
        let tokens = [
            Lexeme::new(TokenClass::Name, "x"),
            Lexeme::new(TokenClass::Equals, "="),
            Lexeme::new(TokenClass::Number, "1"),
        ];
        assert_eq!(g.parse_rule("s", tokens).len(), 1);
    }

    #[test]
    fn debug_summary() {
        let g = grammar("<a> ::= A 'x'\n<b> ::= <a>");
        let _ = g.parse_rule("b", "x".chars());
        let summary = format!("{g:?}");
        assert!(summary.starts_with("Grammar { rules: 2, cells: "), "{summary}");
    }
}
