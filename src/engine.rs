//! Brzozowski derivatives over [`Lang`] terms, generalised to build parse
//! forests.
//!
//! Rule references are never expanded eagerly. Deriving one registers a delay
//! cell in the [`Memo`] and returns it unforced, which is what lets
//! left-recursive and mutually recursive rules terminate. The nullability
//! checks `derive` makes on the left of a sequence do force cells, but only
//! ones of strictly shallower derivation depth than the cell being computed.
//! Nullability and null forests are computed as least fixed points over the
//! cyclic graph of cells.

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    forest::{Forest, ParseTree},
    lang::{Lang, alt, concat, epsilon, red},
    memo::{CellId, Memo, Source},
    token::Token,
};

/// Named rule definitions, read-only once built.
pub(crate) struct RuleTable<T> {
    rules: HashMap<Rc<str>, Lang<T>>,
    nullable: HashMap<Rc<str>, bool>,
}

impl<T: Token> RuleTable<T> {
    pub(crate) fn new(rules: HashMap<Rc<str>, Lang<T>>) -> RuleTable<T> {
        let mut nullable: HashMap<Rc<str>, bool> =
            rules.keys().map(|name| (Rc::clone(name), false)).collect();

        // Kleene iteration: a rule only ever flips from "no" to "yes".
        let mut changed = true;
        while changed {
            changed = false;
            for (name, definition) in &rules {
                if !nullable[name] && Self::statically_nullable(definition, &nullable) {
                    nullable.insert(Rc::clone(name), true);
                    changed = true;
                }
            }
        }
        RuleTable { rules, nullable }
    }

    fn statically_nullable(l: &Lang<T>, known: &HashMap<Rc<str>, bool>) -> bool {
        match l {
            Lang::Empty | Lang::Literal(_) => false,
            Lang::Epsilon(_) | Lang::Rep(_) => true,
            Lang::RuleRef(name) => known.get(name).copied().unwrap_or(false),
            Lang::Concat(a, b) => {
                Self::statically_nullable(a, known) && Self::statically_nullable(b, known)
            }
            Lang::Alt(a, b) => {
                Self::statically_nullable(a, known) || Self::statically_nullable(b, known)
            }
            Lang::Red(a, _) => Self::statically_nullable(a, known),
            Lang::Delayed(id) => {
                panic!("rule definitions cannot contain derived terms, found cell {id}")
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Lang<T>> {
        self.rules.get(name)
    }

    pub(crate) fn is_nullable(&self, name: &str) -> bool {
        self.nullable.get(name).copied().unwrap_or(false)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|name| &**name)
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }
}

/// A node of the cyclic term graph that a fixed-point computation may re-enter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Rule(Rc<str>),
    Cell(CellId),
}

/// Bookkeeping for one nullability or null-forest traversal.
///
/// Re-entering a node that is still being evaluated yields the bottom value
/// ("not nullable", no parses). `lowest` records the shallowest such node that
/// was consulted, so that results depending on a provisional value further up
/// the stack are not cached.
#[derive(Debug, Default)]
struct Visit {
    in_progress: HashMap<Node, usize>,
    lowest: Option<usize>,
}

impl Visit {
    fn consult(&mut self, node: &Node) -> bool {
        match self.in_progress.get(node) {
            Some(&depth) => {
                self.lowest = Some(self.lowest.map_or(depth, |l| l.min(depth)));
                true
            }
            None => false,
        }
    }

    /// Runs `f` with `node` marked as in progress. Returns the result and
    /// whether it is final, i.e. relied on no provisional value but its own.
    fn enter<R>(&mut self, node: Node, f: impl FnOnce(&mut Visit) -> R) -> (R, bool) {
        let depth = self.in_progress.len();
        self.in_progress.insert(node.clone(), depth);
        let outer = self.lowest.take();

        let result = f(self);

        self.in_progress.remove(&node);
        let inner = std::mem::replace(&mut self.lowest, outer);
        let is_final = match inner {
            Some(lowest) if lowest < depth => {
                self.lowest = Some(self.lowest.map_or(lowest, |l| l.min(lowest)));
                false
            }
            _ => true,
        };
        (result, is_final)
    }
}

pub(crate) struct Engine<T> {
    rules: RuleTable<T>,
    memo: Memo<T>,
}

impl<T: Token> Engine<T> {
    pub(crate) fn new(rules: RuleTable<T>) -> Engine<T> {
        Engine {
            rules,
            memo: Memo::default(),
        }
    }

    pub(crate) fn rules(&self) -> &RuleTable<T> {
        &self.rules
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.memo.len()
    }

    /// Releases every derivative cell. Terms still holding a `Delayed` from
    /// before must not be used afterwards.
    pub(crate) fn clear_cache(&self) {
        self.memo.clear();
    }

    /// The language of what may follow once `token` has been consumed.
    pub(crate) fn derive(&self, l: &Lang<T>, token: &T) -> Lang<T> {
        match l {
            Lang::Empty | Lang::Epsilon(_) => Lang::Empty,
            Lang::Literal(terminal) => {
                if terminal.matches(token) {
                    epsilon(Forest::leaf(token.clone()))
                } else {
                    Lang::Empty
                }
            }
            Lang::RuleRef(name) => {
                if self.rules.get(name).is_some() {
                    Lang::Delayed(self.memo.rule_cell(name, token))
                } else {
                    Lang::Empty
                }
            }
            Lang::Delayed(id) => {
                if let Some(Lang::Empty) = self.memo.cell(*id).value.get() {
                    Lang::Empty
                } else {
                    Lang::Delayed(self.memo.child_cell(*id, token))
                }
            }
            Lang::Concat(left, right) => {
                let consumed_left = concat(self.derive(left, token), Lang::clone(right));
                if self.is_nullable(left) {
                    let skipped_left = concat(epsilon(self.parse_null(left)), self.derive(right, token));
                    alt(consumed_left, skipped_left)
                } else {
                    consumed_left
                }
            }
            Lang::Alt(a, b) => alt(self.derive(a, token), self.derive(b, token)),
            Lang::Rep(a) => concat(self.derive(a, token), l.clone()),
            Lang::Red(a, f) => match self.derive(a, token) {
                Lang::Empty => Lang::Empty,
                derived => red(derived, f.clone()),
            },
        }
    }

    /// The value of a delay cell, computing it on first use.
    pub(crate) fn force(&self, id: CellId) -> Lang<T> {
        let cell = self.memo.cell(id);
        if let Some(value) = cell.value.get() {
            return value.clone();
        }
        assert!(
            !cell.forcing.replace(true),
            "delay cell {id} was re-entered while its derivative was being computed"
        );
        let base = match &cell.source {
            Source::Rule(name) => self.rules.get(name).cloned().unwrap_or(Lang::Empty),
            Source::Cell(parent) => self.force(*parent),
        };
        let value = self.derive(&base, &cell.token);
        log::trace!("forced cell {id}: {value:?}");
        cell.forcing.set(false);
        cell.value.get_or_init(|| value).clone()
    }

    /// Forces a chain of delayed terms down to the first term that is not
    /// itself a delay. A chain that loops back on itself denotes no language.
    pub(crate) fn resolve(&self, mut l: Lang<T>) -> Lang<T> {
        let mut seen = HashSet::new();
        while let Lang::Delayed(id) = l {
            if !seen.insert(id) {
                return Lang::Empty;
            }
            l = self.force(id);
        }
        l
    }

    /// Forces the cells a top-level term mentions and folds away those that
    /// turned out to be `Empty` or an epsilon, without entering cell values.
    ///
    /// Must only be called outside of any forcing, i.e. between input tokens.
    pub(crate) fn compact(&self, l: &Lang<T>) -> Lang<T> {
        match l {
            Lang::Empty | Lang::Epsilon(_) | Lang::Literal(_) | Lang::RuleRef(_) => l.clone(),
            Lang::Delayed(_) => match self.resolve(l.clone()) {
                resolved @ (Lang::Empty | Lang::Epsilon(_)) => resolved,
                _ => l.clone(),
            },
            Lang::Concat(a, b) => concat(self.compact(a), self.compact(b)),
            Lang::Alt(a, b) => alt(self.compact(a), self.compact(b)),
            Lang::Rep(_) => l.clone(),
            Lang::Red(a, f) => red(self.compact(a), f.clone()),
        }
    }

    pub(crate) fn is_nullable(&self, l: &Lang<T>) -> bool {
        self.nullable_in(l, &mut Visit::default())
    }

    fn nullable_in(&self, l: &Lang<T>, visit: &mut Visit) -> bool {
        match l {
            Lang::Empty | Lang::Literal(_) => false,
            Lang::Epsilon(_) | Lang::Rep(_) => true,
            Lang::RuleRef(name) => self.rules.is_nullable(name),
            Lang::Concat(a, b) => self.nullable_in(a, visit) && self.nullable_in(b, visit),
            Lang::Alt(a, b) => self.nullable_in(a, visit) || self.nullable_in(b, visit),
            Lang::Red(a, _) => self.nullable_in(a, visit),
            Lang::Delayed(id) => self.cell_nullable(*id, visit),
        }
    }

    fn cell_nullable(&self, id: CellId, visit: &mut Visit) -> bool {
        let cell = self.memo.cell(id);
        if let Some(nullable) = cell.nullable.get() {
            return *nullable;
        }
        let node = Node::Cell(id);
        if visit.consult(&node) {
            return false;
        }
        let value = self.force(id);
        let (nullable, is_final) = visit.enter(node, |visit| self.nullable_in(&value, visit));
        // Approximations only ever err towards "no", so "yes" is always final.
        if nullable || is_final {
            let _ = cell.nullable.set(nullable);
        }
        nullable
    }

    /// Every way `l` matches the empty input.
    pub(crate) fn parse_null(&self, l: &Lang<T>) -> Forest<T> {
        self.null_in(l, &mut Visit::default())
    }

    fn null_in(&self, l: &Lang<T>, visit: &mut Visit) -> Forest<T> {
        match l {
            Lang::Empty | Lang::Literal(_) => Forest::empty(),
            Lang::Epsilon(thunk) => thunk.force(),
            Lang::RuleRef(name) => self.rule_null(name, visit),
            Lang::Concat(a, b) => {
                let left = self.null_in(a, visit);
                if left.is_empty() {
                    return left;
                }
                Forest::pair(left, self.null_in(b, visit))
            }
            Lang::Alt(a, b) => self.null_in(a, visit) + self.null_in(b, visit),
            Lang::Rep(a) => {
                let inner = self.null_in(a, visit);
                if inner.is_empty() {
                    Forest::eps()
                } else {
                    Forest::from(ParseTree::Rep(inner))
                }
            }
            Lang::Red(a, f) => f.apply(self.null_in(a, visit)),
            Lang::Delayed(id) => self.cell_null(*id, visit),
        }
    }

    fn rule_null(&self, name: &Rc<str>, visit: &mut Visit) -> Forest<T> {
        if !self.rules.is_nullable(name) {
            return Forest::empty();
        }
        if let Some(forest) = self.memo.rule_forest(name) {
            return forest;
        }
        let node = Node::Rule(Rc::clone(name));
        if visit.consult(&node) {
            return Forest::empty();
        }
        let Some(definition) = self.rules.get(name) else {
            return Forest::empty();
        };
        let (forest, is_final) = visit.enter(node, |visit| self.null_in(definition, visit));
        if is_final {
            self.memo.store_rule_forest(name, forest.clone());
        }
        forest
    }

    fn cell_null(&self, id: CellId, visit: &mut Visit) -> Forest<T> {
        let cell = self.memo.cell(id);
        if let Some(forest) = cell.null_forest.get() {
            return forest.clone();
        }
        let node = Node::Cell(id);
        if visit.consult(&node) {
            return Forest::empty();
        }
        let value = self.force(id);
        let (forest, is_final) = visit.enter(node, |visit| self.null_in(&value, visit));
        if is_final {
            let _ = cell.null_forest.set(forest.clone());
        }
        forest
    }
}

impl<T: Token> FromIterator<(Rc<str>, Lang<T>)> for RuleTable<T> {
    fn from_iter<I: IntoIterator<Item = (Rc<str>, Lang<T>)>>(iter: I) -> Self {
        RuleTable::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) fn table<T: Token>(rules: impl IntoIterator<Item = (&'static str, Lang<T>)>) -> RuleTable<T> {
    rules
        .into_iter()
        .map(|(name, l)| (Rc::<str>::from(name), l))
        .collect()
}
