use std::{
    fmt::Debug,
    ops::{Add, Deref},
    rc::Rc,
};

/// A shared packed parse forest: every parse of one span, as a flat set of
/// alternatives.
///
/// Forests are immutable once built and clone in constant time, so sub-forests
/// reached through several derivatives are shared rather than copied.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Forest<T>(Rc<[ParseTree<T>]>);

/// One alternative of a [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseTree<T> {
    Empty,
    /// Zero tokens matched.
    Eps,
    Char(T),
    Pair(Forest<T>, Forest<T>),
    /// A repetition. When built by the list combinators the inner forest holds
    /// the items in order rather than alternatives.
    Rep(Forest<T>),
}

impl<T> Forest<T> {
    /// No parses at all.
    pub fn empty() -> Forest<T> {
        Forest(Rc::new([]))
    }

    /// The single parse of the empty input.
    pub fn eps() -> Forest<T> {
        Forest::from(ParseTree::Eps)
    }

    pub fn leaf(token: T) -> Forest<T> {
        Forest::from(ParseTree::Char(token))
    }

    /// Sequencing: one `Pair` alternative, or no parse if either side has none.
    pub fn pair(left: Forest<T>, right: Forest<T>) -> Forest<T> {
        if left.is_empty() || right.is_empty() {
            Forest::empty()
        } else {
            Forest::from(ParseTree::Pair(left, right))
        }
    }

    /// Whether this is exactly the single `Eps` alternative.
    pub fn is_eps(&self) -> bool {
        matches!(&*self.0, [ParseTree::Eps])
    }

    pub fn trees(&self) -> &[ParseTree<T>] {
        &self.0
    }
}

impl<T> Deref for Forest<T> {
    type Target = [ParseTree<T>];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<ParseTree<T>> for Forest<T> {
    fn from(tree: ParseTree<T>) -> Self {
        Forest(Rc::new([tree]))
    }
}

impl<T> From<Vec<ParseTree<T>>> for Forest<T> {
    fn from(trees: Vec<ParseTree<T>>) -> Self {
        Forest(trees.into())
    }
}

impl<T> FromIterator<ParseTree<T>> for Forest<T> {
    fn from_iter<I: IntoIterator<Item = ParseTree<T>>>(iter: I) -> Self {
        Forest(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Forest<T> {
    type Item = &'a ParseTree<T>;
    type IntoIter = std::slice::Iter<'a, ParseTree<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Union of two forests. Nested choices are flattened and duplicates kept, so
/// two distinct derivations of the same tree stay visible as ambiguity.
impl<T: Clone> Add for Forest<T> {
    type Output = Forest<T>;
    fn add(self, rhs: Forest<T>) -> Forest<T> {
        if self.is_empty() {
            rhs
        } else if rhs.is_empty() {
            self
        } else {
            self.iter().chain(rhs.iter()).cloned().collect()
        }
    }
}

impl<T: Debug> Debug for Forest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Reshapes the raw forests of the repetition combinators into flat lists.
///
/// A repetition matched over the input shows up as a right-nested chain of
/// `Pair(item, rest)` ending in `Eps` (or in `Rep` when the repeated term
/// matched nothing). These functions read such chains back into sequences.
pub(crate) mod lists {
    use super::{Forest, ParseTree};

    /// Every item sequence a repetition forest can stand for.
    /// `pick` turns one element forest of the chain into the item alternatives.
    fn unroll<T: Clone>(
        forest: &Forest<T>,
        pick: &impl Fn(&Forest<T>) -> Forest<T>,
    ) -> Vec<Vec<ParseTree<T>>> {
        let mut sequences = vec![];
        for tree in forest {
            match tree {
                ParseTree::Empty => {}
                ParseTree::Eps | ParseTree::Rep(_) => sequences.push(vec![]),
                ParseTree::Pair(element, rest) => {
                    let tails = unroll(rest, pick);
                    for item in &pick(element) {
                        for tail in &tails {
                            let mut sequence = Vec::with_capacity(tail.len() + 1);
                            sequence.push(item.clone());
                            sequence.extend(tail.iter().cloned());
                            sequences.push(sequence);
                        }
                    }
                }
                ParseTree::Char(_) => {
                    panic!("repetition forest holds a bare token where a pair chain was expected")
                }
            }
        }
        sequences
    }

    fn into_lists<T>(sequences: Vec<Vec<ParseTree<T>>>) -> Forest<T> {
        sequences
            .into_iter()
            .map(|items| ParseTree::Rep(Forest::from(items)))
            .collect()
    }

    fn same<T: Clone>(element: &Forest<T>) -> Forest<T> {
        element.clone()
    }

    /// The item half of each `Pair(separator, item)` chain element.
    fn after_separator<T: Clone>(element: &Forest<T>) -> Forest<T> {
        element
            .iter()
            .map(|tree| match tree {
                ParseTree::Pair(_, item) => item.clone(),
                other => panic!(
                    "separated repetition expected a separator/item pair, found {}",
                    super::tree_kind(other)
                ),
            })
            .fold(Forest::empty(), |acc, item| acc + item)
    }

    fn head_and_tail<T: Clone>(
        forest: &Forest<T>,
        pick: &impl Fn(&Forest<T>) -> Forest<T>,
        allow_empty: bool,
    ) -> Forest<T> {
        let mut sequences = vec![];
        for tree in forest {
            match tree {
                ParseTree::Empty => {}
                ParseTree::Eps if allow_empty => sequences.push(vec![]),
                ParseTree::Pair(head, rest) => {
                    let tails = unroll(rest, pick);
                    for item in head {
                        for tail in &tails {
                            let mut sequence = vec![item.clone()];
                            sequence.extend(tail.iter().cloned());
                            sequences.push(sequence);
                        }
                    }
                }
                other => panic!(
                    "list reduction expected a head/tail pair, found {}",
                    super::tree_kind(other)
                ),
            }
        }
        into_lists(sequences)
    }

    /// `a a*` as one flat list.
    pub(crate) fn one_or_more<T: Clone>(forest: Forest<T>) -> Forest<T> {
        head_and_tail(&forest, &same, false)
    }

    /// `ε | a (sep a)*` as one flat list of the `a`s.
    pub(crate) fn separated<T: Clone>(forest: Forest<T>) -> Forest<T> {
        head_and_tail(&forest, &after_separator, true)
    }
}

pub(crate) fn tree_kind<T>(tree: &ParseTree<T>) -> &'static str {
    match tree {
        ParseTree::Empty => "Empty",
        ParseTree::Eps => "Eps",
        ParseTree::Char(_) => "Char",
        ParseTree::Pair(..) => "Pair",
        ParseTree::Rep(_) => "Rep",
    }
}
