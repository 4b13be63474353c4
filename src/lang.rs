//! Formal languages as terms.
//!
//! Terms are only built through the smart constructors in this module, which
//! keep them in a canonical enough shape for the derivative engine: `Empty`
//! never survives inside a sequence or a choice, and epsilons are folded into
//! reductions as soon as they appear.

use std::{
    cell::LazyCell,
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::{
    forest::{Forest, lists},
    memo::CellId,
    token::{Token, TokenClass},
};

/// What a `Literal` accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminal<T> {
    /// A token equal to this one.
    Exact(T),
    /// Any token whose text is exactly this.
    Text(Rc<str>),
    /// Any token of this class.
    Class(TokenClass),
}

impl<T: Token> Terminal<T> {
    pub fn matches(&self, token: &T) -> bool {
        match self {
            Terminal::Exact(t) => t == token,
            Terminal::Text(text) => token.has_text(text),
            Terminal::Class(class) => token.class() == *class,
        }
    }
}

impl<T: Debug> Display for Terminal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminal::Exact(t) => write!(f, "{t:?}"),
            Terminal::Text(text) => write!(f, "'{text}'"),
            Terminal::Class(class) => write!(f, "{class}"),
        }
    }
}

type LazyForest<T> = LazyCell<Forest<T>, Box<dyn FnOnce() -> Forest<T>>>;

/// The forest an epsilon stands for, computed at most once.
#[derive(Clone)]
pub struct Thunk<T>(Rc<LazyForest<T>>);

impl<T: Clone> Thunk<T> {
    pub fn new(f: impl FnOnce() -> Forest<T> + 'static) -> Thunk<T> {
        let f: Box<dyn FnOnce() -> Forest<T>> = Box::new(f);
        Thunk(Rc::new(LazyCell::new(f)))
    }

    pub fn force(&self) -> Forest<T> {
        LazyCell::force(&self.0).clone()
    }
}

impl<T> Debug for Thunk<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Thunk")
    }
}

impl<T> PartialEq for Thunk<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A forest transformation attached to a term by [`red`].
#[derive(Clone)]
pub struct Reduction<T>(Rc<dyn Fn(Forest<T>) -> Forest<T>>);

impl<T: Clone + 'static> Reduction<T> {
    pub fn new(f: impl Fn(Forest<T>) -> Forest<T> + 'static) -> Reduction<T> {
        Reduction(Rc::new(f))
    }

    /// Runs the reduction. A forest with no parses stays without parses.
    pub fn apply(&self, forest: Forest<T>) -> Forest<T> {
        if forest.is_empty() {
            forest
        } else {
            (self.0)(forest)
        }
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Reduction<T>) -> Reduction<T> {
        let (first, second) = (self.clone(), next.clone());
        Reduction::new(move |forest| second.apply(first.apply(forest)))
    }
}

impl<T> Debug for Reduction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reduction")
    }
}

impl<T> PartialEq for Reduction<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A language over tokens of type `T`.
#[derive(Clone)]
pub enum Lang<T> {
    Empty,
    Epsilon(Thunk<T>),
    Literal(Terminal<T>),
    /// A reference into the rule table, resolved by name.
    RuleRef(Rc<str>),
    Concat(Rc<Lang<T>>, Rc<Lang<T>>),
    Alt(Rc<Lang<T>>, Rc<Lang<T>>),
    Rep(Rc<Lang<T>>),
    Red(Rc<Lang<T>>, Reduction<T>),
    /// A memoised derivative that has not necessarily been computed yet.
    /// Only the engine creates these.
    Delayed(CellId),
}

impl<T> Lang<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Lang::Empty)
    }
}

impl<T: PartialEq> PartialEq for Lang<T> {
    fn eq(&self, other: &Self) -> bool {
        #![allow(clippy::enum_glob_use)]
        use Lang::*;
        match (self, other) {
            (Empty, Empty) => true,
            (Epsilon(a), Epsilon(b)) => a == b,
            (Literal(a), Literal(b)) => a == b,
            (RuleRef(a), RuleRef(b)) => a == b,
            (Concat(a, b), Concat(c, d)) | (Alt(a, b), Alt(c, d)) => a == c && b == d,
            (Rep(a), Rep(b)) => a == b,
            (Red(a, f), Red(b, g)) => f == g && a == b,
            (Delayed(a), Delayed(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Debug> Debug for Lang<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::Empty => write!(f, "Empty"),
            Lang::Epsilon(_) => write!(f, "Epsilon"),
            Lang::Literal(t) => write!(f, "Literal({t})"),
            Lang::RuleRef(name) => write!(f, "Rule(<{name}>)"),
            Lang::Concat(a, b) => write!(f, "Concat({a:?}, {b:?})"),
            Lang::Alt(a, b) => write!(f, "Alt({a:?}, {b:?})"),
            Lang::Rep(a) => write!(f, "Rep({a:?})"),
            Lang::Red(a, _) => write!(f, "Red({a:?})"),
            Lang::Delayed(id) => write!(f, "Delayed({id})"),
        }
    }
}

pub fn empty<T>() -> Lang<T> {
    Lang::Empty
}

/// Accepts only the empty input, attributing `forest` to it.
pub fn epsilon<T: Clone + 'static>(forest: Forest<T>) -> Lang<T> {
    epsilon_with(move || forest)
}

pub fn epsilon_with<T: Clone + 'static>(f: impl FnOnce() -> Forest<T> + 'static) -> Lang<T> {
    Lang::Epsilon(Thunk::new(f))
}

/// The plain empty match: an epsilon whose forest is a single `Eps`.
pub fn eps<T: Clone + 'static>() -> Lang<T> {
    epsilon(Forest::eps())
}

pub fn literal<T>(terminal: Terminal<T>) -> Lang<T> {
    Lang::Literal(terminal)
}

pub fn rule<T>(name: impl Into<Rc<str>>) -> Lang<T> {
    Lang::RuleRef(name.into())
}

/// `a` then `b`.
///
/// An epsilon operand is dropped and its forest paired back in on the same
/// side once the other operand has matched, so the forest keeps its shape.
pub fn concat<T: Clone + 'static>(a: Lang<T>, b: Lang<T>) -> Lang<T> {
    match (a, b) {
        (Lang::Empty, _) | (_, Lang::Empty) => Lang::Empty,
        (Lang::Epsilon(fixed), other) => red(
            other,
            Reduction::new(move |forest| Forest::pair(fixed.force(), forest)),
        ),
        (other, Lang::Epsilon(fixed)) => red(
            other,
            Reduction::new(move |forest| Forest::pair(forest, fixed.force())),
        ),
        (a, b) => Lang::Concat(Rc::new(a), Rc::new(b)),
    }
}

/// Right-associated sequence; no terms at all is the plain empty match.
pub fn concat_all<T: Clone + 'static>(terms: impl IntoIterator<Item = Lang<T>>) -> Lang<T> {
    let terms: Vec<_> = terms.into_iter().collect();
    terms
        .into_iter()
        .rev()
        .reduce(|rest, term| concat(term, rest))
        .unwrap_or_else(eps)
}

/// `a` or `b`.
pub fn alt<T: Clone + 'static>(a: Lang<T>, b: Lang<T>) -> Lang<T> {
    match (a, b) {
        (Lang::Empty, other) | (other, Lang::Empty) => other,
        (Lang::Epsilon(x), Lang::Epsilon(y)) => epsilon_with(move || x.force() + y.force()),
        (a, b) => Lang::Alt(Rc::new(a), Rc::new(b)),
    }
}

/// Right-associated choice; no terms at all is `Empty`.
pub fn alt_all<T: Clone + 'static>(terms: impl IntoIterator<Item = Lang<T>>) -> Lang<T> {
    let terms: Vec<_> = terms.into_iter().collect();
    terms
        .into_iter()
        .rev()
        .reduce(|rest, term| alt(term, rest))
        .unwrap_or(Lang::Empty)
}

/// Kleene star.
pub fn rep<T>(a: Lang<T>) -> Lang<T> {
    Lang::Rep(Rc::new(a))
}

pub fn opt<T: Clone + 'static>(a: Lang<T>) -> Lang<T> {
    alt(a, eps())
}

/// Attaches `f` to whatever forest `a` ends up matching.
pub fn red<T: Clone + 'static>(a: Lang<T>, f: Reduction<T>) -> Lang<T> {
    match a {
        Lang::Empty => Lang::Empty,
        Lang::Epsilon(thunk) => epsilon_with(move || f.apply(thunk.force())),
        Lang::Red(inner, g) => Lang::Red(inner, g.then(&f)),
        other => Lang::Red(Rc::new(other), f),
    }
}

/// One or more `a`, as a flat list.
pub fn one_or_more<T: Clone + 'static>(a: Lang<T>) -> Lang<T> {
    red(
        concat(a.clone(), rep(a)),
        Reduction::new(lists::one_or_more),
    )
}

/// Zero or more `a` separated by `sep`, as a flat list of the `a`s.
pub fn sep_by<T: Clone + 'static>(a: Lang<T>, sep: Lang<T>) -> Lang<T> {
    red(
        alt(eps(), concat(a.clone(), rep(concat(sep, a)))),
        Reduction::new(lists::separated),
    )
}

/// One or more `a` separated by `sep`, as a flat list of the `a`s.
pub fn sep_by1<T: Clone + 'static>(a: Lang<T>, sep: Lang<T>) -> Lang<T> {
    red(
        concat(a.clone(), rep(concat(sep, a))),
        Reduction::new(lists::separated),
    )
}
