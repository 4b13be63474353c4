use std::{
    cell::{Cell, OnceCell, RefCell},
    collections::HashMap,
    fmt::Display,
    hash::Hash,
    rc::Rc,
};

use crate::{forest::Forest, lang::Lang};

/// Handle of a delay cell inside a [`Memo`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a delay cell's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    /// The derivative of a rule's definition.
    Rule(Rc<str>),
    /// The derivative of another cell's value.
    Cell(CellId),
}

/// A derivative that is registered before it is computed.
///
/// The value is filled in at most once, by the engine, the first time
/// something needs to look at it.
pub(crate) struct DelayCell<T> {
    pub(crate) source: Source,
    pub(crate) token: T,
    pub(crate) value: OnceCell<Lang<T>>,
    pub(crate) forcing: Cell<bool>,
    pub(crate) nullable: OnceCell<bool>,
    pub(crate) null_forest: OnceCell<Forest<T>>,
    derivatives: RefCell<HashMap<T, CellId>>,
}

impl<T> DelayCell<T> {
    fn new(source: Source, token: T) -> DelayCell<T> {
        DelayCell {
            source,
            token,
            value: OnceCell::new(),
            forcing: Cell::new(false),
            nullable: OnceCell::new(),
            null_forest: OnceCell::new(),
            derivatives: RefCell::new(HashMap::new()),
        }
    }
}

/// The derivative cache of one grammar.
///
/// Cells live in an arena and refer to each other by [`CellId`], so the
/// cyclic derivatives of recursive rules never form reference cycles.
///
/// Clearing releases every cell but never reuses an id: `base` is the id of
/// the first live cell.
pub(crate) struct Memo<T> {
    base: Cell<usize>,
    cells: RefCell<Vec<Rc<DelayCell<T>>>>,
    by_rule: RefCell<HashMap<(Rc<str>, T), CellId>>,
    rule_forests: RefCell<HashMap<Rc<str>, Forest<T>>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Memo {
            base: Cell::new(0),
            cells: RefCell::new(Vec::new()),
            by_rule: RefCell::new(HashMap::new()),
            rule_forests: RefCell::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Eq + Hash + std::fmt::Debug> Memo<T> {
    pub(crate) fn cell(&self, id: CellId) -> Rc<DelayCell<T>> {
        let cells = self.cells.borrow();
        let Some(index) = id.0.checked_sub(self.base.get()) else {
            panic!("delay cell {id} was released when the cache was cleared")
        };
        match cells.get(index) {
            Some(cell) => Rc::clone(cell),
            None => panic!("delay cell {id} does not belong to this grammar"),
        }
    }

    fn alloc(&self, source: Source, token: T) -> CellId {
        let mut cells = self.cells.borrow_mut();
        let id = CellId(self.base.get() + cells.len());
        log::trace!("memo: new cell {id} for {source:?} by {token:?}");
        cells.push(Rc::new(DelayCell::new(source, token)));
        id
    }

    /// The cell standing for the derivative of rule `name` by `token`,
    /// registered on first request.
    pub(crate) fn rule_cell(&self, name: &Rc<str>, token: &T) -> CellId {
        let key = (Rc::clone(name), token.clone());
        if let Some(id) = self.by_rule.borrow().get(&key) {
            return *id;
        }
        let id = self.alloc(Source::Rule(Rc::clone(name)), token.clone());
        self.by_rule.borrow_mut().insert(key, id);
        id
    }

    /// The cell standing for the derivative of cell `parent` by `token`.
    pub(crate) fn child_cell(&self, parent: CellId, token: &T) -> CellId {
        let cell = self.cell(parent);
        if let Some(id) = cell.derivatives.borrow().get(token) {
            return *id;
        }
        let id = self.alloc(Source::Cell(parent), token.clone());
        cell.derivatives.borrow_mut().insert(token.clone(), id);
        id
    }

    pub(crate) fn rule_forest(&self, name: &str) -> Option<Forest<T>> {
        self.rule_forests.borrow().get(name).cloned()
    }

    pub(crate) fn store_rule_forest(&self, name: &Rc<str>, forest: Forest<T>) {
        self.rule_forests
            .borrow_mut()
            .insert(Rc::clone(name), forest);
    }

    /// Live cells.
    pub(crate) fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    /// Drops every derivative cell. Null forests of rules do not depend on
    /// any token and are kept.
    pub(crate) fn clear(&self) {
        let mut cells = self.cells.borrow_mut();
        log::debug!("memo: releasing {} cells", cells.len());
        self.base.set(self.base.get() + cells.len());
        cells.clear();
        self.by_rule.borrow_mut().clear();
    }
}
