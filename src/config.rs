/// Knobs for a [`Grammar`](crate::Grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarConfig {
    max_alternatives: usize,
    max_cached_cells: usize,
}

impl GrammarConfig {
    /// The largest forest [`Grammar::try_parse_rule`](crate::Grammar::try_parse_rule)
    /// accepts, counted in top-level alternatives.
    #[must_use]
    pub fn max_alternatives(mut self, limit: usize) -> GrammarConfig {
        self.max_alternatives = limit;
        self
    }

    pub fn alternative_limit(&self) -> usize {
        self.max_alternatives
    }

    /// How many derivative cells a grammar may keep between parses. A parse
    /// starting above this clears the cache first.
    #[must_use]
    pub fn max_cached_cells(mut self, limit: usize) -> GrammarConfig {
        self.max_cached_cells = limit;
        self
    }

    pub fn cell_limit(&self) -> usize {
        self.max_cached_cells
    }
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            max_alternatives: 64,
            max_cached_cells: 100_000,
        }
    }
}
