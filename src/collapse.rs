use crate::forest::{Forest, ParseTree};

impl<T: Clone> Forest<T> {
    /// Strips the epsilon padding derivation leaves around pairs.
    ///
    /// `Empty` alternatives vanish, a pair with a side that has no parses
    /// vanishes, and a pair with a side that matched nothing is replaced by the
    /// other side's alternatives. Repetitions keep their wrapper even when
    /// nothing is left inside, since zero repetitions is still a match.
    #[must_use]
    pub fn collapse(&self) -> Forest<T> {
        let mut alternatives = vec![];
        for tree in self {
            collapse_tree(tree, &mut alternatives);
        }
        Forest::from(alternatives)
    }
}

fn collapse_tree<T: Clone>(tree: &ParseTree<T>, into: &mut Vec<ParseTree<T>>) {
    match tree {
        ParseTree::Empty => {}
        ParseTree::Eps | ParseTree::Char(_) => into.push(tree.clone()),
        ParseTree::Pair(left, right) => {
            let left = left.collapse();
            let right = right.collapse();
            if left.is_empty() || right.is_empty() {
                return;
            }
            if left.is_eps() {
                into.extend(right.iter().cloned());
            } else if right.is_eps() {
                into.extend(left.iter().cloned());
            } else {
                into.push(ParseTree::Pair(left, right));
            }
        }
        ParseTree::Rep(inner) => into.push(ParseTree::Rep(inner.collapse())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epsilon_padding_is_spliced() {
        let padded = Forest::pair(
            Forest::eps(),
            Forest::pair(Forest::leaf('x'), Forest::pair(Forest::leaf('y'), Forest::eps())),
        );
        insta::assert_compact_debug_snapshot!(padded.collapse(), @"[Pair([Char('x')], [Char('y')])]");
    }

    #[test]
    fn dead_pairs_are_dropped() {
        let dead = Forest::from(vec![
            ParseTree::Pair(Forest::leaf('x'), Forest::from(ParseTree::Empty)),
            ParseTree::Empty,
            ParseTree::Char('z'),
        ]);
        insta::assert_compact_debug_snapshot!(dead.collapse(), @"[Char('z')]");
    }

    #[test]
    fn repetition_survives() {
        let rep = Forest::from(ParseTree::Rep(Forest::from(ParseTree::<char>::Empty)));
        insta::assert_compact_debug_snapshot!(rep.collapse(), @"[Rep([])]");
    }

    #[test]
    fn ambiguous_side_keeps_pair() {
        let f = Forest::pair(Forest::eps() + Forest::leaf('a'), Forest::leaf('b'));
        assert_eq!(f.collapse(), f);
    }

    #[test]
    fn splice_keeps_alternatives() {
        let f = Forest::pair(Forest::leaf('a') + Forest::leaf('b'), Forest::eps());
        insta::assert_compact_debug_snapshot!(f.collapse(), @"[Char('a'), Char('b')]");
    }
}
