use crate::forest::{Forest, ParseTree, tree_kind};
use display_tree::{AsTree, DisplayTree, Style};
use std::{
    fmt::{Debug, Display, Formatter, Write},
    iter::once,
};

const EMPTY_STRING: &str = "";

impl<T: Debug + Clone> DisplayTree for ParseTree<T> {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let name = tree_kind(self);
        match self {
            ParseTree::Empty | ParseTree::Eps => write!(f, "{}", style.leaf_style.apply(name))?,
            ParseTree::Char(token) => write!(
                f,
                "{}",
                style.leaf_style.apply(&format!("{name} {token:?}"))
            )?,
            ParseTree::Pair(left, right) => {
                writeln!(f, "{}", style.leaf_style.apply(name))?;
                print_vec_tree(f, style, &[left.clone(), right.clone()])?;
            }
            ParseTree::Rep(inner) => {
                writeln!(f, "{}", style.leaf_style.apply(name))?;
                print_vec_tree(f, style, inner.trees())?;
            }
        }
        Ok(())
    }
}

impl<T: Debug + Clone> DisplayTree for Forest<T> {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let heading = match self.len() {
            0 => "Forest (no parse)".to_string(),
            1 => "Forest".to_string(),
            n => format!("Forest ({n} alternatives)"),
        };
        writeln!(f, "{}", style.leaf_style.apply(&heading))?;
        print_vec_tree(f, style, self.trees())
    }
}

impl<T: Debug + Clone> Display for Forest<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsTree::new(self))
    }
}

pub(crate) fn print_vec_tree<T: DisplayTree>(
    f: &mut impl Write,
    style: Style,
    body: &[T],
) -> Result<(), std::fmt::Error> {
    let indentation = style.indentation as usize - 1;
    let spacer = format!(" {EMPTY_STRING:indentation$}");
    let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);
    let vec_output = fmt_vec(body, style);

    for (block_no, block) in vec_output.enumerate() {
        for (n, line) in block.lines().enumerate() {
            if n == 0 && block_no == 0 {
                write!(f, "{}{horizontal_bar}", style.char_set.end_connector,)?;
            } else {
                write!(f, "{spacer}")?;
            }
            writeln!(f, "{line}")?;
        }
    }
    Ok(())
}

pub(crate) fn fmt_vec<T: DisplayTree>(v: &[T], style: Style) -> impl Iterator<Item = String> + '_ {
    let max_index = v.len().saturating_sub(1);
    let num_width = format!("{max_index}",).len();

    let vertical = style
        .branch_style
        .apply(&style.char_set.vertical.to_string());

    v.iter().enumerate().map(move |(n, item)| {
        let vertical = vertical.clone();
        let continued_vertical = if n < max_index { &vertical } else { " " };

        let indent = format!(" {:num_width$}", "");
        let tree = AsTree::with_style(item, style).to_string();
        let mut tree_lines = tree.lines().enumerate().map(move |(line_num, line)| {
            let line = style.leaf_style.apply(line);
            if line_num > 0 {
                format!("{continued_vertical}{indent}{line}\n")
            } else {
                format!("{line}\n")
            }
        });
        let lead_line = tree_lines.next().unwrap_or(String::new());

        let lead = format!("{n:<0num_width$}: {lead_line}");

        once(lead).chain(tree_lines).collect()
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pair_tree() {
        let forest = Forest::pair(Forest::leaf('x'), Forest::leaf('y') + Forest::eps());
        let tree = forest.to_string();

        assert!(tree.starts_with("Forest\n"), "{tree}");
        assert!(tree.contains("Pair"), "{tree}");
        assert!(tree.contains("Char 'x'"), "{tree}");
        assert!(tree.contains("Forest (2 alternatives)"), "{tree}");
        assert!(tree.contains("Eps"), "{tree}");
    }

    #[test]
    fn no_parse_tree() {
        let tree = Forest::<char>::empty().to_string();
        assert_eq!(tree.trim_end(), "Forest (no parse)");
    }

    #[test]
    fn long_list_tree() {
        let items: Vec<_> = "abcdefghijkl".chars().map(ParseTree::Char).collect();
        let forest = Forest::from(ParseTree::Rep(Forest::from(items)));
        let tree = forest.to_string();

        assert!(tree.contains("00: "), "{tree}");
        assert!(tree.contains("11: "), "{tree}");
        assert!(tree.contains("Char 'l'"), "{tree}");
    }
}
