use itertools::Itertools;

use crate::style::PathStyle;

/// A node of a compiled pattern tree.
///
/// Structural equality and hashing are derived so that identical segment
/// sequences across brace alternatives can share one planned subtree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Ast {
    /// A run of characters with no special meaning. A literal is either free
    /// of `/`, exactly the separator `/`, or a root prefix at position 0.
    Literal(String),

    /// `?` — exactly one character that is not a separator.
    AnyChar,

    /// `*` — any run of non-separator characters, including none.
    Star,

    /// `**` — any run of characters including separators, as long as no
    /// traversed segment is an unresolved `..`. Only ever separator-spanning
    /// as a whole segment; embedded occurrences are demoted to [`Ast::Star`]
    /// by [`demote_embedded_double_stars`].
    DoubleStar,

    /// `[...]` — a set of character spans, possibly negated. Never matches a
    /// separator.
    Range {
        negated: bool,
        spans: Vec<(char, char)>,
    },

    /// `{a,b}` — matches if any alternative does. Children are Sequences.
    Options(Vec<Ast>),

    /// Ordered concatenation of sub-patterns.
    Sequence(Vec<Ast>),
}

impl Ast {
    pub(crate) fn separator() -> Ast {
        Ast::Literal("/".to_owned())
    }

    pub(crate) fn is_separator(&self) -> bool {
        matches!(self, Ast::Literal(text) if text == "/")
    }
}

/// Canonicalizes a sequence: adjacent literals are merged and every merged
/// literal is re-split on `/`, so that afterwards each literal is either
/// separator-free or exactly the separator. A root prefix at position 0 is
/// left alone.
pub(crate) fn normalize_sequence(nodes: Vec<Ast>, style: PathStyle) -> Vec<Ast> {
    let mut merged: Vec<Ast> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            Ast::Options(alternatives) => Ast::Options(
                alternatives
                    .into_iter()
                    .map(|alternative| match alternative {
                        Ast::Sequence(children) => {
                            Ast::Sequence(normalize_sequence(children, style))
                        }
                        other => Ast::Sequence(normalize_sequence(vec![other], style)),
                    })
                    .collect(),
            ),
            other => other,
        };
        if let Ast::Literal(text) = &node {
            let mergeable = match merged.last() {
                Some(Ast::Literal(prev)) => !(merged.len() == 1 && style.is_root_literal(prev)),
                _ => false,
            };
            if mergeable {
                let Some(Ast::Literal(prev)) = merged.last_mut() else {
                    unreachable!("last element was just matched as a literal");
                };
                prev.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }

    let mut out: Vec<Ast> = Vec::with_capacity(merged.len());
    for (index, node) in merged.into_iter().enumerate() {
        match node {
            Ast::Literal(text)
                if text.contains('/')
                    && text != "/"
                    && !(index == 0 && style.is_root_literal(&text)) =>
            {
                for (i, part) in text.split('/').enumerate() {
                    if i > 0 {
                        out.push(Ast::separator());
                    }
                    if !part.is_empty() {
                        out.push(Ast::Literal(part.to_owned()));
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `**` only spans segments when it is a whole segment by itself; flanked by
/// other characters it matches within a single segment, exactly like `*`.
/// This pass demotes every embedded DoubleStar to Star.
///
/// `left_open`/`right_open` say whether the corresponding edge of this
/// sequence sits on a segment boundary; brace alternatives inherit the
/// adjacency of the group they appear in.
pub(crate) fn demote_embedded_double_stars(nodes: &mut [Ast], left_open: bool, right_open: bool) {
    for i in 0..nodes.len() {
        let prev_open = if i == 0 {
            left_open
        } else {
            nodes[i - 1].is_separator()
        };
        let next_open = match nodes.get(i + 1) {
            Some(node) => node.is_separator(),
            None => right_open,
        };

        if matches!(nodes[i], Ast::DoubleStar) {
            if !(prev_open && next_open) {
                nodes[i] = Ast::Star;
            }
            continue;
        }

        if let Ast::Options(alternatives) = &mut nodes[i] {
            for alternative in alternatives {
                if let Ast::Sequence(children) = alternative {
                    demote_embedded_double_stars(children, prev_open, next_open);
                }
            }
        }
    }
}

/// Rewrites a sequence into the full set of brace-free alternatives by
/// distributing every Options node over its siblings (a Cartesian product
/// across all Options in the sequence). Ranges are left as ranges.
pub(crate) fn flatten_options(sequence: &[Ast], style: PathStyle) -> Vec<Vec<Ast>> {
    if sequence.is_empty() {
        return vec![Vec::new()];
    }

    let per_node: Vec<Vec<Vec<Ast>>> = sequence
        .iter()
        .map(|node| match node {
            Ast::Options(alternatives) => alternatives
                .iter()
                .flat_map(|alternative| {
                    let Ast::Sequence(children) = alternative else {
                        unreachable!("options children are always sequences");
                    };
                    flatten_options(children, style)
                })
                .collect(),
            Ast::Sequence(children) => flatten_options(children, style),
            other => vec![vec![other.clone()]],
        })
        .collect();

    per_node
        .into_iter()
        .multi_cartesian_product()
        .map(|parts| {
            let alternative = parts.into_iter().flatten().collect();
            normalize_sequence(alternative, style)
        })
        .collect()
}

/// Splits a brace-free alternative into its root prefix (if the alternative
/// is absolute) and its `/`-separated segments.
pub(crate) fn split_alternative(
    alternative: &[Ast],
    style: PathStyle,
) -> (Option<String>, Vec<Vec<Ast>>) {
    let mut rest = alternative;
    let mut root = None;
    if let Some(Ast::Literal(text)) = alternative.first() {
        if style.is_root_literal(text) {
            root = Some(text.clone());
            rest = &alternative[1..];
        }
    }

    let mut segments: Vec<Vec<Ast>> = Vec::new();
    let mut current: Vec<Ast> = Vec::new();
    for node in rest {
        if node.is_separator() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(node.clone());
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    (root, segments)
}

/// Whether the pattern can match an absolute path. Only the first node
/// decides: a pattern is absolute exactly when it starts with a root literal
/// (possibly behind an alternation).
pub(crate) fn can_match_absolute(sequence: &[Ast], style: PathStyle) -> bool {
    match sequence.first() {
        Some(Ast::Literal(text)) => style.is_absolute(text),
        Some(Ast::Options(alternatives)) => alternatives.iter().any(|alternative| {
            matches!(alternative, Ast::Sequence(children) if can_match_absolute(children, style))
        }),
        Some(Ast::Sequence(children)) => can_match_absolute(children, style),
        _ => false,
    }
}

pub(crate) fn can_match_relative(sequence: &[Ast], style: PathStyle) -> bool {
    match sequence.first() {
        Some(Ast::Literal(text)) => !style.is_absolute(text),
        Some(Ast::Options(alternatives)) => alternatives.iter().any(|alternative| {
            matches!(alternative, Ast::Sequence(children) if can_match_relative(children, style))
        }),
        Some(Ast::Sequence(children)) => can_match_relative(children, style),
        _ => true,
    }
}
