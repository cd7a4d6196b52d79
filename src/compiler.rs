use regex::Regex;

use crate::{ast::Ast, style::PathStyle};

/// One path segment that is not exactly `..`: the building block of the
/// double-star expansion, which must never traverse an unresolved parent
/// reference.
const NOT_DOTDOT_SEGMENT: &str = r"(?:[^./][^/]+|\.[^./][^/]*|\.\.[^/]+|[^/])?";

/// Compile a whole pattern tree into an anchored regular expression.
///
/// The regex engine gives us NFA-style matching, so alternation and star
/// backtracking stay polynomial in pattern and path length.
pub(crate) fn compile_pattern(sequence: &[Ast], style: PathStyle, case_sensitive: bool) -> Regex {
    let alternatives = [sequence.to_vec()];
    compile_alternatives(&alternatives, style, case_sensitive)
}

/// Compile a set of alternative sequences into one anchored regular
/// expression matching any of them.
pub(crate) fn compile_alternatives(
    alternatives: &[Vec<Ast>],
    style: PathStyle,
    case_sensitive: bool,
) -> Regex {
    let mut out = String::from("^(?:");
    for (i, alternative) in alternatives.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        compile_sequence(alternative, style, case_sensitive, &mut out);
    }
    out.push_str(")$");

    Regex::new(&out).unwrap()
}

fn compile_sequence(nodes: &[Ast], style: PathStyle, case_sensitive: bool, out: &mut String) {
    let mut i = 0;
    while i < nodes.len() {
        // A double star flanked by other characters in its segment matches
        // like a plain star: it never crosses a separator.
        if matches!(nodes[i], Ast::DoubleStar) && !spans_segments(nodes, i) {
            out.push_str("[^/]*");
            i += 1;
            continue;
        }

        // A double star swallows one adjacent separator so that it can match
        // zero whole segments: `foo/**` matches `foo`, `**/bar` matches `bar`.
        if matches!(nodes[i], Ast::DoubleStar)
            && nodes.get(i + 1).is_some_and(Ast::is_separator)
        {
            out.push_str("(?:");
            compile_double_star(out);
            out.push_str("/)?");
            i += 2;
            continue;
        }
        if nodes[i].is_separator()
            && matches!(nodes.get(i + 1), Some(Ast::DoubleStar))
            && i + 2 == nodes.len()
        {
            out.push_str("(?:/");
            compile_double_star(out);
            out.push_str(")?");
            i += 2;
            continue;
        }

        compile_node(&nodes[i], style, case_sensitive, out);
        i += 1;
    }
}

fn compile_node(node: &Ast, style: PathStyle, case_sensitive: bool, out: &mut String) {
    match node {
        Ast::Literal(text) => compile_literal(text, style, case_sensitive, out),
        Ast::AnyChar => out.push_str("[^/]"),
        Ast::Star => out.push_str("[^/]*"),
        Ast::DoubleStar => compile_double_star(out),
        Ast::Range { negated, spans } => compile_range(*negated, spans, case_sensitive, out),
        Ast::Options(alternatives) => {
            out.push_str("(?:");
            for (i, alternative) in alternatives.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                let Ast::Sequence(children) = alternative else {
                    unreachable!("options children are always sequences");
                };
                compile_sequence(children, style, case_sensitive, out);
            }
            out.push(')');
        }
        Ast::Sequence(children) => compile_sequence(children, style, case_sensitive, out),
    }
}

/// A double star crosses segments only when both of its sides touch a
/// separator or an end of the sequence.
fn spans_segments(nodes: &[Ast], i: usize) -> bool {
    let prev_open = i == 0 || nodes[i - 1].is_separator();
    let next_open = match nodes.get(i + 1) {
        Some(node) => node.is_separator(),
        None => true,
    };
    prev_open && next_open
}

fn compile_double_star(out: &mut String) {
    out.push_str(NOT_DOTDOT_SEGMENT);
    out.push_str("(?:/");
    out.push_str(NOT_DOTDOT_SEGMENT);
    out.push_str(")*");
}

fn compile_literal(text: &str, style: PathStyle, case_sensitive: bool, out: &mut String) {
    let text = style.to_match_form(text);
    if case_sensitive {
        out.push_str(&regex::escape(&text));
        return;
    }
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            out.push('[');
            out.push(c.to_ascii_lowercase());
            out.push(c.to_ascii_uppercase());
            out.push(']');
        } else {
            out.push_str(&regex::escape(&c.to_string()));
        }
    }
}

fn compile_range(negated: bool, spans: &[(char, char)], case_sensitive: bool, out: &mut String) {
    let mut resolved: Vec<(char, char)> = Vec::with_capacity(spans.len());
    for &(start, end) in spans {
        push_span(&mut resolved, start, end, negated);
        if !case_sensitive {
            // mirror the ASCII-alphabetic portion of the span into the other
            // case so folding stays ASCII-only
            push_mirrored(&mut resolved, start, end, 'a', 'z');
            push_mirrored(&mut resolved, start, end, 'A', 'Z');
        }
    }

    // A negated class excludes the separator as well: ranges never match `/`.
    if negated {
        out.push_str("[^/");
    } else {
        out.push('[');
    }
    for (start, end) in resolved {
        push_class_char(start, out);
        if end > start {
            out.push('-');
            push_class_char(end, out);
        }
    }
    out.push(']');
}

/// Appends a span, carving the separator out of positive classes.
fn push_span(resolved: &mut Vec<(char, char)>, start: char, end: char, negated: bool) {
    if negated || !(start <= '/' && '/' <= end) {
        resolved.push((start, end));
        return;
    }
    if start < '/' {
        resolved.push((start, '.'));
    }
    if '/' < end {
        resolved.push(('0', end));
    }
}

fn push_mirrored(resolved: &mut Vec<(char, char)>, start: char, end: char, lo: char, hi: char) {
    let start = start.max(lo);
    let end = end.min(hi);
    if start <= end {
        let flip = |c: char| {
            if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        };
        resolved.push((flip(start), flip(end)));
    }
}

fn push_class_char(c: char, out: &mut String) {
    // '&', '~' and '-' open set operations inside a class in this regex
    // flavor, so they get escaped along with the structural characters
    if matches!(c, '[' | ']' | '\\' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}
