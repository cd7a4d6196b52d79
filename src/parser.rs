use std::{borrow::Cow, collections::HashSet, sync::LazyLock};

use parsy::{Parser, char, choice, filter, just, recursive_shared};

use crate::ast::Ast;

/// Parse a glob pattern body (everything after an absolute root prefix) into
/// a raw [`Ast`] sequence.
pub(crate) static PATTERN_PARSER: LazyLock<Box<dyn Parser<Vec<Ast>> + Send + Sync>> =
    LazyLock::new(|| {
        let normal_char = filter(|c| !SPECIAL_CHARS.contains(&c));

        let escaped_char = char('\\').ignore_then(
            filter(|_| true).critical("expected a character after the escape backslash"),
        );

        let literal = choice::<char, _>((normal_char, escaped_char))
            .repeated_into_container::<String>()
            .at_least(1)
            .map(Ast::Literal);

        // A class member: anything but the terminator and the span hyphen,
        // with escapes allowed. '/' is lexically permitted here; the compiler
        // keeps it out of the matched set.
        let class_char = || {
            choice::<char, _>((
                filter(|c| c != ']' && c != '-' && c != '\\'),
                char('\\').ignore_then(
                    filter(|_| true).critical("expected a character after the escape backslash"),
                ),
            ))
        };

        let class_span = choice::<(char, char), _>((
            // a hyphen that starts no span (leading, trailing or doubled) is
            // a literal hyphen
            char('-').map(|_| ('-', '-')),
            class_char()
                .then(char('-').ignore_then(class_char()).or_not())
                .map(|(start, end)| (start, end.unwrap_or(start))),
        ));

        let range = char('[')
            .ignore_then(char('^').or_not())
            .then(
                class_span
                    .repeated_into_vec()
                    .at_least(1)
                    .critical("expected at least one character in the class"),
            )
            .then_ignore(char(']').critical_auto_msg())
            .map(|(negation, spans)| Ast::Range {
                negated: negation.is_some(),
                spans,
            })
            .and_then_or_critical(validate_range);

        let body = recursive_shared(|body| {
            choice::<Ast, _>((
                just("**").map(|_| Ast::DoubleStar),
                char('*').map(|_| Ast::Star),
                char('?').map(|_| Ast::AnyChar),
                char('/').map(|_| Ast::separator()),
                range,
                //
                // Alternation group; alternatives may span separators and
                // nest further groups
                //
                char('{')
                    .ignore_then(
                        body.separated_by_into_vec(char(','))
                            .at_least(1)
                            .critical("expected at least one alternative in the group"),
                    )
                    .then_ignore(char('}').critical_auto_msg())
                    .map(|alternatives| {
                        Ast::Options(alternatives.into_iter().map(Ast::Sequence).collect())
                    }),
                literal,
            ))
            .repeated_into_vec()
        });

        Box::new(body.full())
    });

/// Characters that must be escaped in order to be matched literally.
static SPECIAL_CHARS: LazyLock<HashSet<char>> =
    LazyLock::new(|| HashSet::from(['*', '?', '[', ']', '{', '}', ',', '\\', '/']));

fn validate_range(node: Ast) -> Result<Ast, Cow<'static, str>> {
    let Ast::Range { negated, spans } = &node else {
        unreachable!("validate_range only receives ranges");
    };
    for (start, end) in spans {
        if start > end {
            return Err(Cow::Owned(format!("invalid character range '{start}-{end}'")));
        }
    }
    if !negated && spans.iter().all(|(start, end)| *start == '/' && *end == '/') {
        return Err(Cow::Borrowed("character class cannot match any character"));
    }
    Ok(node)
}
