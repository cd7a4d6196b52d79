use std::{
    fmt,
    hash::{Hash, Hasher},
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use parsy::Parser as _;
use regex::Regex;
use tracing::debug;

use crate::{
    ast::{self, Ast},
    compiler,
    error::{GlobError, WalkError},
    fs::Entry,
    list_tree::{self, ListTree, WalkOpts},
    parser::PATTERN_PARSER,
    style::PathStyle,
    walker::{self, EntryStream},
};

/// Options for compiling a [`Glob`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobOptions {
    /// Path style the pattern is written for. Defaults to the host's style.
    pub style: Option<PathStyle>,

    /// Also match everything beneath a matched path, as if the pattern were
    /// `{pattern,pattern/**}`.
    ///
    /// Disabled by default.
    pub recursive: bool,

    /// Defaults to `true` everywhere except the Windows style.
    pub case_sensitive: Option<bool>,
}

/// Options for a single list call.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Directory the relative part of the glob is resolved against.
    /// Defaults to the current directory.
    pub root: Option<PathBuf>,

    /// Follow symbolic links while walking. Enabled by default.
    pub follow_links: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            root: None,
            follow_links: true,
        }
    }
}

/// A compiled glob: a whole-path pattern test and a driver for listing the
/// filesystem entities it describes.
///
/// # Syntax
///
/// * Normal characters match themselves; `\` escapes the next character
/// * `?` matches any single character except `/`
/// * `*` matches any run of characters within one path segment
/// * `**` as a whole segment also crosses segments, though never through an
///   unresolved `..`; mixed with other characters (`foo**bar`) it behaves
///   like `*`
/// * `[abc]`, `[a-z]` match one character from the set; `[^abc]` negates it,
///   and a `-` first, last or doubled is a literal hyphen. A set never
///   matches `/`
/// * `{a,b/c}` matches either alternative; groups nest and may span `/`
/// * A leading `/`, `C:` drive, `//host/share` UNC (Windows style) or
///   `scheme://authority` (URL style) makes the glob absolute
///
/// Paths are normalized before matching, so `foo/./bar` and `foo/bar` are
/// the same path. Matching is whole-path: there are no partial matches.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    style: PathStyle,
    recursive: bool,
    case_sensitive: bool,
    tree: Vec<Ast>,
    regex: Regex,
    can_match_absolute: bool,
    can_match_relative: bool,
    plan: OnceLock<Arc<ListTree>>,
}

/// A successful whole-path match, anchored at position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobMatch<'p> {
    text: &'p str,
}

impl<'p> GlobMatch<'p> {
    pub fn as_str(&self) -> &'p str {
        self.text
    }

    pub fn start(&self) -> usize {
        0
    }

    pub fn end(&self) -> usize {
        self.text.len()
    }
}

impl Glob {
    /// Compile a pattern with the default options.
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        Self::new_with_opts(pattern, GlobOptions::default())
    }

    /// Compile a pattern.
    pub fn new_with_opts(pattern: &str, opts: GlobOptions) -> Result<Self, GlobError> {
        let GlobOptions {
            style,
            recursive,
            case_sensitive,
        } = opts;

        let style = style.unwrap_or_else(PathStyle::system);
        let case_sensitive = case_sensitive.unwrap_or_else(|| style.default_case_sensitivity());

        // An absolute root prefix is consumed as a single literal before the
        // grammar proper; the grammar itself is style-independent.
        let (root, body) = match style.split_root(pattern) {
            Some((root, rest)) => (Some(root), rest),
            None => (None, pattern),
        };

        let parsed = PATTERN_PARSER
            .parse_str(body)
            .map(|parsed| parsed.data)
            .map_err(|err| GlobError::Parse(format!("{err:?}")))?;

        let mut tree = ast::normalize_sequence(parsed, style);
        if let Some(root) = root {
            tree.insert(0, Ast::Literal(root));
        }

        // `foo**`, `**bar` and `foo**bar` stay within one segment; only a
        // segment that is exactly `**` crosses separators
        ast::demote_embedded_double_stars(&mut tree, true, true);

        if recursive {
            let mut with_suffix = tree.clone();
            if !with_suffix.last().is_some_and(Ast::is_separator) {
                with_suffix.push(Ast::separator());
            }
            with_suffix.push(Ast::DoubleStar);
            tree = vec![Ast::Options(vec![
                Ast::Sequence(tree),
                Ast::Sequence(with_suffix),
            ])];
        }

        let regex = compiler::compile_pattern(&tree, style, case_sensitive);
        let can_match_absolute = ast::can_match_absolute(&tree, style);
        let can_match_relative = ast::can_match_relative(&tree, style);

        debug!(pattern, %style, case_sensitive, "compiled glob");

        Ok(Self {
            pattern: pattern.to_owned(),
            style,
            recursive,
            case_sensitive,
            tree,
            regex,
            can_match_absolute,
            can_match_relative,
            plan: OnceLock::new(),
        })
    }

    /// Escapes `text` so that it matches only itself when compiled.
    pub fn quote(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if matches!(
                c,
                '*' | '{' | '[' | '?' | '\\' | '}' | ']' | ',' | '-' | '(' | ')'
            ) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    /// A glob matching everything this or `other` matches.
    ///
    /// Fails when the two globs disagree on path style or case sensitivity.
    pub fn union(&self, other: &Glob) -> Result<Glob, GlobError> {
        if self.style != other.style {
            return Err(GlobError::IncompatibleUnion("path styles"));
        }
        if self.case_sensitive != other.case_sensitive {
            return Err(GlobError::IncompatibleUnion("case sensitivity"));
        }

        let tree = vec![Ast::Options(vec![
            Ast::Sequence(self.tree.clone()),
            Ast::Sequence(other.tree.clone()),
        ])];
        let regex = compiler::compile_pattern(&tree, self.style, self.case_sensitive);

        Ok(Glob {
            pattern: format!("{{{},{}}}", self.pattern, other.pattern),
            style: self.style,
            recursive: self.recursive || other.recursive,
            case_sensitive: self.case_sensitive,
            tree,
            regex,
            can_match_absolute: self.can_match_absolute || other.can_match_absolute,
            can_match_relative: self.can_match_relative || other.can_match_relative,
            plan: OnceLock::new(),
        })
    }

    /// Whether the glob matches `path` as a whole.
    ///
    /// Matching never fails: a path the glob's style cannot interpret simply
    /// doesn't match.
    pub fn matches(&self, path: &str) -> bool {
        self.match_as_prefix(path, 0).is_some()
    }

    /// Globs only ever match whole paths anchored at the start, so any
    /// `start` other than 0 yields no match.
    pub fn match_as_prefix<'p>(&self, path: &'p str, start: usize) -> Option<GlobMatch<'p>> {
        if start != 0 {
            return None;
        }

        if self.can_match_absolute
            && (self.style.current_is_absolute() || self.style.is_absolute(path))
        {
            let absolute = self.style.to_match_form(&self.style.absolute(path));
            if self.regex.is_match(&absolute) {
                return Some(GlobMatch { text: path });
            }
        }

        if self.can_match_relative {
            if let Some(relative) = self.style.make_relative(path) {
                let relative = self.style.to_match_form(&relative);
                if self.regex.is_match(&relative) {
                    return Some(GlobMatch { text: path });
                }
            }
        }

        None
    }

    /// The zero- or one-element sequence of matches starting at `start`.
    pub fn all_matches<'p>(&self, path: &'p str, start: usize) -> Vec<GlobMatch<'p>> {
        self.match_as_prefix(path, start).into_iter().collect()
    }

    /// Lists all entities matching the glob, materialized.
    pub fn list_sync(&self) -> Result<Vec<Entry>, WalkError> {
        self.list_sync_with(ListOptions::default())
    }

    pub fn list_sync_with(&self, opts: ListOptions) -> Result<Vec<Entry>, WalkError> {
        self.check_context()?;
        let root = opts.root.unwrap_or_else(|| PathBuf::from("."));
        self.plan().list_sync(
            &root,
            self.style,
            WalkOpts {
                follow_links: opts.follow_links,
                case_sensitive: self.case_sensitive,
            },
        )
    }

    /// Lists all entities matching the glob as a stream.
    ///
    /// Must be called from within a tokio runtime. For identical filesystem
    /// state this yields the same set of entries as [`Glob::list_sync`], in
    /// no guaranteed order.
    pub fn list(&self) -> Result<EntryStream, WalkError> {
        self.list_with(ListOptions::default())
    }

    pub fn list_with(&self, opts: ListOptions) -> Result<EntryStream, WalkError> {
        self.check_context()?;
        let root = opts.root.unwrap_or_else(|| PathBuf::from("."));
        Ok(walker::spawn_list(
            Arc::clone(self.plan()),
            root,
            self.style,
            WalkOpts {
                follow_links: opts.follow_links,
                case_sensitive: self.case_sensitive,
            },
        ))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The descent plan, built once on first use.
    fn plan(&self) -> &Arc<ListTree> {
        self.plan
            .get_or_init(|| Arc::new(list_tree::plan(&self.tree, self.style, self.case_sensitive)))
    }

    fn check_context(&self) -> Result<(), WalkError> {
        let host = PathStyle::system();
        if self.style != host {
            return Err(WalkError::ContextMismatch {
                glob: self.style,
                host,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.style == other.style
            && self.recursive == other.recursive
            && self.case_sensitive == other.case_sensitive
    }
}

impl Eq for Glob {}

impl Hash for Glob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.style.hash(state);
        self.recursive.hash(state);
        self.case_sensitive.hash(state);
    }
}
