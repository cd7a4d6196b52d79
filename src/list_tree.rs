//! Directory-descent planning: turns a compiled pattern into the smallest
//! set of directories the lister has to visit.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use path_slash::PathExt as _;
use regex::Regex;
use tracing::trace;

use crate::{
    ast::{self, Ast},
    compiler,
    error::WalkError,
    fs::{self, Entry, EntryKind},
    style::PathStyle,
};

/// Per-call walking configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WalkOpts {
    pub(crate) follow_links: bool,
    pub(crate) case_sensitive: bool,
}

/// The structural form of one path segment, used as a child key so that
/// identical segments across alternatives share a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Segment(Vec<Ast>);

impl Segment {
    fn as_literal(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Ast::Literal(text)] => Some(text),
            _ => None,
        }
    }
}

/// A descent plan for one glob: one tree per filesystem root, plus whether
/// two planned descents may yield the same entity.
#[derive(Debug)]
pub(crate) struct ListTree {
    pub(crate) roots: Vec<(String, Node)>,
    pub(crate) can_overlap: bool,
}

/// One planned directory.
#[derive(Debug)]
pub(crate) struct Node {
    /// `None` marks a recursive node: the directory is enumerated as one
    /// subtree and filtered by the validator.
    pub(crate) children: Option<Vec<Child>>,
    /// Matches paths relative to this node's directory.
    pub(crate) validator: Option<Regex>,
    /// No validator and only literal children: descend directly instead of
    /// enumerating.
    pub(crate) intermediate: bool,
}

#[derive(Debug)]
pub(crate) struct Child {
    /// Set when the child segment is a single literal.
    pub(crate) literal: Option<String>,
    /// Compiled matcher for non-literal segments.
    pub(crate) matcher: Option<Regex>,
    pub(crate) node: Node,
}

impl Child {
    pub(crate) fn matches(&self, name: &str, case_sensitive: bool) -> bool {
        match (&self.literal, &self.matcher) {
            (Some(literal), _) => {
                if case_sensitive {
                    literal == name
                } else {
                    literal.eq_ignore_ascii_case(name)
                }
            }
            (None, Some(matcher)) => matcher.is_match(name),
            (None, None) => unreachable!("child carries either a literal or a matcher"),
        }
    }
}

impl Node {
    pub(crate) fn validates(&self, relative: &str) -> bool {
        self.validator
            .as_ref()
            .is_some_and(|validator| validator.is_match(relative))
    }
}

/// Builds the descent plan for a compiled pattern.
pub(crate) fn plan(sequence: &[Ast], style: PathStyle, case_sensitive: bool) -> ListTree {
    let mut builders: Vec<(String, NodeBuilder)> = Vec::new();
    for alternative in ast::flatten_options(sequence, style) {
        let (root, segments) = ast::split_alternative(&alternative, style);
        let key = root.unwrap_or_else(|| ".".to_owned());
        let index = match builders.iter().position(|(existing, _)| *existing == key) {
            Some(index) => index,
            None => {
                builders.push((key, NodeBuilder::new()));
                builders.len() - 1
            }
        };
        builders[index].1.add(&segments);
    }

    let has_relative = builders.iter().any(|(key, _)| key == ".");
    let has_absolute = builders.iter().any(|(key, _)| key != ".");
    let can_overlap = (has_relative && has_absolute)
        || builders
            .iter()
            .any(|(_, builder)| builder.overlaps(case_sensitive));

    trace!(roots = builders.len(), can_overlap, "planned glob descent");

    ListTree {
        roots: builders
            .into_iter()
            .map(|(key, builder)| (key, builder.seal(style, case_sensitive)))
            .collect(),
        can_overlap,
    }
}

struct NodeBuilder {
    children: Option<HashMap<Segment, NodeBuilder>>,
    validator: Vec<Vec<Ast>>,
}

impl NodeBuilder {
    fn new() -> Self {
        Self {
            children: Some(HashMap::new()),
            validator: Vec::new(),
        }
    }

    /// Routes one alternative's remaining segments into this node.
    fn add(&mut self, segments: &[Vec<Ast>]) {
        let Some((first, rest)) = segments.split_first() else {
            // a bare root: nothing below it to plan
            self.validator.push(Vec::new());
            return;
        };

        if self.children.is_none() {
            // already recursive: the rest of the alternative becomes one
            // validator alternative relative to this directory
            self.validator.push(join_segments(segments));
            return;
        }

        if first.iter().any(|node| matches!(node, Ast::DoubleStar)) {
            self.make_recursive();
            self.validator.push(join_segments(segments));
        } else if rest.is_empty() {
            self.validator.push(first.clone());
        } else {
            self.children
                .get_or_insert_with(HashMap::new)
                .entry(Segment(first.clone()))
                .or_insert_with(NodeBuilder::new)
                .add(rest);
        }
    }

    /// Converts this node to a recursive one, absorbing existing child
    /// subtrees into the validator so earlier alternatives stay reachable.
    fn make_recursive(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        for (segment, mut child) in children {
            child.make_recursive();
            for validator in child.validator {
                let mut joined = segment.0.clone();
                joined.push(Ast::separator());
                joined.extend(validator);
                self.validator.push(joined);
            }
        }
    }

    /// Whether two descents planned below this node can reach the same entry.
    /// Recursive nodes are a single walk and never overlap by themselves.
    fn overlaps(&self, case_sensitive: bool) -> bool {
        let Some(children) = &self.children else {
            return false;
        };
        if children.len() > 1
            && (!case_sensitive || children.keys().any(|segment| segment.as_literal().is_none()))
        {
            return true;
        }
        children.values().any(|child| child.overlaps(case_sensitive))
    }

    fn seal(self, style: PathStyle, case_sensitive: bool) -> Node {
        let validator = (!self.validator.is_empty())
            .then(|| compiler::compile_alternatives(&self.validator, style, case_sensitive));
        let children = self.children.map(|children| {
            children
                .into_iter()
                .map(|(segment, child)| {
                    let literal = segment.as_literal().map(str::to_owned);
                    let matcher = literal.is_none().then(|| {
                        compiler::compile_alternatives(
                            std::slice::from_ref(&segment.0),
                            style,
                            case_sensitive,
                        )
                    });
                    Child {
                        literal,
                        matcher,
                        node: child.seal(style, case_sensitive),
                    }
                })
                .collect::<Vec<_>>()
        });
        let intermediate = validator.is_none()
            && children
                .as_ref()
                .is_some_and(|children| children.iter().all(|child| child.literal.is_some()));
        Node {
            children,
            validator,
            intermediate,
        }
    }
}

fn join_segments(segments: &[Vec<Ast>]) -> Vec<Ast> {
    let mut joined = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            joined.push(Ast::separator());
        }
        joined.extend(segment.iter().cloned());
    }
    joined
}

/// Resolves a planned root key to the concrete directory to walk.
pub(crate) fn root_dir(key: &str, fallback: &Path) -> PathBuf {
    if key == "." {
        fallback.to_path_buf()
    } else if key.ends_with(':') {
        // a bare drive is drive-relative; the root of the drive is meant
        PathBuf::from(format!("{key}/"))
    } else {
        PathBuf::from(key)
    }
}

/// POSIX-form path of `path` relative to `dir`.
pub(crate) fn relative_posix(path: &Path, dir: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative.to_slash_lossy().into_owned()
}

impl ListTree {
    pub(crate) fn list_sync(
        &self,
        root: &Path,
        style: PathStyle,
        opts: WalkOpts,
    ) -> Result<Vec<Entry>, WalkError> {
        let mut out = Vec::new();
        for (key, node) in &self.roots {
            let dir = root_dir(key, root);
            node.list_sync(&dir, opts, &mut out)?;
        }
        if self.can_overlap {
            let mut seen = HashSet::new();
            out.retain(|entry| seen.insert(style.absolute(&entry.path.to_string_lossy())));
        }
        Ok(out)
    }
}

impl Node {
    fn list_sync(
        &self,
        dir: &Path,
        opts: WalkOpts,
        out: &mut Vec<Entry>,
    ) -> Result<(), WalkError> {
        trace!(dir = %dir.display(), "listing directory");

        let Some(children) = &self.children else {
            // recursive node: one subtree walk filtered by the validator
            for entry in fs::list_dir_recursive_sync(dir, opts.follow_links)? {
                if self.validates(&relative_posix(&entry.path, dir)) {
                    out.push(entry);
                }
            }
            return Ok(());
        };

        if self.intermediate && opts.case_sensitive {
            // we know the exact names we are after; skip the enumeration
            // (errors below, missing entries included, stay visible)
            for child in children {
                let Some(name) = child.literal.as_deref() else {
                    unreachable!("intermediate nodes only have literal children");
                };
                child.node.list_sync(&fs::join_dir(dir, name), opts, out)?;
            }
            return Ok(());
        }

        let entries = fs::list_dir_sync(dir, opts.follow_links)?;

        if !opts.case_sensitive {
            self.force_missing_intermediates(dir, children, &entries, opts)?;
        }

        for entry in entries {
            let Some(name) = entry.path.file_name() else {
                continue;
            };
            let name = name.to_string_lossy().into_owned();

            if entry.kind == EntryKind::Directory {
                for child in children {
                    if child.matches(&name, opts.case_sensitive) {
                        match child.node.list_sync(&fs::join_dir(dir, &name), opts, out) {
                            // missing entries below a wildcard descent are
                            // expected (the name came from an enumeration
                            // that may be stale) and stay silent
                            Err(err) if err.is_not_found() => {}
                            result => result?,
                        }
                    }
                }
            }

            if self.validates(&name) {
                out.push(entry);
            }
        }
        Ok(())
    }

    /// Case-insensitive listings cannot rely on direct descent, so literal
    /// children that matched nothing are listed deliberately, surfacing the
    /// same not-found error the descent would have raised.
    fn force_missing_intermediates(
        &self,
        dir: &Path,
        children: &[Child],
        entries: &[Entry],
        opts: WalkOpts,
    ) -> Result<(), WalkError> {
        for child in children {
            if !child.node.intermediate {
                continue;
            }
            let Some(literal) = child.literal.as_deref() else {
                continue;
            };
            let present = entries.iter().any(|entry| {
                entry
                    .path
                    .file_name()
                    .is_some_and(|name| child.matches(&name.to_string_lossy(), opts.case_sensitive))
            });
            if !present {
                fs::list_dir_sync(&fs::join_dir(dir, literal), opts.follow_links)?;
            }
        }
        Ok(())
    }
}
