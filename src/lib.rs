//! Pathglob compiles POSIX-style shell glob patterns into matchers that can
//! test path strings and list the filesystem entities they describe, while
//! visiting only the directories that could possibly contain a match.
//!
//! # Examples
//!
//! Matching paths:
//!
//! ```rust
//! use pathglob::Glob;
//!
//! let glob = Glob::new("src/**/*.rs").unwrap();
//!
//! assert!(glob.matches("src/lib.rs"));
//! assert!(glob.matches("src/walk/mod.rs"));
//! assert!(!glob.matches("tests/lib.rs"));
//! ```
//!
//! Listing a directory:
//!
//! ```rust,no_run
//! for entry in pathglob::glob("**/*.toml").unwrap().list_sync().unwrap() {
//!     println!("{}", entry.path.display());
//! }
//! ```
//!
//! Directory descent is planned from the pattern: literal prefixes are
//! descended into directly, brace alternatives sharing a prefix share one
//! descent, and a `**` subtree is walked exactly once.
//!
//! # Syntax
//!
//! See [`Glob`].

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(unused_crate_dependencies)]

mod ast;
mod compiler;
mod error;
mod fs;
mod glob;
mod list_tree;
mod parser;
mod style;
mod walker;

pub use self::{
    error::{GlobError, WalkError},
    fs::{Entry, EntryKind},
    glob::{Glob, GlobMatch, GlobOptions, ListOptions},
    style::PathStyle,
    walker::EntryStream,
};

/// Compile `pattern` with the default options.
pub fn glob(pattern: &str) -> Result<Glob, GlobError> {
    Glob::new(pattern)
}

/// Compile `pattern` with explicit options.
pub fn glob_with(pattern: &str, opts: GlobOptions) -> Result<Glob, GlobError> {
    Glob::new_with_opts(pattern, opts)
}
