use std::{env, fmt};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters that must be `%`-escaped in a URL-style path.
///
/// `%` itself is handled separately so that escapes already present in the
/// input are preserved verbatim.
const URL_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'^')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'[')
    .add(b']');

/// The path flavor a glob is written for.
///
/// All styles share the same matching form: `/`-separated segments with an
/// optional root prefix. The style decides what counts as a root, whether
/// backslashes are separators in *paths* (they never are in patterns), the
/// default case sensitivity, and whether literals are percent-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStyle {
    /// `/`-rooted paths.
    Posix,
    /// Drive (`C:`) and UNC (`//host/share`) roots; `\` accepted in paths.
    Windows,
    /// `scheme://authority` roots; literals are percent-encoded.
    Url,
}

impl PathStyle {
    /// The style of the platform this program runs on.
    pub fn system() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    /// The separator this style writes natively. Matching always uses `/`.
    pub fn separator(self) -> char {
        match self {
            PathStyle::Windows => '\\',
            PathStyle::Posix | PathStyle::Url => '/',
        }
    }

    /// Windows filesystems don't distinguish case, so globs there don't
    /// either unless asked to.
    pub fn default_case_sensitivity(self) -> bool {
        !matches!(self, PathStyle::Windows)
    }

    pub fn is_absolute(self, path: &str) -> bool {
        let path = self.slashed(path);
        self.split_root(&path).is_some()
    }

    /// Whether `text` consists solely of a recognized root prefix.
    pub(crate) fn is_root_literal(self, text: &str) -> bool {
        self.split_root(text)
            .is_some_and(|(_, rest)| rest.is_empty())
    }

    /// Splits a recognized root prefix off the front of `path`.
    ///
    /// The returned root is in `/`-separated form: `/` (POSIX), `C:` (drive),
    /// `//host/share` (UNC) or `scheme://authority` (URL).
    pub(crate) fn split_root<'p>(self, path: &'p str) -> Option<(String, &'p str)> {
        match self {
            PathStyle::Posix => path.strip_prefix('/').map(|rest| ("/".to_owned(), rest)),
            PathStyle::Windows => {
                let bytes = path.as_bytes();
                if bytes.len() >= 2
                    && bytes[0].is_ascii_alphabetic()
                    && bytes[1] == b':'
                    && (bytes.len() == 2 || bytes[2] == b'/')
                {
                    return Some((path[..2].to_owned(), &path[2..]));
                }
                if let Some(root) = unc_root(path) {
                    return Some(root);
                }
                path.strip_prefix('/').map(|rest| ("/".to_owned(), rest))
            }
            PathStyle::Url => {
                if let Some(root) = url_root(path) {
                    return Some(root);
                }
                path.strip_prefix('/').map(|rest| ("/".to_owned(), rest))
            }
        }
    }

    /// The current directory for this style, in normalized form.
    ///
    /// Styles other than the host's have no ambient current directory and
    /// report `.`, which disables the cwd-dependent match candidates.
    pub(crate) fn current(self) -> String {
        if self != Self::system() {
            return ".".to_owned();
        }
        match env::current_dir() {
            Ok(dir) => self.normalize(&dir.to_string_lossy()),
            Err(_) => ".".to_owned(),
        }
    }

    pub(crate) fn current_is_absolute(self) -> bool {
        let current = self.current();
        self.is_absolute(&current)
    }

    /// Normalizes `path` into the POSIX matching form: separators collapsed,
    /// `.` segments dropped, `..` segments resolved against the preceding
    /// segment where possible and otherwise kept at the front. A fully
    /// resolved relative path becomes the empty string.
    pub(crate) fn normalize(self, path: &str) -> String {
        let path = self.slashed(path);
        let (root, rest) = match self.split_root(&path) {
            Some((root, rest)) => (Some(root), rest),
            None => (None, path.as_str()),
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    // nothing left to pop: at a root the ".." vanishes,
                    // in a relative path it stays at the front
                    _ if root.is_some() => {}
                    _ => segments.push(".."),
                },
                segment => segments.push(segment),
            }
        }

        let joined = segments.join("/");
        match root {
            Some(root) if joined.is_empty() => root,
            Some(root) if root.ends_with('/') => format!("{root}{joined}"),
            Some(root) => format!("{root}/{joined}"),
            None => joined,
        }
    }

    /// Normalized absolute form of `path`, resolved against the current
    /// directory when one exists.
    pub(crate) fn absolute(self, path: &str) -> String {
        if self.is_absolute(path) {
            return self.normalize(path);
        }
        let current = self.current();
        if self.is_absolute(&current) {
            self.normalize(&format!("{current}/{path}"))
        } else {
            self.normalize(path)
        }
    }

    /// Normalized form of `path` relative to the current directory, when that
    /// is computable.
    pub(crate) fn make_relative(self, path: &str) -> Option<String> {
        if !self.is_absolute(path) {
            return Some(self.normalize(path));
        }
        let current = self.current();
        if !self.is_absolute(&current) {
            return None;
        }
        Some(relative_between(self, &self.normalize(path), &current))
    }

    /// Final conversion before a normalized path meets the pattern regex.
    pub(crate) fn to_match_form(self, path: &str) -> String {
        match self {
            PathStyle::Url => url_encode(path),
            PathStyle::Posix | PathStyle::Windows => path.to_owned(),
        }
    }

    fn slashed(self, path: &str) -> String {
        match self {
            PathStyle::Windows => path.replace('\\', "/"),
            PathStyle::Posix | PathStyle::Url => path.to_owned(),
        }
    }
}

impl fmt::Display for PathStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathStyle::Posix => "POSIX",
            PathStyle::Windows => "Windows",
            PathStyle::Url => "URL",
        })
    }
}

fn unc_root(path: &str) -> Option<(String, &str)> {
    let rest = path.strip_prefix("//")?;
    let host_len = rest.find('/').unwrap_or(rest.len());
    if host_len == 0 {
        return None;
    }
    let after_host = &rest[host_len..];
    let share = after_host.strip_prefix('/').unwrap_or("");
    let share_len = share.find('/').unwrap_or(share.len());
    let root_len = 2 + host_len + if share_len > 0 { 1 + share_len } else { 0 };
    Some((path[..root_len].to_owned(), &path[root_len..]))
}

fn url_root(path: &str) -> Option<(String, &str)> {
    let colon = path.find("://")?;
    let mut scheme = path[..colon].chars();
    if !scheme.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !scheme.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) {
        return None;
    }
    let authority = &path[colon + 3..];
    let authority_len = authority.find('/').unwrap_or(authority.len());
    let root_len = colon + 3 + authority_len;
    Some((path[..root_len].to_owned(), &path[root_len..]))
}

/// Relative form of `path` with respect to `base`; both are normalized
/// absolute strings. Paths under different roots stay absolute.
fn relative_between(style: PathStyle, path: &str, base: &str) -> String {
    let Some((path_root, path_rest)) = style.split_root(path) else {
        return path.to_owned();
    };
    let Some((base_root, base_rest)) = style.split_root(base) else {
        return path.to_owned();
    };
    if path_root != base_root {
        return path.to_owned();
    }

    let mut path_segments = path_rest.split('/').filter(|s| !s.is_empty()).peekable();
    let mut base_segments = base_rest.split('/').filter(|s| !s.is_empty()).peekable();
    while let (Some(a), Some(b)) = (path_segments.peek(), base_segments.peek()) {
        if a != b {
            break;
        }
        path_segments.next();
        base_segments.next();
    }

    let mut out: Vec<&str> = Vec::new();
    for _ in base_segments {
        out.push("..");
    }
    out.extend(path_segments);
    out.join("/")
}

/// Percent-encodes a URL-style path, leaving `%xx` escapes already present in
/// the input untouched.
pub(crate) fn url_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            out.extend(utf8_percent_encode(&text[start..i], URL_UNSAFE));
            let escaped = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if escaped {
                out.push_str(&text[i..i + 3]);
                i += 3;
            } else {
                out.push_str("%25");
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    out.extend(utf8_percent_encode(&text[start..], URL_UNSAFE));
    out
}
