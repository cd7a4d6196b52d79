use pathglob::{Glob, GlobOptions, PathStyle};

fn compile(pattern: &str) -> Glob {
    Glob::new(pattern)
        .unwrap_or_else(|err| panic!("Failed to compile pattern '{pattern}':\n  > {err}"))
}

fn compile_with(pattern: &str, opts: GlobOptions) -> Glob {
    Glob::new_with_opts(pattern, opts)
        .unwrap_or_else(|err| panic!("Failed to compile pattern '{pattern}':\n  > {err}"))
}

struct PatternTest {
    pattern: &'static str,
    should_match: &'static [&'static str],
    should_not_match: &'static [&'static str],
}

fn test_pattern(test: PatternTest) {
    test_pattern_with(test, GlobOptions::default());
}

fn test_pattern_with(test: PatternTest, opts: GlobOptions) {
    let PatternTest {
        pattern,
        should_match,
        should_not_match,
    } = test;

    let glob = compile_with(pattern, opts);

    for path in should_match {
        assert!(
            glob.matches(path),
            "Pattern '{pattern}' did not match path '{path}'"
        );
    }

    for path in should_not_match {
        assert!(
            !glob.matches(path),
            "Pattern '{pattern}' unexpectedly matched path '{path}'"
        );
    }
}

#[test]
fn building_patterns() {
    for valid in [
        "", "a", "a/b", "foo*", "*?*", "**", "a/**/b", "[a-z]", "[^a-z]", "[-a]", "[a-]", "[--0]",
        "{a,b}", "{a,{b,c}}", "{a,b/c}", "a\\*b", "\\{", "[\\]]", "/a", "a/", "a//b", "{a}",
    ] {
        assert!(
            Glob::new(valid).is_ok(),
            "Valid pattern '{valid}' failed to compile"
        );
    }

    for invalid in [
        "[", "[a", "[]", "[z-a]", "[/]", "{a", "{a,b", "a}b", "a]b", "a\\", "a,b",
    ] {
        assert!(
            Glob::new(invalid).is_err(),
            "Invalid pattern '{invalid}' is unexpectedly considered valid"
        );
    }
}

#[test]
fn matching_wildcards() {
    test_pattern(PatternTest {
        pattern: "*",
        should_match: &["a", "ab", "abc", "", "a/", ".."],
        should_not_match: &["/", "/a"],
    });

    test_pattern(PatternTest {
        pattern: "?",
        should_match: &["a", "é", "?", " "],
        should_not_match: &["", "ab"],
    });

    test_pattern(PatternTest {
        pattern: "??",
        should_match: &["aa", "ab", "aé"],
        should_not_match: &["", "a", "aaa", "a/b"],
    });

    test_pattern(PatternTest {
        pattern: "foo*",
        should_match: &["foobar", "foo"],
        should_not_match: &["baz", "fo", "foo/bar"],
    });

    test_pattern(PatternTest {
        pattern: "*?*",
        should_match: &["a", "ab", "abcde"],
        should_not_match: &[""],
    });

    test_pattern(PatternTest {
        pattern: "literal",
        should_match: &["literal", "./literal", "x/../literal"],
        should_not_match: &["litera", "literall", ""],
    });
}

#[test]
fn matching_double_star() {
    for pattern in ["**", "**/**", "**/**/**"] {
        test_pattern(PatternTest {
            pattern,
            should_match: &["", "a", "a/b", "a/b/c", "a/", "foo/../bar"],
            should_not_match: &["../foo", "a/../../b"],
        });
    }

    test_pattern(PatternTest {
        pattern: "foo/**",
        should_match: &["foo", "foo/bar", "foo/bar/baz"],
        should_not_match: &["fob", "bar", "bar/foo"],
    });

    test_pattern(PatternTest {
        pattern: "**/bar",
        should_match: &["bar", "a/bar", "a/b/bar"],
        should_not_match: &["a/barx", "bar/a", "../bar"],
    });

    test_pattern(PatternTest {
        pattern: "a/**/b",
        should_match: &["a/b", "a/x/b", "a/x/y/b"],
        should_not_match: &["a", "b", "a/b/c", "a/../b"],
    });
}

#[test]
fn double_star_inside_a_segment_behaves_like_star() {
    test_pattern(PatternTest {
        pattern: "foo**bar",
        should_match: &["foobar", "foobarbar", "fooxbar"],
        should_not_match: &["foo/bar/bar", "foo/bar", "fooxbar/baz"],
    });

    test_pattern(PatternTest {
        pattern: "foo**",
        should_match: &["foo", "foobar"],
        should_not_match: &["foo/bar", "fo"],
    });

    test_pattern(PatternTest {
        pattern: "**bar",
        should_match: &["bar", "xbar"],
        should_not_match: &["x/bar", "bar/x"],
    });

    // one separator-adjacent side is not enough: the segment still contains
    // other characters
    test_pattern(PatternTest {
        pattern: "foo**/bar",
        should_match: &["foo/bar", "foox/bar"],
        should_not_match: &["foo/x/bar", "foox/y/bar"],
    });
}

#[test]
fn matching_ranges() {
    test_pattern(PatternTest {
        pattern: "a[bcd]e",
        should_match: &["abe", "ace", "ade"],
        should_not_match: &["ae", "aee", "abbe"],
    });

    test_pattern(PatternTest {
        pattern: "a[^bcd]e",
        should_match: &["aee", "a e"],
        should_not_match: &["ae", "abe", "ace", "ade", "a/e"],
    });

    test_pattern(PatternTest {
        pattern: "a[0-9]b",
        should_match: &["a0b", "a5b", "a9b"],
        should_not_match: &["ab", "aab", "a10b"],
    });

    // '-' first, last or doubled is a literal hyphen
    test_pattern(PatternTest {
        pattern: "a[-z]b",
        should_match: &["a-b", "azb"],
        should_not_match: &["amb", "ab"],
    });

    test_pattern(PatternTest {
        pattern: "a[z-]b",
        should_match: &["a-b", "azb"],
        should_not_match: &["amb"],
    });

    test_pattern(PatternTest {
        pattern: "a[0--b]c",
        should_match: &["a0c", "a-c", "abc"],
        should_not_match: &["azc"],
    });

    // punctuation members are ordinary set members
    test_pattern(PatternTest {
        pattern: "foo[a<.*]",
        should_match: &["foo*", "fooa", "foo<", "foo."],
        should_not_match: &["foob", "foo>"],
    });

    // a range never crosses the separator
    test_pattern(PatternTest {
        pattern: "foo[^/]bar",
        should_match: &["foo-bar", "fooxbar"],
        should_not_match: &["foo/bar"],
    });

    test_pattern(PatternTest {
        pattern: "foo[\t-~]bar",
        should_match: &["fooxbar", "foo~bar"],
        should_not_match: &["foo/bar"],
    });
}

#[test]
fn matching_alternations() {
    test_pattern(PatternTest {
        pattern: "foo/{bar,baz/bang}",
        should_match: &["foo/bar", "foo/baz/bang"],
        should_not_match: &["foo/baz", "foo/bang", "foo"],
    });

    test_pattern(PatternTest {
        pattern: "{a,bc}",
        should_match: &["a", "bc"],
        should_not_match: &["", "abc", "b", "c"],
    });

    test_pattern(PatternTest {
        pattern: "{a,b[0-9]?}",
        should_match: &["a", "b1c", "b2é"],
        should_not_match: &["", "ab", "b", "b2"],
    });

    test_pattern(PatternTest {
        pattern: "{a,{b,cd}}e",
        should_match: &["ae", "be", "cde"],
        should_not_match: &["e", "abe", "ce"],
    });

    test_pattern(PatternTest {
        pattern: "{a,b}{c,d}",
        should_match: &["ac", "ad", "bc", "bd"],
        should_not_match: &["ab", "cd", "a", "c"],
    });
}

#[test]
fn matching_normalizes_paths() {
    test_pattern(PatternTest {
        pattern: "foo/bar",
        should_match: &["foo/bar", "foo/./bar", "foo//bar", "foo/baz/../bar"],
        should_not_match: &["foo", "bar"],
    });

    test_pattern(PatternTest {
        pattern: "bar",
        should_match: &["bar", "foo/../bar"],
        should_not_match: &["foo/bar"],
    });
}

#[test]
fn matching_escapes() {
    test_pattern(PatternTest {
        pattern: "foo\\*",
        should_match: &["foo*"],
        should_not_match: &["foobar", "foo"],
    });

    test_pattern(PatternTest {
        pattern: "\\{a\\,b\\}",
        should_match: &["{a,b}"],
        should_not_match: &["a", "b"],
    });
}

#[test]
fn matching_case_insensitive() {
    let insensitive = GlobOptions {
        case_sensitive: Some(false),
        ..GlobOptions::default()
    };

    test_pattern_with(
        PatternTest {
            pattern: "Foo*",
            should_match: &["foobar", "FOOBAR", "Foo"],
            should_not_match: &["bar"],
        },
        insensitive,
    );

    test_pattern_with(
        PatternTest {
            pattern: "a[b-d]e",
            should_match: &["abe", "aBe", "aCe"],
            should_not_match: &["aee", "aée"],
        },
        insensitive,
    );

    // folding is ASCII-only
    test_pattern_with(
        PatternTest {
            pattern: "é",
            should_match: &["é"],
            should_not_match: &["É"],
        },
        insensitive,
    );
}

#[test]
fn matching_windows_style() {
    let windows = GlobOptions {
        style: Some(PathStyle::Windows),
        ..GlobOptions::default()
    };

    let glob = compile_with("C:/foo/*", windows);
    assert!(glob.matches("C:\\foo\\bar"));
    assert!(glob.matches("C:/foo/bar"));
    // Windows style is case-insensitive by default
    assert!(glob.matches("c:/FOO/bar"));
    assert!(!glob.matches("C:/foo/bar/baz"));
    assert!(!glob.matches("D:/foo/bar"));

    let unc = compile_with("//host/share/*.txt", windows);
    assert!(unc.matches("\\\\host\\share\\a.txt"));
    assert!(!unc.matches("//other/share/a.txt"));
}

#[test]
fn matching_url_style() {
    let url = GlobOptions {
        style: Some(PathStyle::Url),
        ..GlobOptions::default()
    };

    let glob = compile_with("http://example.com/*.html", url);
    assert!(glob.matches("http://example.com/index.html"));
    assert!(!glob.matches("http://other.com/index.html"));
    assert!(!glob.matches("http://example.com/sub/index.html"));

    // paths are percent-encoded before matching, so a literal space in the
    // pattern meets its encoded form in the path and vice versa
    let spaced = compile_with("http://example.com/a b/*", url);
    assert!(spaced.matches("http://example.com/a b/c"));
    assert!(spaced.matches("http://example.com/a%20b/c"));
}

#[test]
fn matching_absolute_patterns() {
    test_pattern(PatternTest {
        pattern: "/foo/bar",
        should_match: &["/foo/bar", "/foo/./bar"],
        should_not_match: &["foo/bar"],
    });

    for pattern in ["/**", "/**/**"] {
        // relative paths are also tried in absolute form (resolved against
        // the current directory), so only positives are meaningful here
        test_pattern(PatternTest {
            pattern,
            should_match: &["/a", "/a/b", "/a/b/c", "a/b"],
            should_not_match: &[],
        });
    }
}

#[test]
fn match_as_prefix_is_anchored() {
    let glob = compile("foo*");

    let matched = glob.match_as_prefix("foobar", 0).unwrap();
    assert_eq!(matched.as_str(), "foobar");
    assert_eq!((matched.start(), matched.end()), (0, 6));

    assert!(glob.match_as_prefix("foobar", 1).is_none());
    assert!(glob.match_as_prefix("xfoobar", 0).is_none());

    assert_eq!(glob.all_matches("foobar", 0).len(), 1);
    assert!(glob.all_matches("foobar", 3).is_empty());
}

#[test]
fn quoting_round_trips() {
    for text in ["foo", "a*b", "[a-z]", "{a,b}", "w?t", "a-b (c)"] {
        let quoted = Glob::quote(text);
        let glob = compile(&quoted);
        assert!(
            glob.matches(text),
            "Quoted pattern '{quoted}' did not match its own text"
        );
    }

    assert!(!compile(&Glob::quote("a*b")).matches("axb"));
    assert!(!compile(&Glob::quote("[a]")).matches("a"));
}

#[test]
fn recursive_globs() {
    let glob = compile_with(
        "foo/bar",
        GlobOptions {
            recursive: true,
            ..GlobOptions::default()
        },
    );

    assert!(glob.matches("foo/bar"));
    assert!(glob.matches("foo/bar/baz"));
    assert!(glob.matches("foo/bar/baz/qux"));
    assert!(!glob.matches("foo"));
    assert!(!glob.matches("foo/barx"));
    assert!(glob.is_recursive());
}

#[test]
fn unions() {
    let a = compile("foo*");
    let b = compile("*bar");

    let union = a.union(&b).unwrap();
    assert!(union.matches("foonot"));
    assert!(union.matches("notbar"));
    assert!(union.matches("foobar"));
    assert!(!union.matches("baz"));

    let insensitive = compile_with(
        "x",
        GlobOptions {
            case_sensitive: Some(false),
            ..GlobOptions::default()
        },
    );
    assert!(a.union(&insensitive).is_err());

    let url = compile_with(
        "x",
        GlobOptions {
            style: Some(PathStyle::Url),
            ..GlobOptions::default()
        },
    );
    assert!(a.union(&url).is_err());
}

#[test]
fn glob_value_semantics() {
    let a = compile("foo/*");
    let b = compile("foo/*");
    let c = compile("foo/**");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "foo/*");
    assert_eq!(a.pattern(), "foo/*");
}
