//! Compiles the glob dialect used by policy specifiers into anchored
//! regexes.
//!
//! The rewrite, token by token over the resolved path:
//!
//! ```text
//! ...      -> .*                 any number of path components
//! ?        -> .                  exactly one character
//! *        -> (\\.|[^\\/])*      within one component; tolerates escaped /
//! {a,b}    -> (a|b)              alternation; , is literal outside braces
//! .[]{}()\+|^$ -> escaped        literal match
//! ```
//!
//! The result is anchored at both ends and suffixed with `(/.*)?`, so a
//! rule naming a directory also governs everything beneath it while
//! `~/foo` never matches `~/foobar`.

use regex::Regex;

use crate::error::{ConfigError, ErrorKind};

/// Compiled matcher for one specifier path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Tests a candidate path against the pattern and its subtree.
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The compiled regex source, for diagnostics.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

fn needs_escape(ch: char) -> bool {
    matches!(
        ch,
        '.' | '[' | ']' | '{' | '}' | '(' | ')' | '\\' | '+' | '|' | '^' | '$'
    )
}

/// Compiles a resolved, normalized specifier path. `line` is the config
/// line index the path came from, carried into any brace error.
pub fn compile(path: &str, line: usize) -> Result<PathPattern, ConfigError> {
    let brace_error = |detail: &str| {
        ConfigError::new(
            line,
            ErrorKind::UnterminatedBrace,
            format!("{detail} in glob: {path}"),
        )
    };

    let mut text = String::with_capacity(path.len() + 8);
    text.push('^');

    let chars: Vec<char> = path.chars().collect();
    let mut within_brace = false;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '.' && chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') {
            text.push_str(".*");
            i += 3;
            continue;
        }
        match ch {
            '?' => text.push('.'),
            '*' => text.push_str(r"(\\.|[^\\/])*"),
            '{' => {
                if within_brace {
                    return Err(brace_error("nested {}s"));
                }
                within_brace = true;
                text.push('(');
            }
            ',' if within_brace => text.push('|'),
            '}' => {
                if !within_brace {
                    return Err(brace_error("unbalanced }"));
                }
                within_brace = false;
                text.push(')');
            }
            ch if needs_escape(ch) => {
                text.push('\\');
                text.push(ch);
            }
            ch => text.push(ch),
        }
        i += 1;
    }
    if within_brace {
        return Err(brace_error("unterminated {"));
    }

    text.push_str("(/.*)?$");

    // Every metacharacter was rewritten or escaped above, so the pattern
    // text is always a valid regex.
    let regex = Regex::new(&text).expect("generated pattern must be valid");
    Ok(PathPattern { regex })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(path: &str) -> PathPattern {
        compile(path, 0).unwrap()
    }

    #[test]
    fn literal_paths_match_themselves_and_their_subtree() {
        let p = pattern("/home/pat/src");
        assert!(p.matches("/home/pat/src"));
        assert!(p.matches("/home/pat/src/x/y"));
        assert!(!p.matches("/home/pat/srcfoo"));
        assert!(!p.matches("/home/pat"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let p = pattern("/a?c");
        assert!(p.matches("/abc"));
        assert!(!p.matches("/ac"));
        assert!(!p.matches("/abbc"));
    }

    #[test]
    fn star_stays_within_one_component() {
        let p = pattern("/a/*c");
        assert!(p.matches("/a/bc"));
        assert!(p.matches("/a/c"));
        assert!(!p.matches("/a/b/c"));
    }

    #[test]
    fn triple_dot_crosses_components() {
        let p = pattern("/a/.../z");
        assert!(p.matches("/a/b/z"));
        assert!(p.matches("/a/b/c/d/z"));
        assert!(!p.matches("/a/z/w"));

        let p = pattern("~/.../*~");
        assert!(p.matches("~/a/b/c~"));
        assert!(!p.matches("~/a/b/c"));
    }

    #[test]
    fn braces_become_alternation() {
        let p = pattern("~/src/{main,test}");
        assert!(p.matches("~/src/main"));
        assert!(p.matches("~/src/test"));
        assert!(p.matches("~/src/test/deep"));
        assert!(!p.matches("~/src/other"));
    }

    #[test]
    fn comma_outside_braces_is_literal() {
        let p = pattern("/a,b");
        assert!(p.matches("/a,b"));
        assert!(!p.matches("/a"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = pattern("/c++/v1.0");
        assert!(p.matches("/c++/v1.0"));
        assert!(!p.matches("/c/v1x0"));
    }

    #[test]
    fn bad_braces_are_errors() {
        let err = compile("/src/{main,test", 7).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedBrace);
        assert_eq!(err.line, 7);

        assert_eq!(
            compile("/src/{a,{b,c}}", 0).unwrap_err().kind,
            ErrorKind::UnterminatedBrace
        );
        assert_eq!(
            compile("/src/a}", 0).unwrap_err().kind,
            ErrorKind::UnterminatedBrace
        );
    }

}
