//! `.dockerignore` rule matching.
//!
//! Every non-empty line of the rule text is a shell glob matched against
//! the whole context-relative path:
//!
//! - `*` matches any run of characters, `/` included
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[!abc]` match one character from (or outside) a set
//!
//! There are no comments, negations or escapes. A single trailing `/` is
//! dropped because matched paths never carry one.

use std::io::Read;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

/// An immutable set of ignore patterns.
///
/// # Examples
///
/// ```
/// use tardocken_core::IgnoreRuleSet;
///
/// let rules = IgnoreRuleSet::parse("target/\n*.log\n");
/// assert!(rules.matches("target"));
/// assert!(rules.matches("logs/run.log"));
/// assert!(!rules.matches("src/main.rs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    matcher: GlobMatcher,
}

impl IgnoreRuleSet {
    /// Parses newline-delimited rule text.
    pub fn parse(text: &str) -> Self {
        let rules = text
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(|line| line.strip_suffix('/').unwrap_or(line))
            .filter_map(Rule::compile)
            .collect();
        Self { rules }
    }

    /// Reads rule text from a stream.
    pub fn from_reader(mut reader: impl Read) -> crate::Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| crate::Error::IgnoreRead { source: e })?;
        Ok(Self::parse(&text))
    }

    /// Reads and parses a rule file such as `.dockerignore`.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| crate::Error::IgnoreLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        let rules = Self::parse(&text);
        tracing::debug!(path = %path.display(), rules = rules.len(), "loaded ignore rules");
        Ok(rules)
    }

    /// Whether `path` (`/`-separated, no leading `./`) matches any rule.
    pub fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matcher.is_match(path))
    }

    /// Normalized patterns in file order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Rule {
    fn compile(pattern: &str) -> Option<Self> {
        // Lines globset rejects (e.g. a reversed range) fall back to a literal match.
        let matcher = match build_matcher(&to_globset_syntax(pattern)) {
            Ok(matcher) => Ok(matcher),
            Err(e) => {
                tracing::debug!(pattern, error = %e, "matching ignore pattern literally");
                build_matcher(&globset::escape(pattern))
            }
        };

        match matcher {
            Ok(matcher) => Some(Self {
                pattern: pattern.to_owned(),
                matcher,
            }),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "skipping unusable ignore pattern");
                None
            }
        }
    }
}

fn build_matcher(glob: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(glob)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher())
}

/// Rewrites a shell glob so globset reads it the way `fnmatch` does:
/// `*` runs collapse (no recursive `**`), braces are literal, and a `[`
/// without a closing `]` is literal.
fn to_globset_syntax(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    let body: String = chars[i + 1..end].iter().collect();
                    match class_members(&body).as_str() {
                        "^" => out.push('^'),
                        members => {
                            out.push('[');
                            out.push_str(members);
                            out.push(']');
                        }
                    }
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// fnmatch reads a leading `^` in a class as a member, globset as negation,
/// so the `^` moves behind the other members. `^-x` is a range starting at
/// `^`; a reversed one matches nothing and is dropped.
fn class_members(body: &str) -> String {
    let Some(rest) = body.strip_prefix('^') else {
        return body.to_owned();
    };

    if let Some(range) = rest.strip_prefix('-') {
        let mut chars = range.chars();
        if let Some(hi) = chars.next() {
            let tail = chars.as_str();
            return match hi {
                '^' => format!("{tail}^"),
                // `_` is the character after `^`
                hi if hi > '^' => format!("_-{hi}{tail}^"),
                _ => tail.to_owned(),
            };
        }
    }

    format!("{rest}^")
}

/// Index of the `]` closing the class opened at `start`. A `]` directly
/// after `[` or `[!` is a member of the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars
        .get(j..)?
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}
