use std::collections::BTreeSet;

use tardocken_core::IgnoreRuleSet;

/// Decides whether an archive entry is kept.
///
/// The decision depends only on the entry's archive path, the active
/// prefix, and the filter list / ignore rules held here, so the root walk
/// and every injected-path walk share one definition of "excluded".
#[derive(Debug, Clone, Copy)]
pub struct PathFilter<'a> {
    filter_list: &'a BTreeSet<String>,
    ignore: Option<&'a IgnoreRuleSet>,
}

impl<'a> PathFilter<'a> {
    pub fn new(filter_list: &'a BTreeSet<String>, ignore: Option<&'a IgnoreRuleSet>) -> Self {
        Self {
            filter_list,
            ignore,
        }
    }

    /// Returns `true` if the entry named `archive_path` belongs in the archive.
    ///
    /// `prefix` is the normalized destination of the walk being filtered
    /// (empty for the context root). A path equal to `prefix` or below
    /// `prefix/` is re-based before the filter list and ignore rules are
    /// consulted; rules written against the full archive location still
    /// apply to it as well.
    pub fn should_include(&self, archive_path: &str, prefix: &str) -> bool {
        let path = normalize(archive_path);
        let rebased = rebase(&path, prefix);

        if self.excludes(rebased) {
            return false;
        }
        rebased == path || !self.excludes(&path)
    }

    fn excludes(&self, path: &str) -> bool {
        self.filter_list.contains(path) || self.ignore.is_some_and(|rules| rules.matches(path))
    }

    /// Binds `prefix` for one walk. The prefix is normalized the same way
    /// entry paths are.
    pub fn scoped(self, prefix: &str) -> impl Fn(&str) -> bool + use<'a> {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            normalize(prefix)
        };
        move |archive_path: &str| self.should_include(archive_path, &prefix)
    }
}

/// Lexically normalizes an archive path: `.` and empty components are
/// dropped, `..` removes the preceding component. An empty result is `.`.
///
/// ```
/// use tardocken_build::filter::normalize;
///
/// assert_eq!(normalize("./src/"), "src");
/// assert_eq!(normalize("./vendor/../libs/a.py"), "libs/a.py");
/// assert_eq!(normalize("."), ".");
/// ```
pub fn normalize(archive_path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in archive_path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

fn rebase<'p>(path: &'p str, prefix: &str) -> &'p str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "",
        Some(rest) => rest.strip_prefix('/').unwrap_or(path),
        None => path,
    }
}
