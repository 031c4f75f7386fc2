use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tardocken_core::{IgnoreRuleSet, Replacement};
use walkdir::WalkDir;

use crate::{ArchiveWriter, PathFilter};

/// Filter list entry suppressing the context's own Dockerfile.
const DOCKERFILE: &str = "Dockerfile";

/// Builds the tar archive a docker daemon receives as its build context.
///
/// # Examples
///
/// ```no_run
/// use tardocken_build::ContextArchiveBuilder;
/// use tardocken_core::{IgnoreRuleSet, Replacement};
///
/// let rules = IgnoreRuleSet::parse("*.log\ntarget/\n");
/// let bytes = ContextArchiveBuilder::new("app")
///     .dockerfile("docker/Dockerfile.release")
///     .replacement(Replacement::parse("../shared/libs:vendor/libs").unwrap())
///     .ignore_rules(Some(rules))
///     .build()
///     .unwrap();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ContextArchiveBuilder {
    context: PathBuf,
    dockerfile: Option<PathBuf>,
    filter_list: BTreeSet<String>,
    replacements: Vec<Replacement>,
    ignore: Option<IgnoreRuleSet>,
}

impl ContextArchiveBuilder {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: context.into(),
            dockerfile: None,
            filter_list: BTreeSet::new(),
            replacements: Vec::new(),
            ignore: None,
        }
    }

    /// Replaces the context's `Dockerfile` with the file at `path`.
    pub fn dockerfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(path.into());
        self.filter_list.insert(DOCKERFILE.to_owned());
        self
    }

    /// Injects `replacement.source` under `./<replacement.destination>`.
    /// Replacements are written in the order they are added.
    pub fn replacement(mut self, replacement: Replacement) -> Self {
        self.replacements.push(replacement);
        self
    }

    pub fn replacements(mut self, replacements: impl IntoIterator<Item = Replacement>) -> Self {
        self.replacements.extend(replacements);
        self
    }

    pub fn ignore_rules(mut self, rules: Option<IgnoreRuleSet>) -> Self {
        self.ignore = rules;
        self
    }

    /// Excludes the context-relative path `name` from every walk.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.filter_list.insert(name.into());
        self
    }

    pub fn filter_list(&self) -> &BTreeSet<String> {
        &self.filter_list
    }

    /// Assembles the archive. Any filesystem error aborts the build.
    pub fn build(&self) -> Result<Vec<u8>, ContextError> {
        let filter = PathFilter::new(&self.filter_list, self.ignore.as_ref());
        let mut archive = ArchiveWriter::new();

        add_tree(&mut archive, &self.context, ".", filter.scoped(""))?;

        for replacement in &self.replacements {
            let base = format!("./{}", replacement.destination);
            tracing::debug!(
                source = %replacement.source.display(),
                destination = %base,
                "adding injected path"
            );
            add_tree(
                &mut archive,
                &replacement.source,
                &base,
                filter.scoped(&replacement.destination),
            )?;
        }

        if let Some(dockerfile) = &self.dockerfile {
            archive.append_file("./Dockerfile", dockerfile)?;
        }

        let entries = archive.len();
        let bytes = archive.finish()?;
        tracing::info!(
            context = %self.context.display(),
            entries,
            bytes = bytes.len(),
            "built context archive"
        );
        Ok(bytes)
    }
}

/// Walks `root` in file-name order, appending every entry `include` keeps
/// under `base`. Excluded directories are not descended into.
fn add_tree(
    archive: &mut ArchiveWriter,
    root: &Path,
    base: &str,
    include: impl Fn(&str) -> bool,
) -> Result<(), ContextError> {
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| ContextError::Walk {
            root: root.to_path_buf(),
            source: e,
        })?;
        let name = archive_name(base, entry.path(), entry.depth())?;

        if !include(&name) {
            tracing::debug!(name, "excluded");
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let meta = entry.metadata().map_err(|e| ContextError::Walk {
            root: root.to_path_buf(),
            source: e,
        })?;
        archive.append(&name, entry.path(), &meta)?;
    }

    Ok(())
}

/// Archive name for a walked path `depth` levels below the walk root.
fn archive_name(base: &str, path: &Path, depth: usize) -> Result<String, ContextError> {
    let components: Vec<_> = path.components().collect();
    let relative = &components[components.len().saturating_sub(depth)..];

    let mut name = base.to_owned();
    for component in relative {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ContextError::InvalidEntryName(path.to_path_buf()))?;
        name.push('/');
        name.push_str(part);
    }
    Ok(name)
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to walk {root}")]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read metadata of {path}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read symlink {path}")]
    ReadLink {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to append {name} to the archive")]
    Append {
        name: String,
        source: std::io::Error,
    },
    #[error("failed to finish the archive")]
    Finish { source: std::io::Error },
    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),
    #[error("{0} cannot be stored in the archive: name is not valid UTF-8")]
    InvalidEntryName(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_joins_relative_components() {
        assert_eq!(archive_name(".", Path::new("/ctx"), 0).unwrap(), ".");
        assert_eq!(
            archive_name(".", Path::new("/ctx/src/main.rs"), 2).unwrap(),
            "./src/main.rs"
        );
        assert_eq!(
            archive_name("./vendor/libs", Path::new("libs/core.py"), 1).unwrap(),
            "./vendor/libs/core.py"
        );
        assert_eq!(
            archive_name("./config/settings.py", Path::new("../settings.prod.py"), 0).unwrap(),
            "./config/settings.py"
        );
    }

    #[cfg(unix)]
    #[test]
    fn archive_name_rejects_non_utf8() {
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/ctx").join(std::ffi::OsStr::from_bytes(b"bad\xff"));
        let err = archive_name(".", &path, 1).unwrap_err();
        assert!(matches!(err, ContextError::InvalidEntryName(_)));
    }

    #[test]
    fn dockerfile_populates_filter_list() {
        let builder = ContextArchiveBuilder::new(".").dockerfile("Dockerfile.prod");
        assert!(builder.filter_list().contains("Dockerfile"));
    }
}
