use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A build request loaded from a TOML file.
///
/// Mirrors the command-line surface so a context recipe can be checked in
/// next to the project:
///
/// ```toml
/// context = "app"
/// dockerfile = "docker/Dockerfile.release"
/// dockerignore = "docker/release.dockerignore"
/// paths = ["../shared/libs:vendor/libs"]
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRequest {
    /// Build context directory
    pub context: Option<PathBuf>,
    /// Replacement Dockerfile, stored as `./Dockerfile`
    pub dockerfile: Option<PathBuf>,
    /// Ignore rules file
    pub dockerignore: Option<PathBuf>,
    /// Extra paths to inject, in `SOURCE:DEST` form
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl ContextRequest {
    /// Load a request from the TOML file at `path`.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut request: Self = toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        request.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for field in [
            &mut request.context,
            &mut request.dockerfile,
            &mut request.dockerignore,
        ] {
            if let Some(value) = field.as_mut() {
                *value = request.base_dir.join(&*value);
            }
        }

        tracing::debug!(path = %path.display(), paths = request.paths.len(), "loaded context request");
        Ok(request)
    }

    /// Parses `paths` into replacements, resolving sources against the
    /// request file's directory.
    pub fn replacements(&self) -> crate::Result<Vec<Replacement>> {
        self.paths
            .iter()
            .map(|spec| {
                let mut replacement = Replacement::parse(spec)?;
                replacement.source = self.base_dir.join(&replacement.source);
                Ok(replacement)
            })
            .collect()
    }
}

/// An external file or directory injected into the archive under
/// `./<destination>`.
///
/// # Examples
///
/// ```
/// use tardocken_core::Replacement;
///
/// let r = Replacement::parse("../shared/libs:vendor/libs/").unwrap();
/// assert_eq!(r.source.to_str(), Some("../shared/libs"));
/// assert_eq!(r.destination, "vendor/libs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Path on disk
    pub source: PathBuf,
    /// Archive location relative to the context root, without `./` or a
    /// trailing `/`
    pub destination: String,
}

impl Replacement {
    /// Parses a `SOURCE:DEST` mapping. Exactly one `:` is allowed and both
    /// sides must be non-empty.
    pub fn parse(spec: &str) -> crate::Result<Self> {
        let invalid = |reason| Error::InvalidReplacement {
            spec: spec.to_owned(),
            reason,
        };

        let mut parts = spec.split(':');
        let (Some(source), Some(destination), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected exactly one ':' between SOURCE and DEST"));
        };

        if source.is_empty() {
            return Err(invalid("SOURCE must not be empty"));
        }
        if destination.starts_with('/') {
            return Err(invalid("DEST must be relative to the context root"));
        }

        let mut destination = destination.trim_end_matches('/');
        while let Some(rest) = destination.strip_prefix("./") {
            destination = rest.trim_start_matches('/');
        }
        if destination.is_empty() || destination == "." {
            return Err(invalid("DEST must name a path inside the context"));
        }
        if destination.split('/').any(|part| part == "..") {
            return Err(invalid("DEST must not leave the context root"));
        }

        Ok(Self {
            source: PathBuf::from(source),
            destination: destination.to_owned(),
        })
    }
}

impl FromStr for Replacement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
