use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read ignore rules from {path}")]
    IgnoreLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read ignore rules")]
    IgnoreRead { source: std::io::Error },

    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid path mapping {spec:?}: {reason}")]
    InvalidReplacement { spec: String, reason: &'static str },
}
