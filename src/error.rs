use std::path::PathBuf;
use thiserror::Error;

/// Reason a file (or a line of a file) contributed no records.
///
/// Skips are logged by the caller and never surface through the query API.
#[derive(Debug, Error)]
pub enum Skip {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid frontmatter in {}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("frontmatter in {} is not a key/value mapping", .0.display())]
    FrontmatterShape(PathBuf),
}
