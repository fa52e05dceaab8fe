use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML / YAML parse or deserialization error (includes missing keys).
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config validation error not tied to a single question.
    #[error("config validation error: {0}")]
    Validation(String),
    /// A `perm` entry is not a bijection over `[0, k)`.
    #[error("version '{version}', question '{qid}': invalid permutation: {reason}")]
    InvalidPermutation {
        version: String,
        qid: String,
        reason: String,
    },
    /// Same question defined twice in one version.
    #[error("version '{version}': question '{qid}' is defined more than once")]
    DuplicateQuestion { version: String, qid: String },
    /// Extension is neither TOML nor YAML.
    #[error("unsupported config format '{0}' (expected .toml, .yml or .yaml)")]
    UnsupportedFormat(String),
}
