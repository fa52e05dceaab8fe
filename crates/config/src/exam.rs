use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::SettingsLayer;

/// Slot token meaning "not scored, positional only".
pub const PLACEHOLDER: &str = "np";

/// Largest number of answer choices a question may carry.
pub const MAX_CHOICES: usize = 5;

/// Leading identity columns of every response table (ids, name, raw score,
/// spacer). Response columns follow.
pub const IDENTITY_COLUMNS: usize = 5;

// ---------------------------------------------------------------------------
// Public, validated model
// ---------------------------------------------------------------------------

/// The whole exam document: every version plus an optional settings layer.
#[derive(Debug, Clone)]
pub struct ExamConfig {
    pub versions: Vec<VersionSpec>,
    pub settings: SettingsLayer,
}

/// One shuffled arrangement of the exam.
#[derive(Debug, Clone)]
pub struct VersionSpec {
    pub version: String,
    pub order: Vec<Slot>,
    pub questions: Vec<QuestionDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Question(String),
    Placeholder,
}

impl Slot {
    pub fn qid(&self) -> Option<&str> {
        match self {
            Self::Question(qid) => Some(qid),
            Self::Placeholder => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionDef {
    pub qid: String,
    pub pts: Option<f64>,
    /// Present only for multiple-choice questions.
    pub perm: Option<Permutation>,
    /// Generator variant handed to the question renderer.
    pub variant: Option<String>,
}

/// Bijective remapping from displayed choice position to canonical choice
/// index, both zero-based: `perm[displayed] == canonical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validate `indices` as a permutation of `[0, k)` with `1 <= k <= 5`.
    /// On failure returns the reason as text.
    pub fn new(indices: Vec<usize>) -> Result<Self, String> {
        let k = indices.len();
        if k == 0 {
            return Err("no choices".into());
        }
        if k > MAX_CHOICES {
            return Err(format!("{k} choices exceeds the maximum of {MAX_CHOICES}"));
        }
        let mut seen = [false; MAX_CHOICES];
        for &i in &indices {
            if i >= k {
                return Err(format!("index {i} out of range for {k} choices"));
            }
            if seen[i] {
                return Err(format!("index {i} appears more than once"));
            }
            seen[i] = true;
        }
        Ok(Self(indices))
    }

    pub fn identity(k: usize) -> Self {
        Self((0..k).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Map a 1-based displayed choice to its 1-based canonical choice.
    pub fn canonical_of(&self, displayed: usize) -> Option<usize> {
        let idx = displayed.checked_sub(1)?;
        self.0.get(idx).map(|c| c + 1)
    }

    /// Map a 1-based canonical choice back to where it was displayed.
    pub fn displayed_of(&self, canonical: usize) -> Option<usize> {
        let idx = canonical.checked_sub(1)?;
        self.0.iter().position(|&c| c == idx).map(|p| p + 1)
    }

    pub fn inverse(&self) -> Permutation {
        let mut inv = vec![0; self.0.len()];
        for (displayed, &canonical) in self.0.iter().enumerate() {
            inv[canonical] = displayed;
        }
        Permutation(inv)
    }
}

// ---------------------------------------------------------------------------
// Raw document (serde shape)
// ---------------------------------------------------------------------------

/// Identifiers may be written as integers or strings; both become text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Ident {
    Int(i64),
    Text(String),
}

impl Ident {
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExamConfig {
    versions: Vec<RawVersion>,
    #[serde(default)]
    settings: SettingsLayer,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    version: Ident,
    order: Vec<Ident>,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    qid: Ident,
    #[serde(default)]
    perm: Option<Vec<usize>>,
    #[serde(default)]
    pts: Option<f64>,
    #[serde(default)]
    version: Option<Ident>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ExamConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let raw: RawExamConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        let raw: RawExamConfig =
            serde_yaml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Load from disk, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Self::from_toml(&input),
            "yml" | "yaml" => Self::from_yaml(&input),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn from_raw(raw: RawExamConfig) -> Result<Self, ConfigError> {
        if raw.versions.is_empty() {
            return Err(ConfigError::Validation("at least one version is required".into()));
        }

        let mut version_ids = HashSet::new();
        let mut versions = Vec::with_capacity(raw.versions.len());
        for rv in raw.versions {
            let version = rv.version.into_string();
            if !version_ids.insert(version.clone()) {
                return Err(ConfigError::Validation(format!(
                    "version '{version}' is defined more than once"
                )));
            }
            versions.push(VersionSpec::from_raw(version, rv.order, rv.questions)?);
        }

        Ok(Self {
            versions,
            settings: raw.settings,
        })
    }
}

impl VersionSpec {
    fn from_raw(
        version: String,
        order: Vec<Ident>,
        questions: Vec<RawQuestion>,
    ) -> Result<Self, ConfigError> {
        let mut defined = HashSet::new();
        let mut defs = Vec::with_capacity(questions.len());
        for rq in questions {
            let qid = rq.qid.into_string();
            if !defined.insert(qid.clone()) {
                return Err(ConfigError::DuplicateQuestion { version, qid });
            }
            let perm = match rq.perm {
                Some(indices) => Some(Permutation::new(indices).map_err(|reason| {
                    ConfigError::InvalidPermutation {
                        version: version.clone(),
                        qid: qid.clone(),
                        reason,
                    }
                })?),
                None => None,
            };
            defs.push(QuestionDef {
                qid,
                pts: rq.pts,
                perm,
                variant: rq.version.map(Ident::into_string),
            });
        }

        let mut placed = HashSet::new();
        let mut slots = Vec::with_capacity(order.len());
        for entry in order {
            let id = entry.into_string();
            if id == PLACEHOLDER {
                slots.push(Slot::Placeholder);
                continue;
            }
            if !placed.insert(id.clone()) {
                return Err(ConfigError::Validation(format!(
                    "version '{version}': question '{id}' appears more than once in order"
                )));
            }
            if !defined.contains(&id) {
                log::warn!("version '{version}': slot '{id}' has no question definition");
            }
            slots.push(Slot::Question(id));
        }

        Ok(Self {
            version,
            order: slots,
            questions: defs,
        })
    }

    pub fn question(&self, qid: &str) -> Option<&QuestionDef> {
        self.questions.iter().find(|q| q.qid == qid)
    }

    /// Scored slots with their zero-based position among scored slots.
    pub fn scored_slots(&self) -> impl Iterator<Item = (usize, &str)> {
        self.order.iter().filter_map(Slot::qid).enumerate()
    }

    /// Question definitions without a permutation. These cannot be
    /// reconciled across versions and are deducted from raw scores.
    pub fn unpermuted_count(&self) -> usize {
        self.questions.iter().filter(|q| q.perm.is_none()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
