use std::collections::BTreeMap;

use examkit_config::{ExamConfig, Permutation};

/// Where one canonical question sits in one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Zero-based index among the version's scored slots.
    pub position: usize,
    pub perm: Permutation,
}

impl Placement {
    /// Response column name: the 1-based slot number.
    pub fn column(&self) -> String {
        (self.position + 1).to_string()
    }
}

/// Canonical question id -> per-version placement. Built once, read-only.
#[derive(Debug, Clone)]
pub struct CanonicalQuestionMap {
    versions: Vec<String>,
    /// BTreeMap keeps ids in textual order; that is the output column order.
    entries: BTreeMap<String, Vec<Option<Placement>>>,
    skipped: Vec<usize>,
}

impl CanonicalQuestionMap {
    pub fn build(config: &ExamConfig) -> Self {
        let n = config.versions.len();
        let mut entries: BTreeMap<String, Vec<Option<Placement>>> = BTreeMap::new();
        let mut skipped = Vec::with_capacity(n);

        for (vi, version) in config.versions.iter().enumerate() {
            for (position, qid) in version.scored_slots() {
                let Some(def) = version.question(qid) else { continue };
                let Some(perm) = &def.perm else { continue };
                entries.entry(qid.to_string()).or_insert_with(|| vec![None; n])[vi] =
                    Some(Placement {
                        position,
                        perm: perm.clone(),
                    });
            }

            for def in &version.questions {
                if def.perm.is_some() && !version.order.iter().any(|s| s.qid() == Some(&def.qid)) {
                    log::warn!(
                        "version '{}': question '{}' has a permutation but no slot",
                        version.version,
                        def.qid
                    );
                }
            }

            skipped.push(version.unpermuted_count());
        }

        log::debug!(
            "canonical map: {} question(s) across {} version(s)",
            entries.len(),
            n
        );

        Self {
            versions: config.versions.iter().map(|v| v.version.clone()).collect(),
            entries,
            skipped,
        }
    }

    /// Master question list, sorted.
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn placement(&self, qid: &str, version: usize) -> Option<&Placement> {
        self.entries.get(qid)?.get(version)?.as_ref()
    }

    /// Skipped-from-scoring question count for a version.
    pub fn skipped(&self, version: usize) -> usize {
        self.skipped.get(version).copied().unwrap_or(0)
    }

    /// Number of canonical questions the version carries.
    pub fn questions_in(&self, version: usize) -> usize {
        self.entries
            .values()
            .filter(|per_version| matches!(per_version.get(version), Some(Some(_))))
            .count()
    }
}
