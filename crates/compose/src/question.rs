use std::collections::BTreeMap;

use examkit_config::{Permutation, VersionSpec};
use serde_json::{Map, Value};

use crate::error::ComposeError;
use crate::render::{Renderer, TexRenderer};

/// Reorder `choices` for display: displayed position `j` shows canonical
/// choice `perm[j]`. Also returns the zero-based displayed position of
/// canonical choice 0 (the correct answer).
pub fn permute<T: Clone>(choices: &[T], perm: &Permutation) -> Option<(Vec<T>, usize)> {
    if choices.len() != perm.len() {
        return None;
    }
    let shown = perm.as_slice().iter().map(|&c| choices[c].clone()).collect();
    let correct = perm.as_slice().iter().position(|&c| c == 0)?;
    Some((shown, correct))
}

/// Produces the TeX for one question. `variant` selects among generator
/// variants; `pts` and `perm` come straight from the question definition.
pub trait QuestionGenerator: Send + Sync {
    fn render(
        &self,
        variant: Option<&str>,
        pts: Option<f64>,
        perm: Option<&Permutation>,
    ) -> Result<String, ComposeError>;
}

/// Question identifiers mapped to their generators.
#[derive(Default)]
pub struct QuestionRegistry {
    generators: BTreeMap<String, Box<dyn QuestionGenerator>>,
}

impl QuestionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `generator` under `qid`, replacing any earlier one.
    pub fn register(&mut self, qid: impl Into<String>, generator: impl QuestionGenerator + 'static) {
        self.generators.insert(qid.into(), Box::new(generator));
    }

    pub fn get(&self, qid: &str) -> Option<&dyn QuestionGenerator> {
        self.generators.get(qid).map(|g| g.as_ref())
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// Multiple-choice question written as a stem plus canonical choices, the
/// correct one first. The stem may use `\VAR{variant}` and `\VAR{pts}`.
#[derive(Debug, Clone)]
pub struct ChoiceQuestion {
    qid: String,
    stem: String,
    choices: Vec<String>,
    renderer: TexRenderer,
}

impl ChoiceQuestion {
    pub fn new(qid: impl Into<String>, stem: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            qid: qid.into(),
            stem: stem.into(),
            choices,
            renderer: TexRenderer::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: TexRenderer) -> Self {
        self.renderer = renderer;
        self
    }
}

impl QuestionGenerator for ChoiceQuestion {
    fn render(
        &self,
        variant: Option<&str>,
        pts: Option<f64>,
        perm: Option<&Permutation>,
    ) -> Result<String, ComposeError> {
        let mut vars = Map::new();
        vars.insert("variant".into(), variant.map_or(Value::Null, |v| Value::String(v.into())));
        vars.insert("pts".into(), pts.map_or(Value::Null, Value::from));
        let stem = self.renderer.render(&self.stem, &vars)?;

        let mut out = match pts {
            Some(p) => format!("\\question[{p}] {stem}\n"),
            None => format!("\\question {stem}\n"),
        };
        if self.choices.is_empty() {
            return Ok(out);
        }

        let identity;
        let perm = match perm {
            Some(p) => p,
            None => {
                identity = Permutation::identity(self.choices.len());
                &identity
            }
        };
        let (shown, correct) = permute(&self.choices, perm).ok_or_else(|| {
            ComposeError::generator(
                &self.qid,
                format!(
                    "permutation has {} entries but the question has {} choices",
                    perm.len(),
                    self.choices.len()
                ),
            )
        })?;

        out.push_str("\\begin{choices}\n");
        for (i, choice) in shown.iter().enumerate() {
            let marker = if i == correct { "\\CorrectChoice" } else { "\\choice" };
            out.push_str(&format!("  {marker} {choice}\n"));
        }
        out.push_str("\\end{choices}\n");
        Ok(out)
    }
}

/// Render one version's questions in slot order. Placeholders produce
/// nothing; slots without a definition are skipped with a warning.
pub fn compose_version(
    spec: &VersionSpec,
    registry: &QuestionRegistry,
) -> Result<Vec<String>, ComposeError> {
    let mut rendered = Vec::new();
    for (_, qid) in spec.scored_slots() {
        let Some(def) = spec.question(qid) else {
            log::warn!("version '{}': slot '{qid}' has no definition, omitted", spec.version);
            continue;
        };
        let generator = registry
            .get(qid)
            .ok_or_else(|| ComposeError::UnknownQuestion(qid.to_string()))?;
        rendered.push(generator.render(def.variant.as_deref(), def.pts, def.perm.as_ref())?);
    }
    log::debug!("version '{}': composed {} question(s)", spec.version, rendered.len());
    Ok(rendered)
}
