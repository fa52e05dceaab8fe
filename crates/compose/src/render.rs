use std::fmt;

use serde_json::{Map, Value};

use crate::error::ComposeError;

/// Fills placeholders in a template from a variable map.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, vars: &Map<String, Value>) -> Result<String, ComposeError>;
}

/// Placeholder markers. LaTeX-friendly by default so templates stay
/// valid TeX around them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: r"\VAR{".to_string(),
            close: "}".to_string(),
        }
    }
}

/// Substitutes `\VAR{name}` placeholders. Names may be dotted paths into
/// nested objects (`course.title`) or arrays (`questions.0`).
#[derive(Debug, Clone, Default)]
pub struct TexRenderer {
    delimiters: Delimiters,
}

impl TexRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }
}

impl Renderer for TexRenderer {
    fn render(&self, template: &str, vars: &Map<String, Value>) -> Result<String, ComposeError> {
        let Delimiters { open, close } = &self.delimiters;
        if open.is_empty() || close.is_empty() {
            return Ok(template.to_string());
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        let mut consumed = 0;

        while let Some(start) = rest.find(open.as_str()) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + open.len()..];
            let end = after_open
                .find(close.as_str())
                .ok_or(ComposeError::UnterminatedPlaceholder {
                    offset: consumed + start,
                })?;

            let name = after_open[..end].trim();
            let value = lookup(vars, name).ok_or_else(|| ComposeError::UnknownVariable(name.to_string()))?;
            write_value(&mut out, value);

            let advance = start + open.len() + end + close.len();
            consumed += advance;
            rest = &rest[advance..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn lookup<'a>(vars: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = vars.get(segments.next()?)?;
    for seg in segments {
        current = match current {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                write_value(out, item);
            }
        }
        other => out.push_str(&other.to_string()),
    }
}

/// siunitx markup: `\num{v}`, or `\qty{v}{unit}` when a unit is given,
/// with `[opts]` after the macro name when options are given.
pub fn si(value: impl fmt::Display, unit: Option<&str>, opts: Option<&str>) -> String {
    let opts = opts.map(|o| format!("[{o}]")).unwrap_or_default();
    match unit {
        Some(unit) => format!(r"\qty{opts}{{{value}}}{{{unit}}}"),
        None => format!(r"\num{opts}{{{value}}}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn substitutes_scalars_and_paths() {
        let r = TexRenderer::new();
        let out = r
            .render(
                r"\section{\VAR{course.title}} worth \VAR{ pts } (\VAR{draft}\VAR{none})",
                &vars(json!({"course": {"title": "ME 201"}, "pts": 2.5, "draft": false, "none": null})),
            )
            .unwrap();
        assert_eq!(out, r"\section{ME 201} worth 2.5 (false)");
    }

    #[test]
    fn arrays_render_one_item_per_line() {
        let r = TexRenderer::new();
        let v = vars(json!({"questions": ["a", "b"]}));
        assert_eq!(r.render(r"\VAR{questions}", &v).unwrap(), "a\nb");
        assert_eq!(r.render(r"\VAR{questions.1}", &v).unwrap(), "b");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let r = TexRenderer::new();
        let err = r.render(r"x \VAR{missing}", &Map::new()).unwrap_err();
        assert_eq!(err, ComposeError::UnknownVariable("missing".into()));
    }

    #[test]
    fn unterminated_placeholder_reports_offset() {
        let r = TexRenderer::new();
        let v = vars(json!({"a": 1}));
        let err = r.render(r"\VAR{a} and \VAR{b", &v).unwrap_err();
        assert_eq!(err, ComposeError::UnterminatedPlaceholder { offset: 12 });
    }

    #[test]
    fn custom_delimiters() {
        let r = TexRenderer::with_delimiters(Delimiters {
            open: "<<".into(),
            close: ">>".into(),
        });
        let out = r.render(r"\VAR{x} <<x>>", &vars(json!({"x": 7}))).unwrap();
        assert_eq!(out, r"\VAR{x} 7");
    }

    #[test]
    fn si_forms() {
        assert_eq!(si(1.5, None, None), r"\num{1.5}");
        assert_eq!(si(1.5, Some(r"\meter"), None), r"\qty{1.5}{\meter}");
        assert_eq!(
            si(0.125, Some(r"\meter"), Some("round-mode=figures, round-precision=2")),
            r"\qty[round-mode=figures, round-precision=2]{0.125}{\meter}"
        );
        assert_eq!(si(3, None, Some("x")), r"\num[x]{3}");
    }
}
