use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("template references undefined variable '{0}'")]
    UnknownVariable(String),
    #[error("placeholder opened at byte {offset} is never closed")]
    UnterminatedPlaceholder { offset: usize },
    #[error("no generator registered for question '{0}'")]
    UnknownQuestion(String),
    #[error("question '{qid}': {message}")]
    Generator { qid: String, message: String },
}

impl ComposeError {
    pub fn generator(qid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generator {
            qid: qid.into(),
            message: message.into(),
        }
    }
}
