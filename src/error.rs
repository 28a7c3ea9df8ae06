use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("State transition error: cannot transition {entity} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("Sealed error: {0} is sealed and cannot be modified")]
    Sealed(&'static str),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Unknown coercion: {0}")]
    UnknownCoercion(String),
    #[error("Unknown validator: {0}")]
    UnknownValidator(String),
    #[error("Invalid options for validator {validator}: {problem}")]
    InvalidValidatorOptions { validator: String, problem: String },
    #[error("Event error: {0}")]
    EventError(String),
}

impl RuntimeError {
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
