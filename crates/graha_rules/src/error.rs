use thiserror::Error;

/// Errors raised while evaluating a rule or a single predicate against a chart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Planet {0} not found in chart")]
    PlanetNotFound(String),
    #[error("Malformed planet token '{token}': {reason}")]
    MalformedToken { token: String, reason: String },
    #[error("Invalid params for predicate '{predicate}': {message}")]
    InvalidParams { predicate: String, message: String },
    #[error("Unknown predicate '{0}'")]
    UnknownPredicate(String),
    #[error("Unknown identifier '{0}' in status expression")]
    UnknownIdentifier(String),
}

/// Errors from the rule engine façade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Rule '{0}' not loaded")]
    RuleNotFound(String),
    #[error("Rule '{rule}' failed: {source}")]
    Evaluation {
        rule: String,
        #[source]
        source: EvalError,
    },
}
