use thiserror::Error;

/// Error types that can occur in the rule engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Pattern references a fact type that was never registered
    #[error("unknown fact type: {name}")]
    UnknownFactType {
        /// Fact type name that was not found
        name: String,
    },

    /// Pattern references a field the fact type does not declare
    #[error("unknown field '{field}' on fact type '{fact_type}'")]
    UnknownField {
        /// Fact type being matched
        fact_type: String,
        /// Field name that was not found
        field: String,
    },

    /// Constraint literal or joined field has the wrong type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Actual type
        actual: String,
    },

    /// Constraint is structurally invalid (unordered comparison, malformed
    /// `In` literal, duplicate or unbound binding variable, empty rule)
    #[error("invalid constraint: {message}")]
    InvalidConstraint {
        /// Error message
        message: String,
    },

    /// A fact type with the same name is already registered
    #[error("fact type '{name}' is already registered")]
    DuplicateFactType {
        /// Conflicting fact type name
        name: String,
    },

    /// Retract of a fact id that is not in working memory
    #[error("unknown fact id: {id}")]
    UnknownFact {
        /// Fact id that was not found
        id: u64,
    },

    /// `run` or `register_rule` called while the engine is already running
    #[error("engine is not quiescent: {message}")]
    Reentrancy {
        /// What was attempted
        message: String,
    },

    /// Fact rejected by the schema validator before reaching working memory
    #[error("validation error: {message}")]
    Validation {
        /// Error message
        message: String,
    },

    /// Error returned by a user-supplied rule action
    #[error("action for rule '{rule}' failed: {message}")]
    Action {
        /// Rule whose action failed
        rule: String,
        /// Error message
        message: String,
    },
}

impl EngineError {
    /// True for compile-time errors that abort rule registration
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownFactType { .. }
                | EngineError::UnknownField { .. }
                | EngineError::TypeMismatch { .. }
                | EngineError::InvalidConstraint { .. }
                | EngineError::DuplicateFactType { .. }
        )
    }
}

/// Convenient Result type alias for rule engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
