use thiserror::Error;

/// Failure of a single executed operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("Instance \"{name}\" not found")]
    InstanceNotFound { name: String },
    #[error("Class \"{name}\" not found")]
    ClassNotFound { name: String },
    #[error("Method \"{method}\" not found on class \"{class_name}\". Available methods: {available}")]
    MethodNotFound {
        method: String,
        class_name: String,
        available: String,
    },
    #[error("Block \"{name}\" not found")]
    BlockNotFound { name: String },
    #[error("Condition \"{name}\" not found")]
    ConditionNotFound { name: String },
    #[error(
        "Cannot {operation} \"{source_name}\" (page {source_page}) and \"{target_name}\" (page {target_page}) across pages"
    )]
    CrossPageOperationRejected {
        operation: &'static str,
        source_name: String,
        target_name: String,
        source_page: String,
        target_page: String,
    },
    #[error("Field \"{field}\" not found on instance \"{instance}\"")]
    FieldNotFound { instance: String, field: String },
    #[error("Undefined variable \"{name}\"")]
    UndefinedVariable { name: String },
    #[error("Operator '{operator}' cannot combine {left} and {right}")]
    InvalidOperand {
        operator: String,
        left: &'static str,
        right: &'static str,
    },
    #[error("Field \"{field}\" of \"{instance}\" is a {found}, not a list")]
    NotAList {
        instance: String,
        field: String,
        found: &'static str,
    },
    #[error("Method \"{method}\" expected {expected} arguments, got {found}")]
    ArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("\"{callable}\" is missing argument \"{argument}\"")]
    MissingArgument { callable: String, argument: String },
    #[error("Call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },
}

impl ExecError {
    pub(crate) fn instance_not_found(name: &str) -> Self {
        Self::InstanceNotFound {
            name: name.to_string(),
        }
    }
}

pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_page_message_names_both_sides() {
        let err = ExecError::CrossPageOperationRejected {
            operation: "connect",
            source_name: "list".to_string(),
            target_name: "form".to_string(),
            source_page: "home".to_string(),
            target_page: "settings".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot connect \"list\" (page home) and \"form\" (page settings) across pages"
        );
        assert!(std::error::Error::source(&err).is_none());
    }
}
