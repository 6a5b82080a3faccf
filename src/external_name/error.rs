//! Error types for external name resolution

use thiserror::Error;

/// Result alias used throughout the external name module
pub type Result<T, E = ExternalNameError> = std::result::Result<T, E>;

/// Failure modes of a strategy, the template renderer or the parameter accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalNameError {
    /// A required parameter or state field is absent (or null)
    #[error("{field} cannot be empty")]
    MissingField { field: String },

    /// A field is present but has the wrong shape
    #[error("{field} needs to be {expected}")]
    TypeMismatch { field: String, expected: String },

    /// A template placeholder could not be resolved, or the template is malformed
    #[error("cannot render template `{template}`: {reason}")]
    TemplateRender { template: String, reason: String },

    /// More than one field of a mutually-exclusive set was supplied
    #[error("only one of {} can be given", .fields.join(", "))]
    AmbiguousInput { fields: Vec<String> },

    /// The identifier is assigned by the provider and cannot be computed before creation
    #[error("identifier is assigned by the provider and is not known until the resource exists")]
    NotYetKnown,

    /// The same resource type was registered twice
    #[error("external name strategy for {resource_type} is registered more than once")]
    DuplicateRegistration { resource_type: String },
}

impl ExternalNameError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// None of a mutually-exclusive field set was supplied
    pub fn missing_one_of(fields: &[&str]) -> Self {
        let field = match fields.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
            Some((last, _)) => (*last).to_string(),
            None => String::new(),
        };
        Self::MissingField { field }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn unresolved(template: &str, placeholder: &str) -> Self {
        Self::TemplateRender {
            template: template.to_string(),
            reason: format!("placeholder `{}` is unresolved", placeholder),
        }
    }

    /// Stable kind name, used in logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "MissingField",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::TemplateRender { .. } => "TemplateRenderError",
            Self::AmbiguousInput { .. } => "AmbiguousInput",
            Self::NotYetKnown => "NotYetKnown",
            Self::DuplicateRegistration { .. } => "DuplicateRegistration",
        }
    }
}

/// Errors raised while building a [`Registry`](super::Registry)
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse external name table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse external name table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid external name entry for {resource_type}: {error}")]
    InvalidEntry {
        resource_type: String,
        error: ExternalNameError,
    },

    #[error(transparent)]
    Registration(#[from] ExternalNameError),
}

/// An [`ExternalNameError`] tagged with the resource type it was raised for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource_type}: {error}")]
pub struct ResolveError {
    pub resource_type: String,
    pub error: ExternalNameError,
}

impl ResolveError {
    pub fn new(resource_type: &str, error: ExternalNameError) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            error,
        }
    }

    /// Whether the caller should defer until the remote resource exists
    pub fn is_not_yet_known(&self) -> bool {
        matches!(self.error, ExternalNameError::NotYetKnown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_one_of_lists_every_field() {
        let err = ExternalNameError::missing_one_of(&["subnet_id", "gateway_id"]);
        assert_eq!(err.to_string(), "subnet_id or gateway_id cannot be empty");

        let err = ExternalNameError::missing_one_of(&["a", "b", "c"]);
        assert_eq!(err.to_string(), "a, b or c cannot be empty");
    }

    #[test]
    fn test_ambiguous_input_message() {
        let err = ExternalNameError::AmbiguousInput {
            fields: vec!["subnet_id".into(), "gateway_id".into()],
        };
        assert_eq!(err.to_string(), "only one of subnet_id, gateway_id can be given");
        assert_eq!(err.kind(), "AmbiguousInput");
    }

    #[test]
    fn test_resolve_error_is_tagged_with_resource_type() {
        let err = ResolveError::new("aws_route", ExternalNameError::missing("route_table_id"));
        assert_eq!(err.to_string(), "aws_route: route_table_id cannot be empty");
        assert!(!err.is_not_yet_known());
        assert!(ResolveError::new("aws_vpc", ExternalNameError::NotYetKnown).is_not_yet_known());
    }
}
