//! Identifier Strategies
//!
//! Each strategy pairs a forward mapping (desired parameters to remote
//! identifier) with a reverse mapping (remote state to external name) and an
//! optional initializer that injects the external name into the parameters
//! before a create. Strategies are plain immutable values; every constructor
//! returns a complete strategy.

use super::context::ResolveContext;
use super::custom::CustomStrategy;
use super::error::{ExternalNameError, Result};
use super::params::{self, ParameterBag};
use super::template::Template;
use serde_json::Value;

/// Field that conventionally carries a resource's name
const NAME_FIELD: &str = "name";

/// Field of the remote state that holds the remote identifier
const ID_FIELD: &str = "id";

/// Where the user-chosen name sits in a joined identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePosition {
    First,
    Last,
}

/// Forward/reverse identifier mapping for one resource type
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IdentifierStrategy {
    /// The provider assigns the identifier on create; it is read back from `id`
    ProviderGenerated,

    /// The external name is the remote identifier
    #[default]
    NameAsIdentifier,

    /// A single parameter field is the remote identifier
    ParameterAsIdentifier { field: String },

    /// Identifier rendered from a template, usually embedding the external name once
    TemplatedString {
        /// Parameter field the external name is copied into before create
        name_field: Option<String>,
        template: Template,
        /// False when the external name is provider-assigned
        user_defined: bool,
    },

    /// Parameter fields joined in order; nothing in the identifier is user-chosen
    FormattedFromProvider { separator: String, fields: Vec<String> },

    /// Parameter fields joined with the external name at the first or last position
    FormattedUserDefinedName {
        name_field: String,
        separator: String,
        fields: Vec<String>,
        position: NamePosition,
    },

    Custom(CustomStrategy),
}

impl IdentifierStrategy {
    pub fn provider_generated() -> Self {
        IdentifierStrategy::ProviderGenerated
    }

    pub fn name_as_identifier() -> Self {
        IdentifierStrategy::NameAsIdentifier
    }

    pub fn parameter_as_identifier(field: &str) -> Self {
        IdentifierStrategy::ParameterAsIdentifier {
            field: field.to_string(),
        }
    }

    /// Templated identifier whose external name is chosen by the user.
    ///
    /// An empty `name_field` means no field is initialized from the name.
    pub fn templated_string(name_field: &str, template: &str) -> Result<Self> {
        Ok(IdentifierStrategy::TemplatedString {
            name_field: (!name_field.is_empty()).then(|| name_field.to_string()),
            template: Template::parse(template)?,
            user_defined: true,
        })
    }

    /// Templated identifier whose `external_name` part is assigned by the provider
    pub fn templated_string_with_no_name(template: &str) -> Result<Self> {
        Ok(IdentifierStrategy::TemplatedString {
            name_field: None,
            template: Template::parse(template)?,
            user_defined: false,
        })
    }

    pub fn formatted_from_provider(separator: &str, fields: &[&str]) -> Self {
        IdentifierStrategy::FormattedFromProvider {
            separator: separator.to_string(),
            fields: to_owned(fields),
        }
    }

    /// Parameter fields followed by the external name, e.g. `cluster_name:addon_name`.
    ///
    /// Assumes the user-chosen part is the trailing token, which does not
    /// hold for every remote identifier shape.
    pub fn formatted_name_last(name_field: &str, separator: &str, fields: &[&str]) -> Self {
        Self::formatted_user_defined(name_field, separator, fields, NamePosition::Last)
    }

    /// The external name followed by parameter fields, e.g. `budget_name:product_id`
    pub fn formatted_name_first(name_field: &str, separator: &str, fields: &[&str]) -> Self {
        Self::formatted_user_defined(name_field, separator, fields, NamePosition::First)
    }

    fn formatted_user_defined(
        name_field: &str,
        separator: &str,
        fields: &[&str],
        position: NamePosition,
    ) -> Self {
        IdentifierStrategy::FormattedUserDefinedName {
            name_field: name_field.to_string(),
            separator: separator.to_string(),
            fields: to_owned(fields),
            position,
        }
    }

    pub fn custom(strategy: CustomStrategy) -> Self {
        IdentifierStrategy::Custom(strategy)
    }

    /// Stable kind name used in logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            IdentifierStrategy::ProviderGenerated => "provider_generated",
            IdentifierStrategy::NameAsIdentifier => "name_as_identifier",
            IdentifierStrategy::ParameterAsIdentifier { .. } => "parameter",
            IdentifierStrategy::TemplatedString { .. } => "templated",
            IdentifierStrategy::FormattedFromProvider { .. } => "formatted_from_provider",
            IdentifierStrategy::FormattedUserDefinedName {
                position: NamePosition::Last,
                ..
            } => "formatted_name_last",
            IdentifierStrategy::FormattedUserDefinedName {
                position: NamePosition::First,
                ..
            } => "formatted_name_first",
            IdentifierStrategy::Custom(_) => "custom",
        }
    }

    /// Desired parameters to remote identifier
    pub fn derive_remote_id(&self, ctx: &ResolveContext<'_>) -> Result<String> {
        match self {
            IdentifierStrategy::ProviderGenerated => {
                // Once created, the external name holds the identifier read back from state
                if ctx.external_name.is_empty() {
                    Err(ExternalNameError::NotYetKnown)
                } else {
                    Ok(ctx.external_name.to_string())
                }
            }
            IdentifierStrategy::NameAsIdentifier => Ok(ctx.external_name.to_string()),
            IdentifierStrategy::ParameterAsIdentifier { field } => {
                params::get_string(ctx.parameters, field).map(str::to_string)
            }
            IdentifierStrategy::TemplatedString { template, .. } => {
                if template.is_empty() {
                    return Ok(ctx.external_name.to_string());
                }
                template.render(ctx)
            }
            IdentifierStrategy::FormattedFromProvider { separator, fields } => {
                Ok(string_fields(ctx.parameters, fields)?.join(separator.as_str()))
            }
            IdentifierStrategy::FormattedUserDefinedName {
                separator,
                fields,
                position,
                ..
            } => {
                let mut parts = string_fields(ctx.parameters, fields)?;
                match position {
                    NamePosition::First => parts.insert(0, ctx.external_name),
                    NamePosition::Last => parts.push(ctx.external_name),
                }
                Ok(parts.join(separator.as_str()))
            }
            IdentifierStrategy::Custom(custom) => custom.derive_remote_id(ctx),
        }
    }

    /// Remote state to external name
    pub fn derive_external_name(&self, state: &ParameterBag) -> Result<String> {
        match self {
            IdentifierStrategy::ParameterAsIdentifier { field } => {
                params::get_string(state, field).map(str::to_string)
            }
            IdentifierStrategy::TemplatedString { template, .. } => {
                let id = params::get_string(state, ID_FIELD)?;
                template.extract_external_name(id).map(str::to_string)
            }
            IdentifierStrategy::FormattedUserDefinedName {
                separator,
                position,
                ..
            } => {
                let id = params::get_string(state, ID_FIELD)?;
                let token = match position {
                    NamePosition::First => id.split(separator.as_str()).next(),
                    NamePosition::Last => id.rsplit(separator.as_str()).next(),
                };
                Ok(token.unwrap_or(id).to_string())
            }
            IdentifierStrategy::Custom(custom) => custom.derive_external_name(state),
            IdentifierStrategy::ProviderGenerated
            | IdentifierStrategy::NameAsIdentifier
            | IdentifierStrategy::FormattedFromProvider { .. } => {
                params::get_string(state, ID_FIELD).map(str::to_string)
            }
        }
    }

    /// Inject the external name into the desired parameters before a create.
    ///
    /// This mutates `bag` in place. An empty external name leaves it untouched.
    pub fn initialize_parameters(&self, bag: &mut ParameterBag, external_name: &str) -> Result<()> {
        if external_name.is_empty() {
            return Ok(());
        }

        let field = match self {
            IdentifierStrategy::NameAsIdentifier => NAME_FIELD,
            IdentifierStrategy::ParameterAsIdentifier { field } => field.as_str(),
            IdentifierStrategy::TemplatedString {
                name_field: Some(field),
                user_defined: true,
                ..
            } => field.as_str(),
            IdentifierStrategy::FormattedUserDefinedName { name_field, .. } => name_field.as_str(),
            IdentifierStrategy::Custom(custom) => {
                return custom.initialize_parameters(bag, external_name)
            }
            _ => return Ok(()),
        };

        bag.insert(field.to_string(), Value::String(external_name.to_string()));
        Ok(())
    }

    /// Whether the external name is chosen by the caller rather than the provider
    pub fn name_is_user_defined(&self) -> bool {
        match self {
            IdentifierStrategy::ProviderGenerated
            | IdentifierStrategy::FormattedFromProvider { .. } => false,
            IdentifierStrategy::TemplatedString { user_defined, .. } => *user_defined,
            IdentifierStrategy::Custom(custom) => custom.name_is_user_defined(),
            _ => true,
        }
    }

    /// Parameter fields the identifier is built from
    pub fn identifier_fields(&self) -> Vec<&str> {
        match self {
            IdentifierStrategy::ProviderGenerated | IdentifierStrategy::NameAsIdentifier => {
                Vec::new()
            }
            IdentifierStrategy::ParameterAsIdentifier { field } => vec![field.as_str()],
            IdentifierStrategy::TemplatedString { template, .. } => template.parameter_fields(),
            IdentifierStrategy::FormattedFromProvider { fields, .. }
            | IdentifierStrategy::FormattedUserDefinedName { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            IdentifierStrategy::Custom(custom) => custom.identifier_fields(),
        }
    }
}

fn to_owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Every field must be present and a string; the first failure is reported
fn string_fields<'a>(bag: &'a ParameterBag, fields: &[String]) -> Result<Vec<&'a str>> {
    fields.iter().map(|f| params::get_string(bag, f)).collect()
}
