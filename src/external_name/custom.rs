//! Custom identifier strategies
//!
//! Resource types whose identifier needs per-field conditional logic that none
//! of the generic constructors can express. Each variant documents the
//! identifier grammar it builds.

use super::context::ResolveContext;
use super::error::{ExternalNameError, Result};
use super::params::{self, ParameterBag};
use serde_json::Value;

const ROUTE_DESTINATIONS: &[&str] = &[
    "destination_cidr_block",
    "destination_ipv6_cidr_block",
    "destination_prefix_list_id",
];

const ROUTE_TABLE_TARGETS: &[&str] = &["subnet_id", "gateway_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomStrategy {
    /// `<route_table_id>_<destination>` where the destination is exactly one of
    /// the IPv4 CIDR, IPv6 CIDR or prefix list id
    Route,
    /// `<subnet_id|gateway_id>/<route_table_id>`
    RouteTableAssociation,
    /// `<function_name>` or `<function_name>/<qualifier>`
    LambdaFunctionUrl,
    /// `<user>/<group1>/<group2>/...`
    IamUserGroupMembership,
    /// `<cluster_name>:<identity_provider_config_name>`, with the name nested
    /// under the single `oidc` block
    EksIdentityProviderConfig,
}

impl CustomStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            CustomStrategy::Route => "route",
            CustomStrategy::RouteTableAssociation => "route_table_association",
            CustomStrategy::LambdaFunctionUrl => "lambda_function_url",
            CustomStrategy::IamUserGroupMembership => "iam_user_group_membership",
            CustomStrategy::EksIdentityProviderConfig => "eks_identity_provider_config",
        }
    }

    pub fn derive_remote_id(&self, ctx: &ResolveContext<'_>) -> Result<String> {
        let parameters = ctx.parameters;
        match self {
            CustomStrategy::Route => {
                let route_table = params::get_string(parameters, "route_table_id")?;
                let (_, destination) = exactly_one_of(parameters, ROUTE_DESTINATIONS)?;
                Ok(format!("{}_{}", route_table, destination))
            }
            CustomStrategy::RouteTableAssociation => {
                let route_table = params::get_string(parameters, "route_table_id")?;
                let (_, target) = exactly_one_of(parameters, ROUTE_TABLE_TARGETS)?;
                Ok(format!("{}/{}", target, route_table))
            }
            CustomStrategy::LambdaFunctionUrl => {
                let function = params::get_string(parameters, "function_name")?;
                match params::get_optional_string(parameters, "qualifier")? {
                    Some(qualifier) if !qualifier.is_empty() => {
                        Ok(format!("{}/{}", function, qualifier))
                    }
                    _ => Ok(function.to_string()),
                }
            }
            CustomStrategy::IamUserGroupMembership => {
                let user = params::get_string(parameters, "user")?;
                let groups = params::get_string_list(parameters, "groups")?;
                let mut parts = Vec::with_capacity(groups.len() + 1);
                parts.push(user);
                parts.extend(groups);
                Ok(parts.join("/"))
            }
            CustomStrategy::EksIdentityProviderConfig => {
                let cluster = params::get_string(parameters, "cluster_name")?;
                Ok(format!("{}:{}", cluster, ctx.external_name))
            }
        }
    }

    pub fn derive_external_name(&self, state: &ParameterBag) -> Result<String> {
        let id = params::get_string(state, "id")?;
        match self {
            CustomStrategy::EksIdentityProviderConfig => id
                .split(':')
                .nth(1)
                .map(str::to_string)
                .ok_or_else(|| {
                    ExternalNameError::type_mismatch("id", "shaped like cluster_name:config_name")
                }),
            _ => Ok(id.to_string()),
        }
    }

    /// Only the EKS identity provider config carries its name in the parameters
    pub fn initialize_parameters(&self, bag: &mut ParameterBag, external_name: &str) -> Result<()> {
        if *self != CustomStrategy::EksIdentityProviderConfig {
            return Ok(());
        }

        let oidc = bag
            .entry("oidc")
            .or_insert_with(|| Value::Array(vec![Value::Object(ParameterBag::new())]));

        let block = match oidc {
            Value::Array(items) if items.len() == 1 => items[0].as_object_mut(),
            _ => None,
        };
        let Some(block) = block else {
            return Err(ExternalNameError::type_mismatch(
                "oidc",
                "a list with exactly one block",
            ));
        };

        block.insert(
            "identity_provider_config_name".to_string(),
            Value::String(external_name.to_string()),
        );
        Ok(())
    }

    pub fn name_is_user_defined(&self) -> bool {
        matches!(self, CustomStrategy::EksIdentityProviderConfig)
    }

    pub fn identifier_fields(&self) -> Vec<&'static str> {
        match self {
            CustomStrategy::Route => {
                let mut fields = vec!["route_table_id"];
                fields.extend_from_slice(ROUTE_DESTINATIONS);
                fields
            }
            CustomStrategy::RouteTableAssociation => {
                let mut fields = ROUTE_TABLE_TARGETS.to_vec();
                fields.push("route_table_id");
                fields
            }
            CustomStrategy::LambdaFunctionUrl => vec!["function_name", "qualifier"],
            CustomStrategy::IamUserGroupMembership => vec!["user", "groups"],
            CustomStrategy::EksIdentityProviderConfig => vec!["cluster_name"],
        }
    }
}

/// Exactly one of a mutually-exclusive field set must be a present string
fn exactly_one_of<'a>(bag: &'a ParameterBag, fields: &[&'static str]) -> Result<(&'static str, &'a str)> {
    let mut present = Vec::new();
    for field in fields {
        if let Some(value) = params::get_optional_string(bag, field)? {
            present.push((*field, value));
        }
    }

    match present.as_slice() {
        [one] => Ok(*one),
        [] => Err(ExternalNameError::missing_one_of(fields)),
        _ => Err(ExternalNameError::AmbiguousInput {
            fields: present.iter().map(|(f, _)| f.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> ParameterBag {
        serde_json::from_value(value).unwrap()
    }

    fn remote_id(strategy: CustomStrategy, params: Value) -> Result<String> {
        let params = bag(params);
        strategy.derive_remote_id(&ResolveContext::new("", &params))
    }

    #[test]
    fn test_route_picks_the_single_destination() {
        let id = remote_id(
            CustomStrategy::Route,
            json!({"route_table_id": "rtb-1", "destination_ipv6_cidr_block": "::/0"}),
        )
        .unwrap();
        assert_eq!(id, "rtb-1_::/0");

        let id = remote_id(
            CustomStrategy::Route,
            json!({"route_table_id": "rtb-1", "destination_cidr_block": "10.0.0.0/16", "destination_prefix_list_id": null}),
        )
        .unwrap();
        assert_eq!(id, "rtb-1_10.0.0.0/16");
    }

    #[test]
    fn test_route_requires_route_table() {
        let err = remote_id(CustomStrategy::Route, json!({"destination_cidr_block": "10.0.0.0/16"}))
            .unwrap_err();
        assert_eq!(err, ExternalNameError::missing("route_table_id"));
    }

    #[test]
    fn test_route_without_destination_names_the_set() {
        let err = remote_id(CustomStrategy::Route, json!({"route_table_id": "rtb-1"})).unwrap_err();
        assert_eq!(err, ExternalNameError::missing_one_of(ROUTE_DESTINATIONS));
    }

    #[test]
    fn test_route_with_two_destinations_is_ambiguous() {
        let err = remote_id(
            CustomStrategy::Route,
            json!({
                "route_table_id": "rtb-1",
                "destination_cidr_block": "10.0.0.0/16",
                "destination_prefix_list_id": "pl-1"
            }),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ExternalNameError::AmbiguousInput {
                fields: vec![
                    "destination_cidr_block".to_string(),
                    "destination_prefix_list_id".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_route_table_association() {
        let id = remote_id(
            CustomStrategy::RouteTableAssociation,
            json!({"route_table_id": "rtb-1", "gateway_id": "igw-9"}),
        )
        .unwrap();
        assert_eq!(id, "igw-9/rtb-1");

        let err = remote_id(
            CustomStrategy::RouteTableAssociation,
            json!({"route_table_id": "rtb-1", "gateway_id": "igw-9", "subnet_id": "subnet-2"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "AmbiguousInput");
    }

    #[test]
    fn test_lambda_function_url_qualifier_is_optional() {
        let strategy = CustomStrategy::LambdaFunctionUrl;
        assert_eq!(remote_id(strategy, json!({"function_name": "fn"})).unwrap(), "fn");
        assert_eq!(
            remote_id(strategy, json!({"function_name": "fn", "qualifier": ""})).unwrap(),
            "fn"
        );
        assert_eq!(
            remote_id(strategy, json!({"function_name": "fn", "qualifier": "live"})).unwrap(),
            "fn/live"
        );
        assert_eq!(
            remote_id(strategy, json!({"qualifier": "live"})).unwrap_err(),
            ExternalNameError::missing("function_name")
        );
    }

    #[test]
    fn test_iam_user_group_membership() {
        let strategy = CustomStrategy::IamUserGroupMembership;
        assert_eq!(
            remote_id(strategy, json!({"user": "alice", "groups": ["admins", "devs"]})).unwrap(),
            "alice/admins/devs"
        );
        assert_eq!(
            remote_id(strategy, json!({"user": "alice"})).unwrap_err(),
            ExternalNameError::missing("groups")
        );
        assert_eq!(
            remote_id(strategy, json!({"user": "alice", "groups": ["admins", 3]}))
                .unwrap_err()
                .kind(),
            "TypeMismatch"
        );
    }

    #[test]
    fn test_eks_identity_provider_config_round_trip() {
        let strategy = CustomStrategy::EksIdentityProviderConfig;
        let params = bag(json!({"cluster_name": "prod"}));
        let id = strategy
            .derive_remote_id(&ResolveContext::new("okta", &params))
            .unwrap();
        assert_eq!(id, "prod:okta");

        let state = bag(json!({ "id": id }));
        assert_eq!(strategy.derive_external_name(&state).unwrap(), "okta");

        let state = bag(json!({"id": "no-separator"}));
        assert_eq!(strategy.derive_external_name(&state).unwrap_err().kind(), "TypeMismatch");
    }

    #[test]
    fn test_eks_initializer_fills_the_oidc_block() {
        let strategy = CustomStrategy::EksIdentityProviderConfig;

        let mut params = bag(json!({"cluster_name": "prod"}));
        strategy.initialize_parameters(&mut params, "okta").unwrap();
        assert_eq!(params["oidc"][0]["identity_provider_config_name"], "okta");

        let mut params = bag(json!({"oidc": [{"client_id": "abc"}]}));
        strategy.initialize_parameters(&mut params, "okta").unwrap();
        assert_eq!(params["oidc"][0]["client_id"], "abc");
        assert_eq!(params["oidc"][0]["identity_provider_config_name"], "okta");

        let mut params = bag(json!({"oidc": [{}, {}]}));
        assert!(strategy.initialize_parameters(&mut params, "okta").is_err());
    }

    #[test]
    fn test_provider_assigned_customs_read_id_verbatim() {
        let state = bag(json!({"id": "r-rtb-1_10.0.0.0/16"}));
        assert_eq!(
            CustomStrategy::Route.derive_external_name(&state).unwrap(),
            "r-rtb-1_10.0.0.0/16"
        );
        assert!(!CustomStrategy::Route.name_is_user_defined());

        let mut params = ParameterBag::new();
        CustomStrategy::Route.initialize_parameters(&mut params, "x").unwrap();
        assert!(params.is_empty());
    }
}
