//! Resolution scenarios through the facade and the built-in registry

use extname::external_name::{
    get_all_resource_types, get_registry, get_strategy, initialize, resolve_external_name,
    resolve_remote_id, ContextDocument, ExternalNameError, ExternalNameTable, IdentifierStrategy,
    ParameterBag, Registry, RegistryBuilder, RegistryError, ResolveContext, Resolver,
};
use serde_json::{json, Value};

fn bag(value: Value) -> ParameterBag {
    serde_json::from_value(value).unwrap()
}

fn aws_setup() -> (ParameterBag, ParameterBag) {
    (
        bag(json!({"region": "eu-west-1"})),
        bag(json!({"account_id": "123456789012"})),
    )
}

#[test]
fn test_neptune_cluster_endpoint_scenario() {
    let params = bag(json!({"cluster_identifier": "my-cluster"}));
    let ctx = ResolveContext::new("my-endpoint", &params);

    let id = resolve_remote_id("aws_neptune_cluster_endpoint", &ctx).unwrap();
    assert_eq!(id, "my-cluster:my-endpoint");

    let name =
        resolve_external_name("aws_neptune_cluster_endpoint", &bag(json!({"id": id}))).unwrap();
    assert_eq!(name, "my-endpoint");
}

#[test]
fn test_license_association_reports_whichever_field_is_missing() {
    let only_resource = bag(json!({"resource_arn": "arn:aws:ec2:eu-west-1:1:instance/i-1"}));
    let err = resolve_remote_id(
        "aws_licensemanager_association",
        &ResolveContext::new("", &only_resource),
    )
    .unwrap_err();
    assert_eq!(err.error, ExternalNameError::missing("license_configuration_arn"));

    let only_license = bag(json!({"license_configuration_arn": "arn:aws:license-manager:lc-1"}));
    let err = resolve_remote_id(
        "aws_licensemanager_association",
        &ResolveContext::new("", &only_license),
    )
    .unwrap_err();
    assert_eq!(err.error, ExternalNameError::missing("resource_arn"));

    // Field order in the strategy does not change which field is named
    let reversed =
        IdentifierStrategy::formatted_from_provider(",", &["license_configuration_arn", "resource_arn"]);
    let err = reversed
        .derive_remote_id(&ResolveContext::new("", &only_license))
        .unwrap_err();
    assert_eq!(err, ExternalNameError::missing("resource_arn"));
}

#[test]
fn test_license_association_joins_fields_in_order() {
    let params = bag(json!({
        "resource_arn": "arn:aws:ec2:eu-west-1:1:instance/i-1",
        "license_configuration_arn": "arn:aws:license-manager:lc-1"
    }));
    let id = resolve_remote_id(
        "aws_licensemanager_association",
        &ResolveContext::new("", &params),
    )
    .unwrap();
    assert_eq!(
        id,
        "arn:aws:ec2:eu-west-1:1:instance/i-1,arn:aws:license-manager:lc-1"
    );
}

#[test]
fn test_unregistered_type_is_identity() {
    let params = bag(json!({"name": "whatever"}));
    let id = resolve_remote_id("aws_never_registered", &ResolveContext::new("thing", &params)).unwrap();
    assert_eq!(id, "thing");
    assert_eq!(get_strategy("aws_never_registered"), &IdentifierStrategy::NameAsIdentifier);
}

#[test]
fn test_sns_topic_arn_uses_setup_layers() {
    let (configuration, client_metadata) = aws_setup();
    let params = ParameterBag::new();
    let ctx = ResolveContext::new("alerts", &params)
        .with_configuration(&configuration)
        .with_client_metadata(&client_metadata);

    let id = resolve_remote_id("aws_sns_topic", &ctx).unwrap();
    assert_eq!(id, "arn:aws:sns:eu-west-1:123456789012:alerts");
    assert_eq!(
        resolve_external_name("aws_sns_topic", &bag(json!({"id": id}))).unwrap(),
        "alerts"
    );
}

#[test]
fn test_sns_topic_without_account_id_is_a_render_error() {
    let (configuration, _) = aws_setup();
    let params = ParameterBag::new();
    let ctx = ResolveContext::new("alerts", &params).with_configuration(&configuration);

    let err = resolve_remote_id("aws_sns_topic", &ctx).unwrap_err();
    assert_eq!(err.resource_type, "aws_sns_topic");
    assert_eq!(err.error.kind(), "TemplateRenderError");
}

#[test]
fn test_context_document_drives_resolution() {
    let doc: ContextDocument = serde_json::from_value(json!({
        "parameters": {},
        "setup": {
            "configuration": {"region": "us-west-2"},
            "client_metadata": {"account_id": "210987654321"}
        },
        "external_name": "ingest"
    }))
    .unwrap();

    let id = resolve_remote_id("aws_kinesis_stream", &doc.as_context()).unwrap();
    assert_eq!(id, "arn:aws:kinesis:us-west-2:210987654321:stream/ingest");
}

#[test]
fn test_s3_bucket_initialize_then_resolve() {
    let mut params = bag(json!({"acl": "private"}));
    initialize("aws_s3_bucket", &mut params, "my-bucket").unwrap();
    assert_eq!(params["bucket"], "my-bucket");

    let id = resolve_remote_id("aws_s3_bucket", &ResolveContext::new("my-bucket", &params)).unwrap();
    assert_eq!(id, "my-bucket");
    assert_eq!(
        resolve_external_name("aws_s3_bucket", &bag(json!({"bucket": "my-bucket", "id": "x"})))
            .unwrap(),
        "my-bucket"
    );
}

#[test]
fn test_provider_generated_defers_then_follows_state() {
    let params = ParameterBag::new();
    let err = resolve_remote_id("aws_vpc", &ResolveContext::new("", &params)).unwrap_err();
    assert!(err.is_not_yet_known());
    assert_eq!(err.error, ExternalNameError::NotYetKnown);

    let name = resolve_external_name("aws_vpc", &bag(json!({"id": "vpc-0abc"}))).unwrap();
    assert_eq!(name, "vpc-0abc");
    assert_eq!(
        resolve_remote_id("aws_vpc", &ResolveContext::new(&name, &params)).unwrap(),
        "vpc-0abc"
    );

    let mut untouched = ParameterBag::new();
    initialize("aws_vpc", &mut untouched, "vpc-0abc").unwrap();
    assert!(untouched.is_empty());
}

#[test]
fn test_route_needs_exactly_one_destination() {
    let none = bag(json!({"route_table_id": "rtb-1"}));
    let err = resolve_remote_id("aws_route", &ResolveContext::new("", &none)).unwrap_err();
    assert_eq!(err.error.kind(), "MissingField");

    let both = bag(json!({
        "route_table_id": "rtb-1",
        "destination_cidr_block": "10.0.0.0/16",
        "destination_prefix_list_id": "pl-1"
    }));
    let err = resolve_remote_id("aws_route", &ResolveContext::new("", &both)).unwrap_err();
    assert_eq!(err.error.kind(), "AmbiguousInput");

    let one = bag(json!({"route_table_id": "rtb-1", "destination_cidr_block": "10.0.0.0/16"}));
    assert_eq!(
        resolve_remote_id("aws_route", &ResolveContext::new("", &one)).unwrap(),
        "rtb-1_10.0.0.0/16"
    );
}

#[test]
fn test_eks_identity_provider_config_nests_name() {
    let mut params = bag(json!({"cluster_name": "prod"}));
    initialize("aws_eks_identity_provider_config", &mut params, "github").unwrap();
    assert_eq!(params["oidc"][0]["identity_provider_config_name"], "github");

    let id = resolve_remote_id(
        "aws_eks_identity_provider_config",
        &ResolveContext::new("github", &params),
    )
    .unwrap();
    assert_eq!(id, "prod:github");
    assert_eq!(
        resolve_external_name("aws_eks_identity_provider_config", &bag(json!({"id": id}))).unwrap(),
        "github"
    );
}

#[test]
fn test_builtin_tables_cover_known_resources() {
    let registry = get_registry();
    for resource_type in [
        "aws_vpc",
        "aws_s3_bucket",
        "aws_sns_topic",
        "aws_eks_addon",
        "aws_route",
        "aws_lambda_function_url",
        "aws_iam_user_group_membership",
    ] {
        assert!(registry.contains(resource_type), "{} should be registered", resource_type);
    }
    assert_eq!(get_all_resource_types().len(), registry.len());
}

#[test]
fn test_extra_table_extends_builtin_registry() {
    let table = ExternalNameTable::from_yaml(
        r#"
external_names:
  - resource: example_widget
    kind: formatted_name_first
    name_field: widget_name
    separator: "/"
    fields: [shelf]
"#,
    )
    .unwrap();
    let mut builder = RegistryBuilder::with_builtin().unwrap();
    builder.load_table(table).unwrap();
    let registry = builder.build();
    let resolver = Resolver::new(&registry);

    let params = bag(json!({"shelf": "top"}));
    assert_eq!(
        resolver
            .resolve_remote_id("example_widget", &ResolveContext::new("gear", &params))
            .unwrap(),
        "gear/top"
    );
    assert!(resolver.registry().contains("aws_vpc"));
}

#[test]
fn test_duplicate_entries_in_a_table_are_rejected() {
    let table = ExternalNameTable::from_json(
        r#"{"external_names": [
            {"resource": "example_dup", "kind": "name_as_identifier"},
            {"resource": "example_dup", "kind": "provider_generated"}
        ]}"#,
    )
    .unwrap();
    let err = Registry::builder().load_table(table).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Registration(ExternalNameError::DuplicateRegistration { ref resource_type })
            if resource_type == "example_dup"
    ));
}

#[test]
fn test_every_builtin_strategy_handles_an_empty_bag() {
    // No strategy may panic on missing input; failures must be typed errors
    let params = ParameterBag::new();
    let state = ParameterBag::new();
    for resource_type in get_all_resource_types() {
        let _ = resolve_remote_id(resource_type, &ResolveContext::new("name", &params));
        let err = resolve_external_name(resource_type, &state).unwrap_err();
        assert_eq!(err.error.kind(), "MissingField", "{}", resource_type);
    }
}
