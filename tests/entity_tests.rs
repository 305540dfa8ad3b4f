use bqflow::entity::{Entity, EntityTemplate, Parameters, ParametrizedEntity, StageConfigProvider, VersionMap};
use bqflow::{
    Argument, BqFlowError, BuilderSignature, CustomCode, Dependency, Function, ProcedureArgument,
    Query, QueryKind, StoredProcedure, Transformation, View, BASE_LAYER_STAGES,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn transformation(name: &str) -> Transformation {
    Transformation::new(name, "SELECT * FROM source", "1.0.0").unwrap()
}

fn view(name: &str) -> View {
    View::new(name, "SELECT * FROM source", "1.0.0").unwrap()
}

#[test]
fn test_stage_uniqueness_any_order() {
    let mut entity = Entity::new("sales", "1.0.0");
    entity.add_view("staging", view("orders")).unwrap();
    let err = entity.add_transformation("staging", transformation("orders")).unwrap_err();
    assert!(matches!(err, BqFlowError::ConflictingName(_)));

    let mut entity = Entity::new("sales", "1.0.0");
    entity.add_transformation("staging", transformation("orders")).unwrap();
    let err = entity.add_view("staging", view("orders")).unwrap_err();
    assert!(matches!(err, BqFlowError::ConflictingName(_)));
}

#[test]
fn test_functions_share_stage_namespace() {
    let mut entity = Entity::new("sales", "1.0.0");
    entity
        .add_function(
            "staging",
            Function::new(
                "normalize",
                "LOWER(x)",
                "1.0.0",
                vec![Argument::new("x", "STRING")],
                Some("STRING".to_string()),
            )
            .unwrap(),
        )
        .unwrap();

    let err = entity
        .add_stored_procedure(
            "staging",
            StoredProcedure::new("normalize", "BEGIN END", "1.0.0", vec![ProcedureArgument::new("x", "STRING", None)])
                .unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, BqFlowError::ConflictingName(_)));
}

#[test]
fn test_stage_config_provider() {
    let entity = Entity::new("sales", "1.0.0")
        .with_stage_versions("raw", [("orders", "1.0.0")])
        .unwrap();
    let provider: &dyn StageConfigProvider = &entity;

    assert_eq!(provider.stages(), vec!["raw"]);
    assert_eq!(provider.get_stage_versions("raw").unwrap()["orders"], "1.0.0");
    assert!(matches!(
        provider.get_stage_versions("staging").unwrap_err(),
        BqFlowError::StageNotFound(_)
    ));
}

#[test]
fn test_base_layer_stages() {
    let entity = Entity::base_layer("sales", "1.0.0");
    assert!(entity.is_base_layer());
    assert_eq!(entity.stages(), BASE_LAYER_STAGES.to_vec());
    for stage in BASE_LAYER_STAGES {
        assert!(entity.get_stage_versions(stage).unwrap().is_empty());
    }
}

#[test]
fn test_entity_roundtrip_with_everything() {
    let mut entity = Entity::new("sales", "2.1.0");
    entity
        .add_transformation(
            "staging",
            transformation("orders").with_dependencies(vec![Dependency::new("crm", "raw", "customers")]),
        )
        .unwrap();
    entity.add_view("data_mart", view("orders_report")).unwrap();
    entity
        .add_custom_operator(
            "data_mart",
            CustomCode::new("export", "1.0.0", BuilderSignature::standard("plugins.export.build"))
                .unwrap()
                .with_requirements(["google-cloud-storage>=1.30"])
                .unwrap(),
        )
        .unwrap();

    let dict = entity.to_dict().unwrap();
    assert_eq!(
        dict["stage_config"],
        json!([
            {"name": "staging", "versions": {"orders": "1.0.0"}},
            {"name": "data_mart", "versions": {"orders_report": "1.0.0"}}
        ])
    );
    assert_eq!(dict["custom_operators"][0]["name"], "data_mart");

    let loaded = Entity::from_dict(&dict).unwrap();
    assert_eq!(loaded, entity);
    assert_eq!(loaded.get_query("data_mart", "orders_report").map(Query::kind), Some(QueryKind::View));
}

#[test]
fn test_from_dict_rejects_conflicting_queries() {
    let dict = json!({
        "name": "sales",
        "version": "1.0.0",
        "stage_config": [],
        "transformations": [{
            "name": "raw",
            "queries": [
                {"NAME": "orders", "QUERY": "SELECT 1", "VERSION": "1.0.0"},
                {"NAME": "orders", "QUERY": "SELECT 2", "VERSION": "1.0.0", "KIND": "view"}
            ]
        }]
    });
    assert!(matches!(Entity::from_dict(&dict).unwrap_err(), BqFlowError::ConflictingName(_)));
}

#[derive(Debug)]
struct RegionalEntity {
    entity: Entity,
}

impl EntityTemplate for RegionalEntity {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn get_stage_versions(&self, stage: &str, parameters: &Parameters) -> bqflow::Result<VersionMap> {
        let mut versions = self.entity.get_stage_versions(stage)?.clone();
        if parameters.get("country").map(String::as_str) == Some("be") {
            if let Some(version) = versions.get_mut("orders") {
                *version = "1.1.0".to_string();
            }
        }
        Ok(versions)
    }
}

#[test]
fn test_template_override_per_parameter() {
    let template = RegionalEntity {
        entity: Entity::new("sales", "1.0.0")
            .with_stage_versions("staging", [("orders", "1.0.0")])
            .unwrap(),
    };

    let be = Parameters::from([("country".to_string(), "be".to_string())]);
    let en = Parameters::from([("country".to_string(), "en".to_string())]);

    let be_dict = template.to_dict(&be).unwrap();
    assert_eq!(be_dict["name"], "sales_be");
    assert_eq!(be_dict["stage_config"][0]["versions"]["orders"], "1.1.0");
    assert_eq!(template.to_dict(&en).unwrap()["stage_config"][0]["versions"]["orders"], "1.0.0");
}

#[test]
fn test_parametrized_entity_ignores_parameters_for_versions() {
    let entity = ParametrizedEntity::base_layer("sales", "1.0.0")
        .with_stage_versions("staging", [("orders", "1.0.0")])
        .unwrap();
    let params = Parameters::from([("language".to_string(), "fr".to_string())]);

    assert_eq!(
        EntityTemplate::get_stage_versions(&entity, "staging", &params).unwrap()["orders"],
        "1.0.0"
    );
    assert!(EntityTemplate::get_stage_versions(&entity, "datalake", &params).unwrap().is_empty());
}

#[test]
fn test_reload_keeps_overridden_stage_versions() {
    let mut entity = Entity::new("sales", "1.0.0");
    entity.add_transformation("staging", transformation("orders")).unwrap();
    let template = RegionalEntity { entity };

    let be = Parameters::from([("country".to_string(), "be".to_string())]);
    let dict = template.to_dict(&be).unwrap();
    assert_eq!(dict["stage_config"], json!([{"name": "staging", "versions": {"orders": "1.1.0"}}]));

    let loaded = Entity::from_dict(&dict).unwrap();
    assert_eq!(loaded.get_stage_versions("staging").unwrap()["orders"], "1.1.0");
    assert!(loaded.get_query("staging", "orders").is_some());
    assert_eq!(loaded.to_dict().unwrap(), dict);
}

#[test]
fn test_roundtrip_after_stage_versions_replaced() {
    let mut entity = Entity::new("sales", "1.0.0");
    entity.add_transformation("raw", transformation("t")).unwrap();
    entity
        .set_stage_versions("raw", VersionMap::from([("t".to_string(), "2.0.0".to_string())]))
        .unwrap();

    let loaded = Entity::from_dict(&entity.to_dict().unwrap()).unwrap();
    assert_eq!(loaded.get_stage_versions("raw").unwrap()["t"], "2.0.0");
    assert_eq!(loaded, entity);
}
