use bqflow::pipeline::{ParametrizedPipeline, Pipeline, PipelineEntity, PipelineKind, Schedule, StartTime};
use bqflow::{BqFlowError, Entity, ParametrizedEntity, Trigger};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn entity1() -> Entity {
    Entity::new("entity1", "1.0.0")
        .with_stage_versions("raw", [("table_1", "1.0.0")])
        .unwrap()
}

fn start_time() -> StartTime {
    StartTime::utc(Utc.timestamp_opt(1606923514, 0).unwrap())
}

#[test]
fn test_end_to_end_scenario() {
    let pipeline = Pipeline::new("test", "1.0.0")
        .unwrap()
        .with_cron("* 12 * * *")
        .with_entity(entity1());

    let dict = pipeline.to_dict().unwrap();
    assert_eq!(dict["name"], "test");
    assert_eq!(dict["version"], "1.0.0");
    assert_eq!(dict["schedule"], "* 12 * * *");
    assert_eq!(dict["kind"], "vanilla");
    assert_eq!(
        dict["entities"][0]["stage_config"],
        json!([{"name": "raw", "versions": {"table_1": "1.0.0"}}])
    );
}

#[test]
fn test_pubsub_pipeline_dict() {
    let pipeline = Pipeline::new("test", "1.0.0")
        .unwrap()
        .with_cron("* 12 * * *")
        .with_start_time(start_time())
        .with_trigger(Trigger::pubsub("my_topic"));

    let dict = pipeline.to_dict().unwrap();
    assert_eq!(dict["start_time"], "2020-12-02T15:38:34+0000");
    assert_eq!(
        dict["trigger"],
        json!({"type": "pubsub", "topic": "my_topic", "subscription_project": null})
    );
}

#[test]
fn test_pipeline_roundtrip_variants() {
    let full = Pipeline::new("test", "1.0.0")
        .unwrap()
        .with_cron("* 12 * * *")
        .with_kind(PipelineKind::DeltaTracking)
        .with_start_time(start_time())
        .with_trigger(Trigger::gcs_object_exist("landing", "orders/_SUCCESS"))
        .with_entity(entity1())
        .with_entity(Entity::base_layer("entity2", "1.0.0"));

    let mut no_start = full.clone();
    no_start.start_time = None;
    let mut no_schedule = full.clone();
    no_schedule.schedule = None;

    for pipeline in [full, no_start, no_schedule] {
        let loaded = Pipeline::from_dict(&pipeline.to_dict().unwrap()).unwrap();
        assert_eq!(loaded, pipeline);
    }
}

#[test]
fn test_roundtrip_keeps_fractional_start_time() {
    let pipeline = Pipeline::new("test", "1.0.0")
        .unwrap()
        .with_start_time(StartTime::utc(Utc.timestamp_opt(1606923514, 250_000_000).unwrap()));

    let dict = pipeline.to_dict().unwrap();
    assert_eq!(dict["start_time"], "2020-12-02T15:38:34.250+0000");
    assert_eq!(Pipeline::from_dict(&dict).unwrap(), pipeline);

    let now = Pipeline::new("test", "1.0.0")
        .unwrap()
        .with_start_time(StartTime::utc(Utc::now()));
    assert_eq!(Pipeline::from_dict(&now.to_dict().unwrap()).unwrap(), now);
}

#[test]
fn test_invalid_start_time_zone() {
    let err = StartTime::parse("2020-12-02T15:38:34+0000", Some("Europe/Atlantis")).unwrap_err();
    assert!(matches!(err, BqFlowError::InvalidTimezone(_)));
}

#[test]
fn test_pipeline_chaining() {
    let ingest = Pipeline::new("ingest_sales", "1.4.0").unwrap().with_cron("0 3 * * *");
    let report = Pipeline::new("report", "1.0.0").unwrap().schedule_after(&ingest);

    let dict = report.to_dict().unwrap();
    assert_eq!(dict["schedule"], "ingest_sales_1.4.0");

    let loaded = Pipeline::from_dict(&dict).unwrap();
    let target = loaded.schedule.as_ref().and_then(Schedule::target).unwrap();
    assert_eq!(target.name, "ingest_sales");
    assert_eq!(target.version, "1.4.0");
}

fn localized() -> ParametrizedPipeline {
    ParametrizedPipeline::new("test", "1.0.0")
        .unwrap()
        .with_cron("* 12 * * *")
        .with_parameter("language", ["nl", "fr"])
        .with_parameter("country", ["be", "en"])
        .with_entity(
            ParametrizedEntity::new("entity1", "1.0.0")
                .with_stage_versions("raw", [("table_1", "1.0.0")])
                .unwrap(),
        )
        .unwrap()
}

#[test]
fn test_expansion_order() {
    let dicts = localized().to_dict().unwrap();
    let names: Vec<_> = dicts.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["test_nl_be", "test_nl_en", "test_fr_be", "test_fr_en"]);

    let entity_names: Vec<_> = dicts
        .iter()
        .map(|d| d["entities"][0]["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        entity_names,
        vec!["entity1_nl_be", "entity1_nl_en", "entity1_fr_be", "entity1_fr_en"]
    );
}

#[test]
fn test_expansion_cardinality_and_unique_names() {
    let pipeline = localized().with_parameter("env", ["dev", "acc", "prd"]);
    let unrolled = pipeline.unrolled_pipelines().unwrap();
    assert_eq!(unrolled.len(), 2 * 2 * 3);

    let names: HashSet<_> = unrolled.iter().map(|p| p.name.clone()).collect();
    assert_eq!(names.len(), unrolled.len());
}

#[test]
fn test_unrolled_pipeline_matches_rendered_dict() {
    let pipeline = localized();
    let unrolled = pipeline.unrolled_pipelines().unwrap();
    let dicts = pipeline.to_dict().unwrap();

    for (p, d) in unrolled.iter().zip(&dicts) {
        assert_eq!(&p.to_dict().unwrap(), d);
    }
}

#[test]
fn test_static_entity_rejected() {
    let err = localized().with_entity(entity1()).unwrap_err();
    assert!(matches!(err, BqFlowError::NotParametrized(_)));
}

#[test]
fn test_shared_template_across_unrolled() {
    let unrolled = localized().unrolled_pipelines().unwrap();
    assert!(unrolled
        .windows(2)
        .all(|w| w[0].entities[0] == w[1].entities[0]));
    assert!(matches!(unrolled[0].entities[0], PipelineEntity::Parametrized(_)));
}

#[test]
fn test_name_too_long_fails_expansion() {
    let pipeline = ParametrizedPipeline::new("x".repeat(1020), "1.0.0")
        .unwrap()
        .with_parameter("suffix", ["long_value"]);
    assert!(matches!(pipeline.to_dict().unwrap_err(), BqFlowError::NameTooLong(_)));
}
