mod common;

use std::fs;

use common::{approx_eq, Workspace, ANNUAL_CSV, CONSUMPTION_CSV, MONTHLY_CSV};
use enerbilan_core::geo::{build_feature_collection, export_regions};
use enerbilan_core::{run, PipelineError};
use geojson::GeoJson;
use polars::prelude::*;

#[test]
fn export_joins_annual_production_onto_region_shapes() -> anyhow::Result<()> {
    let workspace = Workspace::new();
    let config = workspace.seed(CONSUMPTION_CSV, Some(MONTHLY_CSV), ANNUAL_CSV);
    run(&config)?;

    let export = export_regions(&config)?;
    assert_eq!(export.features, 1);
    assert_eq!(export.skipped, 0);

    let geojson: GeoJson = fs::read_to_string(&export.path)?.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        panic!("expected a FeatureCollection");
    };
    let properties = collection.features[0]
        .properties
        .as_ref()
        .expect("properties");

    assert_eq!(properties["regionCode"], "11");
    assert_eq!(properties["regionName"], "Île-de-France");
    assert!(approx_eq(properties["Nucléaire"].as_f64().unwrap_or_default(), 600.0));
    assert!(approx_eq(properties["Éolienne"].as_f64().unwrap_or_default(), 400.0));
    assert!(approx_eq(properties["Thermique"].as_f64().unwrap_or(-1.0), 0.0));
    assert!(approx_eq(properties["Total"].as_f64().unwrap_or_default(), 1000.0));
    assert_eq!(properties["center"], serde_json::json!([48.7, 2.5]));
    Ok(())
}

#[test]
fn export_requires_the_monthly_file() -> anyhow::Result<()> {
    let workspace = Workspace::new();
    let config = workspace.seed(CONSUMPTION_CSV, None, ANNUAL_CSV);
    run(&config)?;

    assert!(matches!(
        export_regions(&config),
        Err(PipelineError::MissingRequiredFile { .. })
    ));
    Ok(())
}

#[test]
fn regions_without_shapes_or_production_are_handled() -> anyhow::Result<()> {
    let square = r#"{"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}"#;
    let geography = DataFrame::new(vec![
        Series::new("Code INSEE région".into(), vec!["53", "53", "94", "01"]).into(),
        Series::new(
            "Région".into(),
            vec![Some("Bretagne"), Some("Bretagne"), Some("Corse"), None],
        )
        .into(),
        Series::new(
            "Géo-shape région".into(),
            vec![None, Some(square), Some("{broken"), Some(square)],
        )
        .into(),
    ])?;
    let detail = DataFrame::new(vec![
        Series::new("code_reg".into(), vec!["53", "53", "53"]).into(),
        Series::new("filiere".into(), vec!["Solaire", "Éolienne", "Solaire"]).into(),
        Series::new("prod_mwh".into(), vec![100.0, 250.0, 50.0]).into(),
    ])?;

    let (collection, skipped) = build_feature_collection(&geography, &detail)?;

    assert_eq!(skipped, 1);
    assert_eq!(collection.features.len(), 2);

    // BTreeMap order: "01" before "53"
    let guadeloupe = collection.features[0].properties.as_ref().expect("props");
    assert_eq!(guadeloupe["regionCode"], "01");
    assert!(guadeloupe["regionName"].is_null());
    assert!(guadeloupe["Solaire"].is_null());
    assert!(guadeloupe["Total"].is_null());
    assert!(guadeloupe.get("center").is_none());

    let bretagne = collection.features[1].properties.as_ref().expect("props");
    assert_eq!(bretagne["regionCode"], "53");
    assert!(approx_eq(bretagne["Solaire"].as_f64().unwrap_or_default(), 150.0));
    assert!(approx_eq(bretagne["Éolienne"].as_f64().unwrap_or_default(), 250.0));
    assert!(approx_eq(bretagne["Total"].as_f64().unwrap_or_default(), 400.0));
    Ok(())
}
