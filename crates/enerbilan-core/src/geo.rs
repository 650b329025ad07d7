//! Regional GeoJSON export: annual production per source joined onto region shapes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use polars::prelude::DataFrame;
use serde_json::json;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader::load_required;
use crate::output::write_bytes;
use crate::production::{CATEGORY, REGION_CODE};
use crate::reshape::{PRODUCTION_MWH, SOURCE_LABEL};
use crate::schema::{
    self, PRODUCTION_REGION_CODE, PRODUCTION_REGION_NAME, REGION_GEOGRAPHY, REGION_POINT,
    REGION_SHAPE,
};
use crate::values::{coerce_f64, text_values};

const GEOGRAPHY_TEXT_COLUMNS: [&str; 5] = [
    schema::MONTH,
    PRODUCTION_REGION_CODE,
    PRODUCTION_REGION_NAME,
    REGION_SHAPE,
    REGION_POINT,
];

const DETAIL_TEXT_COLUMNS: [&str; 4] = [REGION_CODE, "nom_reg", SOURCE_LABEL, CATEGORY];

const TOTAL_PROPERTY: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoExport {
    pub path: PathBuf,
    pub features: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct RegionGeography {
    name: Option<String>,
    shape: Option<String>,
    point: Option<String>,
}

/// Reads the monthly raw file (for its geography columns) and the annual detail output,
/// then writes one feature per region that has a valid shape.
pub fn export_regions(config: &PipelineConfig) -> Result<GeoExport> {
    let geography = load_required(
        &config.monthly_input(),
        &config.load_options(&GEOGRAPHY_TEXT_COLUMNS, true)?,
    )?;
    let annual_detail = load_required(
        &config.annual_detail_output(),
        &config.load_options(&DETAIL_TEXT_COLUMNS, true)?,
    )?;

    let (collection, skipped) = build_feature_collection(&geography, &annual_detail)?;
    let features = collection.features.len();

    let path = config.geojson_output();
    write_bytes(&path, GeoJson::FeatureCollection(collection).to_string().as_bytes())?;
    info!(path = %path.display(), features, skipped, "wrote regional GeoJSON");

    Ok(GeoExport {
        path,
        features,
        skipped,
    })
}

/// Returns the collection and the number of regions left out for lack of a valid shape.
pub fn build_feature_collection(
    geography: &DataFrame,
    annual_detail: &DataFrame,
) -> Result<(FeatureCollection, usize)> {
    let regions = first_geography_per_region(geography)?;
    let (labels, production) = production_by_region(annual_detail)?;

    let mut features = Vec::with_capacity(regions.len());
    let mut skipped = 0usize;

    for (code, region) in &regions {
        let Some(geometry) = region.shape.as_deref().and_then(parse_geometry) else {
            debug!(region = %code, "region has no usable shape; skipping");
            skipped += 1;
            continue;
        };

        let mut properties = JsonObject::new();
        properties.insert("regionCode".to_string(), json!(code));
        properties.insert("regionName".to_string(), json!(region.name));

        let totals = production.get(code);
        for label in &labels {
            let value = totals.map(|by_label| by_label.get(label).copied().unwrap_or(0.0));
            properties.insert(label.clone(), json!(value));
        }
        let total = totals.map(|by_label| by_label.values().sum::<f64>());
        properties.insert(TOTAL_PROPERTY.to_string(), json!(total));

        if let Some(center) = region.point.as_deref().and_then(parse_point) {
            properties.insert("center".to_string(), json!(center));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok((
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        skipped,
    ))
}

fn first_geography_per_region(df: &DataFrame) -> Result<BTreeMap<String, RegionGeography>> {
    let has_point = REGION_GEOGRAPHY.validate(df)?.contains(&REGION_POINT);

    let codes = text_values(df.column(PRODUCTION_REGION_CODE)?)?;
    let names = text_values(df.column(PRODUCTION_REGION_NAME)?)?;
    let shapes = text_values(df.column(REGION_SHAPE)?)?;
    let points = if has_point {
        text_values(df.column(REGION_POINT)?)?
    } else {
        vec![None; df.height()]
    };

    let mut regions: BTreeMap<String, RegionGeography> = BTreeMap::new();
    for (((code, name), shape), point) in codes.into_iter().zip(names).zip(shapes).zip(points) {
        let Some(code) = code else { continue };
        let entry = regions.entry(code).or_default();
        entry.name = entry.name.take().or(name);
        entry.shape = entry.shape.take().or(shape);
        entry.point = entry.point.take().or(point);
    }
    Ok(regions)
}

type ProductionBySource = BTreeMap<String, BTreeMap<String, f64>>;

fn production_by_region(detail: &DataFrame) -> Result<(BTreeSet<String>, ProductionBySource)> {
    let codes = text_values(detail.column(REGION_CODE)?)?;
    let labels = text_values(detail.column(SOURCE_LABEL)?)?;
    let mwh = coerce_f64(detail.column(PRODUCTION_MWH)?)?;

    let mut all_labels = BTreeSet::new();
    let mut production: ProductionBySource = BTreeMap::new();
    for ((code, label), value) in codes.into_iter().zip(labels).zip(mwh) {
        let (Some(code), Some(label)) = (code, label) else {
            continue;
        };
        all_labels.insert(label.clone());
        *production
            .entry(code)
            .or_default()
            .entry(label)
            .or_default() += value.unwrap_or(0.0);
    }
    Ok((all_labels, production))
}

fn parse_geometry(raw: &str) -> Option<geojson::Geometry> {
    match raw.parse::<GeoJson>() {
        Ok(GeoJson::Geometry(geometry)) => Some(geometry),
        _ => None,
    }
}

/// Parses `"lat, lon"` into `[lat, lon]`.
fn parse_point(raw: &str) -> Option<[f64; 2]> {
    let (lat, lon) = raw.split_once(',')?;
    Some([lat.trim().parse().ok()?, lon.trim().parse().ok()?])
}
