use enerbilan_core::balance::{
    build_balance, BalanceDiagnostics, CONSUMPTION_TOTAL, COVERAGE_RATIO, REGION_CODE, REGION_NAME,
    STATUS,
};
use polars::prelude::*;

fn consumption(rows: &[(i64, &str, &str, f64)]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new("annee".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()).into(),
        Series::new("code_reg".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()).into(),
        Series::new("nom_reg".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()).into(),
        Series::new("conso_totale".into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()).into(),
    ])
}

fn production(rows: &[(i64, &str, &str, f64)]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new("annee".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()).into(),
        Series::new("code_reg".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()).into(),
        Series::new("nom_reg".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()).into(),
        Series::new("prod_mwh".into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()).into(),
    ])
}

fn statuses(df: &DataFrame) -> PolarsResult<Vec<Option<String>>> {
    Ok(df
        .column(STATUS)?
        .str()?
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect())
}

#[test]
fn full_coverage_is_green() -> anyhow::Result<()> {
    let conso = consumption(&[(2021, "11", "Île-de-France", 1000.0)])?;
    let prod = production(&[(2021, "11", "IDF", 1000.0)])?;

    let (balance, diagnostics) = build_balance(&conso, &prod)?;

    assert_eq!(balance.height(), 1);
    assert_eq!(
        balance.get_column_names_str(),
        vec![
            "annee",
            "code_reg",
            "nom_region",
            "conso_totale",
            "prod_mwh",
            "taux_couverture",
            "couleur_carte"
        ]
    );
    assert_eq!(balance.column(COVERAGE_RATIO)?.f64()?.get(0), Some(100.0));
    assert_eq!(statuses(&balance)?, vec![Some("Green".to_string())]);
    assert_eq!(
        balance.column(REGION_NAME)?.str()?.get(0),
        Some("Île-de-France")
    );
    assert_eq!(
        diagnostics,
        BalanceDiagnostics {
            matched: 1,
            consumption_only: 0,
            production_only: 0
        }
    );
    Ok(())
}

#[test]
fn partial_coverage_is_orange() -> anyhow::Result<()> {
    let conso = consumption(&[(2021, "11", "Île-de-France", 1000.0)])?;
    let prod = production(&[(2021, "11", "Île-de-France", 900.0)])?;

    let (balance, _) = build_balance(&conso, &prod)?;

    assert_eq!(balance.column(COVERAGE_RATIO)?.f64()?.get(0), Some(90.0));
    assert_eq!(statuses(&balance)?, vec![Some("Orange".to_string())]);
    Ok(())
}

#[test]
fn join_is_inner_and_counts_dropped_rows() -> anyhow::Result<()> {
    let conso = consumption(&[
        (2021, "02", "Aisne region", 400.0),
        (2021, "11", "Île-de-France", 1000.0),
        (2020, "11", "Île-de-France", 1000.0),
    ])?;
    let prod = production(&[
        (2021, "11", "Île-de-France", 300.0),
        (2021, "2", "Mistyped", 400.0),
        (2019, "11", "Île-de-France", 50.0),
    ])?;

    let (balance, diagnostics) = build_balance(&conso, &prod)?;

    assert_eq!(balance.height(), 1);
    assert_eq!(balance.column(REGION_CODE)?.str()?.get(0), Some("11"));
    assert_eq!(statuses(&balance)?, vec![Some("Red".to_string())]);
    assert_eq!(diagnostics.matched, 1);
    assert_eq!(diagnostics.consumption_only, 2);
    assert_eq!(diagnostics.production_only, 2);
    assert_eq!(diagnostics.dropped(), 4);
    Ok(())
}

#[test]
fn zero_consumption_keeps_row_with_unknown_status() -> anyhow::Result<()> {
    let conso = consumption(&[(2021, "06", "Mayotte", 0.0)])?;
    let prod = production(&[(2021, "06", "Mayotte", 120.0)])?;

    let (balance, _) = build_balance(&conso, &prod)?;

    assert_eq!(balance.height(), 1);
    assert_eq!(balance.column(COVERAGE_RATIO)?.f64()?.get(0), None);
    assert_eq!(statuses(&balance)?, vec![Some("Unknown".to_string())]);
    Ok(())
}

#[test]
fn status_boundaries_follow_rounded_ratio() -> anyhow::Result<()> {
    let conso = consumption(&[
        (2021, "a", "A", 10_000.0),
        (2021, "b", "B", 10_000.0),
        (2021, "c", "C", 10_000.0),
        (2021, "d", "D", 10_000.0),
        (2021, "e", "E", 1_000_000.0),
    ])?;
    let prod = production(&[
        (2021, "a", "A", 10_000.0),
        (2021, "b", "B", 9_999.0),
        (2021, "c", "C", 5_000.0),
        (2021, "d", "D", 4_999.0),
        (2021, "e", "E", 999_999.0),
    ])?;

    let (balance, _) = build_balance(&conso, &prod)?;
    let ratios: Vec<Option<f64>> = balance.column(COVERAGE_RATIO)?.f64()?.into_iter().collect();

    assert_eq!(
        ratios,
        vec![Some(100.0), Some(99.99), Some(50.0), Some(49.99), Some(100.0)]
    );
    assert_eq!(
        statuses(&balance)?,
        ["Green", "Orange", "Orange", "Red", "Green"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn missing_consumption_total_is_null_not_zero() -> anyhow::Result<()> {
    let conso = df!(
        "annee" => [2021i64],
        "code_reg" => ["93"],
        "nom_reg" => ["Provence-Alpes-Côte d'Azur"],
        "conso_totale" => [None::<f64>],
    )?;
    let prod = production(&[(2021, "93", "PACA", 250.0)])?;

    let (balance, diagnostics) = build_balance(&conso, &prod)?;

    assert_eq!(diagnostics.matched, 1);
    assert_eq!(balance.column(CONSUMPTION_TOTAL)?.f64()?.get(0), None);
    assert_eq!(balance.column(COVERAGE_RATIO)?.f64()?.get(0), None);
    assert_eq!(statuses(&balance)?, vec![Some("Unknown".to_string())]);
    Ok(())
}

#[test]
fn production_rows_sharing_a_key_are_summed() -> anyhow::Result<()> {
    let conso = consumption(&[
        (2021, "04", "Region 04", 1000.0),
        (2021, "11", "Île-de-France", 1000.0),
    ])?;
    let prod = production(&[
        (2021, "11", "Île-de-France", 200.0),
        (2021, "04", "Region 04", 300.0),
        (2021, "04", "Region 04", 300.0),
    ])?;

    let (balance, _) = build_balance(&conso, &prod)?;

    let codes: Vec<Option<&str>> = balance.column(REGION_CODE)?.str()?.into_iter().collect();
    assert_eq!(codes, vec![Some("04"), Some("11")]);
    let totals: Vec<Option<f64>> = balance.column("prod_mwh")?.f64()?.into_iter().collect();
    assert_eq!(totals, vec![Some(600.0), Some(200.0)]);
    Ok(())
}
