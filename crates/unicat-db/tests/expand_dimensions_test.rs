//! Integration tests for the legacy dimension expander.

use unicat_db::test_fixtures::TestDatabase;
use unicat_db::{ExpandDimensionsMigration, ReferenceData, RunMode};

fn migration(t: &TestDatabase) -> ExpandDimensionsMigration {
    ExpandDimensionsMigration::new(t.db.semi.clone(), &ReferenceData::default())
}

async fn steel(t: &TestDatabase) -> i64 {
    let id = t.insert_material("S235JR").await;
    t.insert_density(id, "", Some("7,85"), None, None).await;
    id
}

#[tokio::test]
async fn test_round_range_expands_with_weights() {
    let t = TestDatabase::new().await;
    let tondi = t.insert_semi_type("TOND", "TONDI").await;
    let material = steel(&t).await;
    let item = t.insert_legacy_semi_item(tondi, Some(material), "20-45").await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .expect("expansion should succeed");

    let rows = t.db.semi.dimensions(item).await.unwrap();
    let tokens: Vec<&str> = rows.iter().map(|r| r.dimension.as_str()).collect();
    assert_eq!(
        tokens,
        vec![
            "D20", "D22", "D24", "D25", "D26", "D27", "D28", "D30", "D32", "D35", "D36", "D40",
            "D45"
        ]
    );
    let orders: Vec<i64> = rows.iter().map(|r| r.sort_order).collect();
    assert_eq!(orders, (1..=13).map(|i| i * 10).collect::<Vec<_>>());
    assert_eq!(rows[0].weight_per_m, "2.466");
    assert!(rows.iter().all(|r| !r.weight_per_m.is_empty()));

    let report = outcome.report;
    assert_eq!(report.updated_items, 1);
    assert_eq!(report.rows_deleted, 1);
    assert_eq!(report.rows_inserted, 13);
    assert_eq!(report.weights_computed, 13);
    assert_eq!(report.updated_by_family.get("TONDI"), Some(&1));
}

#[tokio::test]
async fn test_expansion_is_idempotent() {
    let t = TestDatabase::new().await;
    let tondi = t.insert_semi_type("TOND", "TONDI").await;
    let item = t.insert_legacy_semi_item(tondi, None, "20-45").await;

    t.runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();
    let first = t.db.semi.dimensions(item).await.unwrap();

    let second = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    assert_eq!(second.report.updated_items, 0);
    assert_eq!(second.report.skipped_not_legacy, 1);
    assert_eq!(t.db.semi.dimensions(item).await.unwrap(), first);
}

#[tokio::test]
async fn test_unknown_density_leaves_weight_blank() {
    let t = TestDatabase::new().await;
    let lamiere = t.insert_semi_type("LAMI", "LAMIERE").await;
    let no_density = t.insert_material("PTFE").await;
    let item = t
        .insert_legacy_semi_item(lamiere, Some(no_density), "VARIE")
        .await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    let rows = t.db.semi.dimensions(item).await.unwrap();
    assert_eq!(rows.len(), 25);
    assert_eq!(rows[0].dimension, "SP0.5");
    assert!(rows.iter().all(|r| r.weight_per_m.is_empty()));
    assert_eq!(outcome.report.weights_computed, 0);
}

#[tokio::test]
async fn test_sheet_weight_is_thickness_times_density() {
    let t = TestDatabase::new().await;
    let lamiere = t.insert_semi_type("LAMI", "LAMIERE").await;
    let material = steel(&t).await;
    let item = t
        .insert_legacy_semi_item(lamiere, Some(material), "2-4")
        .await;

    t.runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    let rows = t.db.semi.dimensions(item).await.unwrap();
    let tokens: Vec<&str> = rows.iter().map(|r| r.dimension.as_str()).collect();
    assert_eq!(tokens, vec!["SP2", "SP2.5", "SP2.99", "SP3", "SP4"]);
    assert_eq!(rows[3].weight_per_m, "23.550");
}

#[tokio::test]
async fn test_density_falls_back_to_min_value() {
    let t = TestDatabase::new().await;
    let tondi = t.insert_semi_type("TOND", "TONDI").await;
    let material = t.insert_material("EN AW-6082").await;
    t.insert_density(material, "", None, Some("2,70"), Some("2,72"))
        .await;
    let item = t.insert_legacy_semi_item(tondi, Some(material), "20-20").await;

    t.runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    let rows = t.db.semi.dimensions(item).await.unwrap();
    assert_eq!(rows.len(), 1);
    // π·20²/4 · 2.7 / 1000
    assert_eq!(rows[0].weight_per_m, "0.848");
}

#[tokio::test]
async fn test_skip_counters() {
    let t = TestDatabase::new().await;
    let tondi = t.insert_semi_type("TOND", "TONDI").await;
    let tubi = t.insert_semi_type("TUBI", "TUBI").await;
    let other = t.insert_semi_type("BARS", "BARRE SPECIALI").await;

    // Row edited away from the summary.
    let custom = t.insert_semi_item(tondi, None, "20-45").await;
    t.insert_dimension(custom, "D25", "", 10).await;
    // Concrete size, not a range.
    t.insert_legacy_semi_item(tondi, None, "D25").await;
    // Several rows already.
    let many = t.insert_semi_item(tondi, None, "20-45").await;
    t.insert_dimension(many, "D20", "", 10).await;
    t.insert_dimension(many, "D22", "", 20).await;
    // No rows at all.
    t.insert_semi_item(tondi, None, "20-45").await;
    t.insert_legacy_semi_item(other, None, "10-20").await;
    // No standard tube in range.
    t.insert_legacy_semi_item(tubi, None, "500-600").await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    let report = outcome.report;
    assert_eq!(report.updated_items, 0);
    assert_eq!(report.skipped_custom, 1);
    assert_eq!(report.skipped_not_legacy, 3);
    assert_eq!(report.skipped_unknown_family, 1);
    assert_eq!(report.skipped_empty_expansion, 1);
    assert_eq!(t.db.semi.dimensions(custom).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dry_run_keeps_legacy_rows() {
    let t = TestDatabase::new().await;
    let tondi = t.insert_semi_type("TOND", "TONDI").await;
    let item = t.insert_legacy_semi_item(tondi, None, "20-45").await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::DryRun)
        .await
        .unwrap();

    assert_eq!(outcome.report.rows_inserted, 13);
    let rows = t.db.semi.dimensions(item).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dimension, "20-45");
}
