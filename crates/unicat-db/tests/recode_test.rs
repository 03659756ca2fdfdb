//! Integration tests for the numeric recode migration.

use std::collections::BTreeMap;

use unicat_db::test_fixtures::TestDatabase;
use unicat_db::{Error, RecodeMigration, ReferenceData, RunMode, Taxonomy};

struct Seeded {
    vit: i64,
    chi: i64,
    legacy_010: i64,
    sub_d688: i64,
    sub_0001: i64,
    item_a: i64,
    item_b: i64,
    comv: i64,
    comm_xyz: i64,
    comm_pias: i64,
    comm_abcd: i64,
}

/// A catalog where naive in-place rewrites would collide:
/// category `010` must move out of the slot `CHI` maps onto, and the two
/// items end up swapping codes.
async fn seed(t: &TestDatabase) -> Seeded {
    let vit = t.insert_category(Taxonomy::Normati, "VIT").await;
    let legacy_010 = t.insert_category(Taxonomy::Normati, "010").await;
    let chi = t.insert_category(Taxonomy::Normati, "CHI").await;

    let sub_tesa = t.insert_subcategory(Taxonomy::Normati, vit, "TESA").await;
    let sub_d688 = t.insert_subcategory(Taxonomy::Normati, chi, "D688").await;
    let sub_0001 = t.insert_subcategory(Taxonomy::Normati, chi, "0001").await;
    t.insert_subcategory(Taxonomy::Normati, legacy_010, "ZZZZ").await;

    t.insert_item(Taxonomy::Normati, vit, sub_tesa, 1, "VIT-TESA-0001")
        .await;
    let item_a = t
        .insert_item(Taxonomy::Normati, chi, sub_d688, 5, "010-0002-0007")
        .await;
    let item_b = t
        .insert_item(Taxonomy::Normati, chi, sub_0001, 7, "010-0001-0005")
        .await;

    let comv = t.insert_category(Taxonomy::Commercial, "COMV").await;
    let comm_xyz = t.insert_category(Taxonomy::Commercial, "XYZ").await;
    let comm_pias = t.insert_subcategory(Taxonomy::Commercial, comv, "PIAS").await;
    let comm_abcd = t.insert_subcategory(Taxonomy::Commercial, comv, "ABCD").await;
    t.insert_item(Taxonomy::Commercial, comv, comm_pias, 1, "COMV-PIAS-0001")
        .await;
    t.insert_item(Taxonomy::Commercial, comv, comm_abcd, 2, "COMV-ABCD-0002")
        .await;

    Seeded {
        vit,
        chi,
        legacy_010,
        sub_d688,
        sub_0001,
        item_a,
        item_b,
        comv,
        comm_xyz,
        comm_pias,
        comm_abcd,
    }
}

fn migration(t: &TestDatabase) -> RecodeMigration {
    RecodeMigration::new(t.db.catalog.clone(), ReferenceData::default())
}

#[tokio::test]
async fn test_recode_apply_rewrites_all_levels() {
    let t = TestDatabase::new().await;
    let s = seed(&t).await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .expect("recode should succeed");

    let report = outcome.report;
    assert_eq!(report.commercial_items_deleted, 2);
    assert_eq!(report.normati_categories_recoded, 3);
    assert_eq!(report.normati_subcategories_recoded, 4);
    assert_eq!(report.normati_items_rewritten, 3);
    assert_eq!(report.commercial_categories_recoded, 2);
    assert_eq!(report.commercial_subcategories_recoded, 2);
    assert_eq!(report.max_seq_observed, 7);

    // Known mappings win; the displaced numeric code gets the first auto slot.
    assert_eq!(t.code_of("category", s.vit).await, "001");
    assert_eq!(t.code_of("category", s.chi).await, "010");
    assert_eq!(t.code_of("category", s.legacy_010).await, "011");

    assert_eq!(t.code_of("subcategory", s.sub_d688).await, "0001");
    assert_eq!(t.code_of("subcategory", s.sub_0001).await, "0002");

    // The two items trade codes without tripping the unique constraint.
    assert_eq!(t.code_of("item", s.item_a).await, "010-0001-0005");
    assert_eq!(t.code_of("item", s.item_b).await, "010-0002-0007");

    assert_eq!(t.code_of("comm_category", s.comv).await, "1000");
    assert_eq!(t.code_of("comm_category", s.comm_xyz).await, "4000");
    assert_eq!(t.code_of("comm_subcategory", s.comm_pias).await, "0001");
    assert_eq!(t.code_of("comm_subcategory", s.comm_abcd).await, "0002");

    assert_eq!(t.count_rows("comm_item").await, 0);
}

#[tokio::test]
async fn test_recode_leaves_no_placeholders() {
    let t = TestDatabase::new().await;
    seed(&t).await;

    t.runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    for table in [
        "category",
        "subcategory",
        "item",
        "comm_category",
        "comm_subcategory",
    ] {
        let leftovers: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE code LIKE 'TMP-%'",
            table
        ))
        .fetch_one(&t.pool)
        .await
        .unwrap();
        assert_eq!(leftovers, 0, "placeholder left in {}", table);
    }
}

#[tokio::test]
async fn test_recode_dry_run_changes_nothing() {
    let t = TestDatabase::new().await;
    let s = seed(&t).await;

    let outcome = t
        .runner()
        .execute(&migration(&t), RunMode::DryRun)
        .await
        .unwrap();

    assert_eq!(outcome.mode, RunMode::DryRun);
    // Counts are computed as if applied.
    assert_eq!(outcome.report.commercial_items_deleted, 2);
    assert_eq!(outcome.report.normati_items_rewritten, 3);

    assert_eq!(t.code_of("category", s.vit).await, "VIT");
    assert_eq!(t.code_of("category", s.legacy_010).await, "010");
    assert_eq!(t.code_of("item", s.item_a).await, "010-0002-0007");
    assert_eq!(t.count_rows("comm_item").await, 2);
}

#[tokio::test]
async fn test_recode_is_stable_on_second_run() {
    let t = TestDatabase::new().await;
    let s = seed(&t).await;

    t.runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();
    let second = t
        .runner()
        .execute(&migration(&t), RunMode::Apply)
        .await
        .unwrap();

    assert_eq!(second.report.commercial_items_deleted, 0);
    assert_eq!(t.code_of("category", s.vit).await, "001");
    assert_eq!(t.code_of("category", s.legacy_010).await, "011");
    assert_eq!(t.code_of("subcategory", s.sub_0001).await, "0002");
    assert_eq!(t.code_of("item", s.item_b).await, "010-0002-0007");
}

#[tokio::test]
async fn test_recode_sequence_out_of_range_aborts() {
    let t = TestDatabase::new().await;
    let s = seed(&t).await;
    let bad = t
        .insert_item(Taxonomy::Normati, s.chi, s.sub_d688, 10_000, "CHI-D688-X")
        .await;

    let result = t.runner().execute(&migration(&t), RunMode::Apply).await;

    match result {
        Err(Error::SequenceOutOfRange { item_id, seq }) => {
            assert_eq!(item_id, bad);
            assert_eq!(seq, 10_000);
        }
        other => panic!("expected SequenceOutOfRange, got {:?}", other.map(|o| o.report)),
    }

    // Nothing was committed, including the commercial reset.
    assert_eq!(t.code_of("category", s.vit).await, "VIT");
    assert_eq!(t.code_of("item", s.item_a).await, "010-0002-0007");
    assert_eq!(t.count_rows("comm_item").await, 2);
}

#[tokio::test]
async fn test_recode_rejects_existing_placeholder_codes() {
    let t = TestDatabase::new().await;
    let s = seed(&t).await;
    t.insert_category(Taxonomy::Normati, "TMP-CAT-00000099").await;

    let result = t.runner().execute(&migration(&t), RunMode::Apply).await;

    assert!(matches!(
        result,
        Err(Error::PlaceholderConflict { ref table, .. }) if table == "category"
    ));
    assert_eq!(t.code_of("category", s.chi).await, "CHI");
}

#[tokio::test]
async fn test_recode_uses_injected_reference_maps() {
    let t = TestDatabase::new().await;
    let cat = t.insert_category(Taxonomy::Normati, "FOO").await;
    let sub = t.insert_subcategory(Taxonomy::Normati, cat, "BAR").await;

    let mut reference = ReferenceData::default();
    reference
        .normati
        .known_categories
        .insert("FOO".to_string(), "042".to_string());
    reference.normati.known_subcategories.push(unicat_db::KnownSubcategory {
        category: "FOO".to_string(),
        subcategory: "BAR".to_string(),
        target: "0042".to_string(),
    });

    t.runner()
        .execute(
            &RecodeMigration::new(t.db.catalog.clone(), reference),
            RunMode::Apply,
        )
        .await
        .unwrap();

    assert_eq!(t.code_of("category", cat).await, "042");
    assert_eq!(t.code_of("subcategory", sub).await, "0042");
}

#[tokio::test]
async fn test_rewrite_codes_swaps_two_categories() {
    let t = TestDatabase::new().await;
    let a = t.insert_category(Taxonomy::Normati, "001").await;
    let b = t.insert_category(Taxonomy::Normati, "002").await;

    let targets = BTreeMap::from([(a, "002".to_string()), (b, "001".to_string())]);
    let mut tx = t.pool.begin().await.unwrap();
    let rewritten = t
        .db
        .catalog
        .rewrite_codes_tx(&mut tx, "category", "CAT", &targets)
        .await
        .expect("swap should not violate the unique constraint");
    tx.commit().await.unwrap();

    assert_eq!(rewritten, 2);
    assert_eq!(t.code_of("category", a).await, "002");
    assert_eq!(t.code_of("category", b).await, "001");
}

#[tokio::test]
async fn test_recode_swaps_categories_through_known_map() {
    let t = TestDatabase::new().await;
    let a = t.insert_category(Taxonomy::Normati, "001").await;
    let b = t.insert_category(Taxonomy::Normati, "002").await;

    let mut reference = ReferenceData::default();
    reference.normati.known_categories = BTreeMap::from([
        ("001".to_string(), "002".to_string()),
        ("002".to_string(), "001".to_string()),
    ]);

    let outcome = t
        .runner()
        .execute(
            &RecodeMigration::new(t.db.catalog.clone(), reference),
            RunMode::Apply,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.normati_categories_recoded, 2);
    assert_eq!(t.code_of("category", a).await, "002");
    assert_eq!(t.code_of("category", b).await, "001");
}
