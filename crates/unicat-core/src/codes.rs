//! Hierarchical code canonicalization.
//!
//! Pure functions computing the target code of every category and
//! subcategory row, plus the helpers that compose leaf item codes and
//! name the placeholder keyspace used while rewriting them.
//!
//! Assignment is two-pass. Pass 1 gives rows whose legacy code appears in the
//! known map their mapped target, first come first served. Pass 2 keeps any
//! remaining row whose code is already a free fixed-width numeric code, and
//! gives every other row the next free number at or above a running cursor.
//! The result is injective and total over the input rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::defaults::{
    PLACEHOLDER_ID_WIDTH, PLACEHOLDER_PREFIX, SEQUENCE_MAX, SEQUENCE_WIDTH, SUBCATEGORY_AUTO_START,
    SUBCATEGORY_WIDTH,
};
use crate::error::{Error, Result};
use crate::models::{CategoryRow, ItemCodeSource, SubcategoryRow};
use crate::normalize::canonical_code;

/// Whether `code` is exactly `width` ASCII digits.
pub fn is_fixed_width_code(code: &str, width: usize) -> bool {
    code.len() == width && code.bytes().all(|b| b.is_ascii_digit())
}

/// Smallest code `>= start`, zero-padded to `width`, not present in `used`.
pub fn next_free_code(used: &HashSet<String>, width: usize, start: u64) -> String {
    let mut n = start;
    loop {
        let code = format!("{:0width$}", n, width = width);
        if !used.contains(&code) {
            return code;
        }
        n += 1;
    }
}

/// A row entering the two-pass assignment.
struct Candidate<'a> {
    id: i64,
    old_code: String,
    known_target: Option<&'a String>,
}

fn assign_two_pass(
    candidates: &[Candidate<'_>],
    width: usize,
    auto_start: u64,
    targets: &mut BTreeMap<i64, String>,
) {
    let mut used: HashSet<String> = HashSet::new();
    let mut claimed: HashSet<i64> = HashSet::new();

    for c in candidates {
        if let Some(target) = c.known_target {
            if !used.contains(target) {
                used.insert(target.clone());
                claimed.insert(c.id);
                targets.insert(c.id, target.clone());
            }
        }
    }

    let mut cursor = auto_start;
    for c in candidates {
        if claimed.contains(&c.id) {
            continue;
        }
        let target = if is_fixed_width_code(&c.old_code, width) && !used.contains(&c.old_code) {
            c.old_code.clone()
        } else {
            let code = next_free_code(&used, width, cursor);
            // The freshly found code is numeric by construction.
            cursor = code.parse::<u64>().map(|n| n + 1).unwrap_or(cursor + 1);
            code
        };
        used.insert(target.clone());
        targets.insert(c.id, target);
    }
}

/// Compute the target code of every category row.
///
/// `known` maps canonical legacy codes to target codes. Rows are processed in
/// the order given.
pub fn assign_category_targets(
    rows: &[CategoryRow],
    known: &HashMap<String, String>,
    width: usize,
    auto_start: u32,
) -> BTreeMap<i64, String> {
    let candidates: Vec<Candidate<'_>> = rows
        .iter()
        .map(|r| {
            let old_code = canonical_code(&r.code);
            let known_target = known.get(&old_code);
            Candidate {
                id: r.id,
                old_code,
                known_target,
            }
        })
        .collect();

    let mut targets = BTreeMap::new();
    assign_two_pass(&candidates, width, u64::from(auto_start), &mut targets);

    tracing::debug!(
        subsystem = "recode",
        component = "codes",
        op = "assign_categories",
        row_count = targets.len(),
        width,
        "Category targets assigned"
    );
    targets
}

/// Compute the target code of every subcategory row.
///
/// Codes only need to be unique within their parent, so each category is
/// assigned independently, ordered by `(code, id)`. `old_category_codes`
/// holds the parents' *pre-migration* codes, which is what `known` is keyed
/// by.
pub fn assign_subcategory_targets(
    rows: &[SubcategoryRow],
    old_category_codes: &HashMap<i64, String>,
    known: &HashMap<(String, String), String>,
) -> BTreeMap<i64, String> {
    let mut by_category: BTreeMap<i64, Vec<&SubcategoryRow>> = BTreeMap::new();
    for r in rows {
        by_category.entry(r.category_id).or_default().push(r);
    }

    let mut targets = BTreeMap::new();
    for (category_id, mut group) in by_category {
        group.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));
        let parent_code = old_category_codes
            .get(&category_id)
            .map(|c| canonical_code(c))
            .unwrap_or_default();

        let candidates: Vec<Candidate<'_>> = group
            .iter()
            .map(|r| {
                let old_code = canonical_code(&r.code);
                let known_target = known.get(&(parent_code.clone(), old_code.clone()));
                Candidate {
                    id: r.id,
                    old_code,
                    known_target,
                }
            })
            .collect();

        assign_two_pass(
            &candidates,
            SUBCATEGORY_WIDTH,
            u64::from(SUBCATEGORY_AUTO_START),
            &mut targets,
        );
    }

    tracing::debug!(
        subsystem = "recode",
        component = "codes",
        op = "assign_subcategories",
        row_count = targets.len(),
        "Subcategory targets assigned"
    );
    targets
}

/// Placeholder code for row `id` of the table tagged `tag`.
///
/// Placeholders share the [`PLACEHOLDER_PREFIX`], which never begins a real
/// code, and embed the row id, so two rows never share one.
pub fn placeholder_code(tag: &str, id: i64) -> String {
    format!(
        "{}{}-{:0width$}",
        PLACEHOLDER_PREFIX,
        tag,
        id,
        width = PLACEHOLDER_ID_WIDTH
    )
}

/// Whether `code` lies in the placeholder keyspace.
pub fn is_placeholder(code: &str) -> bool {
    code.starts_with(PLACEHOLDER_PREFIX)
}

/// Compose `<category>-<subcategory>-<seq>` for a leaf item.
///
/// Fails with [`Error::SequenceOutOfRange`] when the sequence does not fit
/// the fixed width; that is stored corruption the migration cannot repair.
pub fn compose_item_code(source: &ItemCodeSource) -> Result<String> {
    if source.seq < 0 || source.seq > SEQUENCE_MAX {
        return Err(Error::SequenceOutOfRange {
            item_id: source.id,
            seq: source.seq,
        });
    }
    Ok(format!(
        "{}-{}-{:0width$}",
        source.category_code,
        source.subcategory_code,
        source.seq,
        width = SEQUENCE_WIDTH
    ))
}

/// Whether no two entries of `targets` share a code.
pub fn is_injective(targets: &BTreeMap<i64, String>) -> bool {
    let unique: HashSet<&String> = targets.values().collect();
    unique.len() == targets.len()
}
