//! Centralized default constants for unicat.
//!
//! **This module is the single source of truth** for shared default values.
//! The reference tables themselves (standard series, legacy code maps) live
//! in [`crate::reference`] because they are injectable data, not constants.

// =============================================================================
// CODES
// =============================================================================

/// Category code width in the standards ("normati") taxonomy.
pub const NORMATI_CATEGORY_WIDTH: usize = 3;

/// First auto-assigned category number in the standards taxonomy.
pub const NORMATI_CATEGORY_AUTO_START: u32 = 11;

/// Category code width in the commercial taxonomy.
pub const COMMERCIAL_CATEGORY_WIDTH: usize = 4;

/// First auto-assigned category number in the commercial taxonomy.
pub const COMMERCIAL_CATEGORY_AUTO_START: u32 = 4000;

/// Subcategory code width (both taxonomies).
pub const SUBCATEGORY_WIDTH: usize = 4;

/// First auto-assigned subcategory number within a parent category.
pub const SUBCATEGORY_AUTO_START: u32 = 1;

/// Width of the zero-padded item sequence.
pub const SEQUENCE_WIDTH: usize = 4;

/// Largest item sequence representable in [`SEQUENCE_WIDTH`] digits.
pub const SEQUENCE_MAX: i64 = 9999;

/// Prefix of the placeholder keyspace used during two-phase rewrites.
pub const PLACEHOLDER_PREFIX: &str = "TMP-";

/// Digits of row id embedded in a placeholder code.
pub const PLACEHOLDER_ID_WIDTH: usize = 8;

// =============================================================================
// DIMENSIONS
// =============================================================================

/// Step between consecutive dimension row sort orders.
pub const SORT_ORDER_STEP: i64 = 10;

/// Tolerance used for range membership and integer detection.
pub const FLOAT_TOLERANCE: f64 = 1e-9;

/// Decimal places in a rendered dimension number.
pub const DIMENSION_DECIMALS: usize = 3;

/// Decimal places in a stored weight per meter.
pub const WEIGHT_DECIMALS: usize = 3;

/// Marker for "miscellaneous" legacy dimension summaries.
pub const MISC_MARKER: &str = "VARIE";

/// Material property holding density in g/cm³.
pub const DENSITY_PROPERTY: &str = "DENSITA";

// =============================================================================
// RUNTIME
// =============================================================================

/// Default SQLite database file.
pub const DATABASE_PATH: &str = "database/unificati_manager.db";

/// Default directory receiving pre-migration backups.
pub const BACKUP_DIR: &str = "backups";

/// Timestamp format embedded in backup file names.
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Busy timeout for the SQLite connection in seconds.
pub const BUSY_TIMEOUT_SECS: u64 = 30;

/// Format of `created_at` / `updated_at` columns.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// PROFILE SPLIT
// =============================================================================

/// Semi type code of the legacy generic profile family.
pub const PROFILE_SOURCE_TYPE_CODE: &str = "PROF";

/// Semi type description of the legacy generic profile family.
pub const PROFILE_SOURCE_TYPE_DESC: &str = "PROFILATI";

/// Summary left on a generic profile item that keeps unsplit rows.
pub const PROFILE_REMAINDER_SUMMARY: &str = "PROFILATI - ALTRO";
