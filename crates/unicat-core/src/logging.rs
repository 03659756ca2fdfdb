//! Structured logging schema and field name constants for unicat.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Run aborted, transaction rolled back |
//! | WARN  | Fatal invariant violation detected, about to abort |
//! | INFO  | Lifecycle events (backup, begin, commit/rollback), run summaries |
//! | DEBUG | Decision points (target assignments, generator chosen) |
//! | TRACE | Per-row iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "database", "migration", "recode", "expand", "split", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "backup", "runner", "rewrite"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "assign", "stage", "commit", "replace_dimensions"
pub const OPERATION: &str = "op";

/// Migration name being executed.
pub const MIGRATION: &str = "migration";

/// Run mode ("dry-run" or "apply").
pub const MODE: &str = "mode";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Database table affected.
pub const DB_TABLE: &str = "db_table";

/// Row id being operated on.
pub const ROW_ID: &str = "row_id";

/// Product family tag of a semi-finished item.
pub const FAMILY: &str = "family";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows read, written or deleted.
pub const ROW_COUNT: &str = "row_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
