//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable I/O: lint reports, CLI tool reports and rule
//! configuration documents.

pub const CANON_REPORT_SCHEMA_VERSION: &str = "canon.report@0.1.0";
pub const CANON_TOOL_REPORT_SCHEMA_VERSION: &str = "canon.tool.report@0.1.0";
pub const CANON_CONFIG_SCHEMA_VERSION: &str = "canon.config@0.1.0";

/// Namespace prefix shared by every rule name (`Canon/SortHash`, ...).
pub const RULE_NAMESPACE: &str = "Canon";
