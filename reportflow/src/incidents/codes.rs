//! Incident codes raised by reportflow itself.
//!
//! Each code has an entry in [`super::IncidentCatalog::builtin`]. Stage
//! handlers add their own codes through a catalog file.

/// Stage started out of the declared sequence.
pub const STAGE_SEQUENCE_MISMATCH: &str = "ORCH-SEQUENCE-MISMATCH";
/// Stage skipped on request.
pub const STAGE_SKIPPED: &str = "ORCH-STAGE-SKIPPED";
/// Stage execution window opened.
pub const STAGE_STARTED: &str = "ORCH-STAGE-STARTED";
/// Handler returned an unsuccessful outcome without registering an error.
pub const STAGE_FAILED: &str = "ORCH-STAGE-FAILED";
/// Handler returned an error or panicked.
pub const HANDLER_FAULT: &str = "ORCH-HANDLER-FAULT";
/// No handler is registered for a configured stage.
pub const HANDLER_MISSING: &str = "ORCH-HANDLER-MISSING";
/// Remaining stages were abandoned after a fatal incident.
pub const RUN_ABORTED: &str = "ORCH-RUN-ABORTED";

/// A stage's required input manifest could not be loaded.
pub const INPUT_REQUIRED: &str = "MANIFEST-INPUT-REQUIRED";
/// A stage's optional input manifest could not be loaded.
pub const INPUT_MISSING: &str = "MANIFEST-INPUT-MISSING";
/// A manifest was loaded.
pub const MANIFEST_LOADED: &str = "MANIFEST-LOADED";
/// A manifest file could not be read.
pub const MANIFEST_READ_FAILED: &str = "MANIFEST-READ-FAILED";
/// A manifest file could not be parsed.
pub const MANIFEST_PARSE_FAILED: &str = "MANIFEST-PARSE-FAILED";
/// A manifest file carries a different type than requested.
pub const MANIFEST_TYPE_MISMATCH: &str = "MANIFEST-TYPE-MISMATCH";
/// Candidate manifests were ignored because they are too old.
pub const MANIFEST_STALE: &str = "MANIFEST-STALE";
/// The manifest directory could not be listed.
pub const MANIFEST_DIR_UNREADABLE: &str = "MANIFEST-DIR-UNREADABLE";
/// A manifest nests deeper than the configured limit.
pub const MANIFEST_DEPTH_EXCEEDED: &str = "MANIFEST-DEPTH-EXCEEDED";
/// A manifest could not be written.
pub const MANIFEST_SAVE_FAILED: &str = "MANIFEST-SAVE-FAILED";
/// A manifest was written.
pub const MANIFEST_SAVED: &str = "MANIFEST-SAVED";

/// Generic definition substituted for codes missing from the catalog.
pub const UNKNOWN_INCIDENT: &str = "UNKNOWN-INCIDENT";
/// Code given to reports registered without a code.
pub const ADHOC: &str = "ADHOC";
