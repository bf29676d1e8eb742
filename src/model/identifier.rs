//! Composed group identifiers
//!
//! Group ids are only unique within their rundown, so every group exposed to
//! the panel is keyed by `<rundownId>|||<groupId>`.

use crate::error::{BridgeError, Result};

pub const SEPARATOR: &str = "|||";

const RUNDOWN_SUFFIX: &str = ".rundown.json";

/// Build the globally unique id of a group
///
/// Ids containing the separator are rejected, otherwise decomposition would
/// be ambiguous.
pub fn compose(rundown_id: &str, group_id: &str) -> Result<String> {
    if rundown_id.contains(SEPARATOR) {
        return Err(BridgeError::invalid_identifier(
            rundown_id,
            "rundown id contains the group separator",
        ));
    }
    if group_id.contains(SEPARATOR) {
        return Err(BridgeError::invalid_identifier(
            group_id,
            "group id contains the group separator",
        ));
    }
    Ok(format!("{}{}{}", rundown_id, SEPARATOR, group_id))
}

/// Split a composed id at the first separator
pub fn decompose(composed: &str) -> Result<(&str, &str)> {
    composed
        .split_once(SEPARATOR)
        .ok_or_else(|| BridgeError::invalid_identifier(composed, "missing group separator"))
}

/// Rundown name shown on the panel: the id without its `.rundown.json` suffix
pub fn display_rundown_name(rundown_id: &str) -> &str {
    rundown_id.strip_suffix(RUNDOWN_SUFFIX).unwrap_or(rundown_id)
}
