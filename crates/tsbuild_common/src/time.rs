//! Modification-time sentinels and comparison helpers.
//!
//! The up-to-date classifier compares file modification times extensively.
//! A missing file substitutes [`MISSING_FILE_TIME`], older than any real
//! file; [`maximum_time`] is newer than any real file and marks a project
//! whose declaration outputs changed content, forcing downstream rebuilds.

use std::time::{Duration, SystemTime};

/// Sentinel modification time for a file that does not exist.
pub const MISSING_FILE_TIME: SystemTime = SystemTime::UNIX_EPOCH;

/// Sentinel modification time newer than any real file (end of year 9999).
pub fn maximum_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(253_402_300_799)
}

/// Returns the newer of two timestamps.
pub fn newer(a: SystemTime, b: SystemTime) -> SystemTime {
    if b > a {
        b
    } else {
        a
    }
}
