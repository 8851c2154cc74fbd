//! # Timestamp Resolution Module
//!
//! Ricava il timestamp canonico di un filmato.
//!
//! ## Ordine di risoluzione:
//! 1. Data nel nome file (`20160513_181656.mp4` → 2016-05-13 00:00 UTC):
//!    un file già ricodificato mantiene la sua data logica anche se i byte cambiano
//! 2. Data di ultima modifica dal filesystem (ora locale)
//! 3. Data sentinella 2000-01-01T00:00:00Z se il filesystem non risponde
//!
//! La risoluzione non fallisce mai.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use filetime::FileTime;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

use crate::error::ShrinkError;

/// Canonical timestamp of a movie, carrying the offset it was resolved in
pub type Timestamp = DateTime<FixedOffset>;

/// Format used for staging names, e.g. `20160513_181656`
pub const STAGING_NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 2000-01-01T00:00:00Z
const FALLBACK_UNIX_SECONDS: i64 = 946_684_800;

fn date_prefix() -> &'static Regex {
    static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();
    // [0-9] rather than \d: \d would also accept non-ASCII digits
    DATE_PREFIX.get_or_init(|| Regex::new(r"^([0-9]{8})_").expect("static regex"))
}

/// Resolve the canonical timestamp for `path`
pub fn resolve_timestamp(path: &Path) -> Timestamp {
    if let Some(date) = date_from_file_name(path) {
        return date;
    }

    match std::fs::metadata(path).and_then(|metadata| metadata.modified()) {
        Ok(modified) => DateTime::<Local>::from(modified).fixed_offset(),
        Err(e) => {
            warn!("Unable to get modification time for {}: {}", path.display(), e);
            fallback_timestamp()
        }
    }
}

/// Date embedded as an 8-digit `YYYYMMDD_` prefix of the file name, at midnight UTC
pub fn date_from_file_name(path: &Path) -> Option<Timestamp> {
    let name = path.file_name()?.to_str()?;
    let captures = date_prefix().captures(name)?;
    let date = NaiveDate::parse_from_str(&captures[1], "%Y%m%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).fixed_offset())
}

pub fn fallback_timestamp() -> Timestamp {
    (DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(FALLBACK_UNIX_SECONDS)).fixed_offset()
}

/// `YYYYMMDD_HHMMSS` in the timestamp's own offset
pub fn staging_stem(timestamp: &Timestamp) -> String {
    timestamp.format(STAGING_NAME_FORMAT).to_string()
}

/// Set access and modification time of `path` to `timestamp`
pub fn set_file_timestamp(path: &Path, timestamp: &Timestamp) -> Result<(), ShrinkError> {
    let file_time = FileTime::from_unix_time(timestamp.timestamp(), timestamp.timestamp_subsec_nanos());
    filetime::set_file_times(path, file_time, file_time).map_err(|source| ShrinkError::MtimeSet {
        path: path.to_path_buf(),
        source,
    })
}
