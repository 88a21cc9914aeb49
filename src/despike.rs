use crate::record::{Orientation, VelocityRecord};
use crate::spike::{Method, SpikeReport, Thresholds, detect};
use anyhow::{Context, Result};

/// Replace the spikes of a record with missing values.
///
/// Returns a cleaned copy restricted to the channels of `orientation`, and
/// the spike counts of both detection methods on the original samples.
/// Detection and replacement run once; the cleaned record is not re-scanned.
///
/// # Errors
/// Returns an error if the orientation is down-looking and the record has no
/// `w2` channel.
pub fn despike(
    record: &VelocityRecord,
    orientation: Orientation,
    method: Method,
    thresholds: &Thresholds,
) -> Result<(VelocityRecord, SpikeReport)> {
    let record = record
        .for_orientation(orientation)
        .context("failed to select channels")?;

    let detection = detect(&record, method, thresholds);

    Ok((record.masked(&detection.mask), detection.report))
}
