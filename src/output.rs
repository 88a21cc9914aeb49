//! CSV writers for time series, spike counts and profile tables.

use crate::profile::ProfileTable;
use crate::record::VelocityRecord;
use crate::spike::{Method, SpikeReport};
use anyhow::{Context, Result, bail};
use csv::Writer;
use std::path::Path;

fn fmt_val(val: f64, missing_value: f64) -> String {
    if val.is_nan() {
        missing_value.to_string()
    } else {
        val.to_string()
    }
}

fn create_writer(file: &Path) -> Result<Writer<std::fs::File>> {
    Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))
}

/// Write a record as columns `t (s)`, then one velocity column per channel,
/// then one column per named stress series.
///
/// Every series must have one value per sample.
pub fn write_record<P: AsRef<Path>>(
    file: P,
    record: &VelocityRecord,
    stress_series: &[(&str, Vec<f64>)],
    missing_value: f64,
) -> Result<()> {
    let n_smp = record.time().len();
    if let Some((name, _)) = stress_series.iter().find(|(_, vals)| vals.len() != n_smp) {
        bail!("series {name} must have {n_smp} samples");
    }

    let mut writer = create_writer(file.as_ref())?;

    let channels = record.channels();
    let mut header = vec!["t (s)".to_string()];
    header.extend(channels.iter().map(|ch| format!("{} (m/s)", ch.label())));
    header.extend(stress_series.iter().map(|(name, _)| format!("{name} (m^2/s^2)")));
    writer.write_record(&header).context("failed to write header")?;

    for (i_smp, &t) in record.time().iter().enumerate() {
        let mut fields = vec![fmt_val(t, missing_value)];
        for &channel in channels {
            let val = record.channel(channel).map_or(f64::NAN, |vals| vals[i_smp]);
            fields.push(fmt_val(val, missing_value));
        }
        fields.extend(stress_series.iter().map(|(_, vals)| fmt_val(vals[i_smp], missing_value)));
        writer.write_record(&fields).context("failed to write sample")?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Write spike counts, one row per detection method and one column per channel.
pub fn write_spikes<P: AsRef<Path>>(file: P, report: &SpikeReport) -> Result<()> {
    let mut writer = create_writer(file.as_ref())?;

    let channels: Vec<_> = report.acceleration.keys().copied().collect();
    let mut header = vec!["method".to_string()];
    header.extend(channels.iter().map(|ch| format!("{} spikes", ch.label())));
    writer.write_record(&header).context("failed to write header")?;

    for method in [Method::Acceleration, Method::Velocity] {
        let mut fields = vec![method.label().to_string()];
        fields.extend(channels.iter().map(|&ch| report.count(method, ch).to_string()));
        writer.write_record(&fields).context("failed to write counts")?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Write a profile table with a leading identifier column.
pub fn write_profile<P: AsRef<Path>>(
    file: P,
    table: &ProfileTable,
    missing_value: f64,
) -> Result<()> {
    let mut writer = create_writer(file.as_ref())?;

    let mut header = vec!["id".to_string()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header).context("failed to write header")?;

    for row in table.rows() {
        let mut fields = vec![row.id.clone()];
        fields.extend(row.vals.iter().map(|&val| fmt_val(val, missing_value)));
        writer.write_record(&fields).context("failed to write row")?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
