//! Reader for whitespace-separated ADV exports (`.vna` and `.dat` files).
//!
//! `.vna` files start with an all-zero column which is dropped. The remaining
//! columns are time (s), sample number, an unused column, the velocities
//! u, v, w1 and w2 (m/s), and then beam amplitude, SNR and correlation
//! columns which are ignored.

use crate::record::{Orientation, VelocityRecord};
use anyhow::{Context, Result, bail};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

const I_TIME: usize = 0;
const I_U: usize = 3;
const I_V: usize = 4;
const I_W1: usize = 5;
const I_W2: usize = 6;

/// Read a velocity record from a probe file.
///
/// Timestamps are shifted to start at zero. The `w2` column is kept for
/// down-looking probes whenever the file has one, whatever its values, and
/// always left out for longitudinal probes.
pub fn read_record<P: AsRef<Path>>(file: P, orientation: Orientation) -> Result<VelocityRecord> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (i_line, line) in reader.lines().enumerate() {
        let line = line.context("failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(&line)
            .with_context(|| format!("failed to parse line {}", i_line + 1))?;
        rows.push(row);
    }

    parse_rows(rows, orientation)
}

fn parse_row(line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("invalid number {token:?}"))
        })
        .collect()
}

fn parse_rows(mut rows: Vec<Vec<f64>>, orientation: Orientation) -> Result<VelocityRecord> {
    if rows.len() < 2 {
        bail!("file must have at least 2 samples, but has {}", rows.len());
    }

    if leading_zeros(&rows, 0) {
        rows.iter_mut().for_each(|row| {
            row.remove(0);
        });
    }

    let n_cols = rows.iter().map(Vec::len).min().unwrap_or(0);
    if n_cols <= I_W1 {
        bail!("file must have at least {} columns, but has {n_cols}", I_W1 + 1);
    }

    let column = |i_col: usize| -> Vec<f64> { rows.iter().map(|row| row[i_col]).collect() };

    let w2 = match orientation {
        Orientation::Down if n_cols > I_W2 => Some(column(I_W2)),
        _ => None,
    };

    let record = VelocityRecord::new(column(I_TIME), column(I_U), column(I_V), column(I_W1), w2)
        .context("failed to build record")?;

    Ok(record.rebased())
}

fn leading_zeros(rows: &[Vec<f64>], i_col: usize) -> bool {
    rows.iter()
        .take(2)
        .all(|row| row.get(i_col).is_some_and(|&val| val == 0.0))
}
