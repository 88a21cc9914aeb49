//! Spatial profile of turbulence statistics.

use crate::position::ProbePosition;
use crate::record::Orientation;
use crate::stats::{ComponentStats, TurbulenceStats};
use anyhow::{Result, bail};

/// Statistics of one probe position.
#[derive(Debug, Clone)]
pub struct ProfileEntry {
    pub id: String,
    pub position: ProbePosition,
    pub stats: TurbulenceStats,
}

/// One row of a profile table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub id: String,
    pub vals: Vec<f64>,
}

/// Ordered table of profile rows sharing one column layout.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    columns: Vec<String>,
    rows: Vec<ProfileRow>,
}

impl ProfileTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ProfileRow] {
        &self.rows
    }

    /// Values of a named column, one per row.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let i_col = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row.vals[i_col]).collect())
    }
}

const BASE_COLUMNS: [&str; 19] = [
    "x (m)",
    "y (m)",
    "z (m)",
    "u_avg (m/s)",
    "u_stderr (m/s)",
    "u_std (m/s)",
    "v_avg (m/s)",
    "v_stderr (m/s)",
    "v_std (m/s)",
    "w_avg (m/s)",
    "w_stderr (m/s)",
    "w_std (m/s)",
    "tke (m^2/s^2)",
    "tau_uv_avg (m^2/s^2)",
    "tau_uv_stderr (m^2/s^2)",
    "tau_uv_std (m^2/s^2)",
    "tau_uw_avg (m^2/s^2)",
    "tau_uw_stderr (m^2/s^2)",
    "tau_uw_std (m^2/s^2)",
];

const DOWN_COLUMNS: [&str; 7] = [
    "w2_avg (m/s)",
    "w2_stderr (m/s)",
    "w2_std (m/s)",
    "tke2 (m^2/s^2)",
    "tau_uw2_avg (m^2/s^2)",
    "tau_uw2_stderr (m^2/s^2)",
    "tau_uw2_std (m^2/s^2)",
];

const NORM_COLUMNS: [&str; 4] = ["u/U (-)", "x/L (-)", "tke/U^2 (-)", "tke_2d/U^2 (-)"];

/// Column names of a profile table for an orientation.
pub fn columns(orientation: Orientation) -> Vec<String> {
    let mut columns: Vec<_> = BASE_COLUMNS.iter().map(|name| name.to_string()).collect();
    if orientation == Orientation::Down {
        columns.extend(DOWN_COLUMNS.iter().map(|name| name.to_string()));
    }
    columns.extend(NORM_COLUMNS.iter().map(|name| name.to_string()));
    columns
}

/// Assemble a profile table, one row per entry, in entry order.
///
/// Velocities are normalized by `bulk_velocity` and x by `char_length`.
///
/// # Errors
/// Returns an error if `bulk_velocity` or `char_length` is not strictly
/// positive, or if an entry's statistics do not match `orientation`.
pub fn assemble(
    entries: &[ProfileEntry],
    orientation: Orientation,
    bulk_velocity: f64,
    char_length: f64,
) -> Result<ProfileTable> {
    if !(bulk_velocity > 0.0 && bulk_velocity.is_finite()) {
        bail!("bulk velocity must be positive, but is {bulk_velocity}");
    }
    if !(char_length > 0.0 && char_length.is_finite()) {
        bail!("characteristic length must be positive, but is {char_length}");
    }

    let columns = columns(orientation);
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.stats.orientation() != orientation {
            bail!(
                "entry {} has {:?} statistics, but the profile is {:?}",
                entry.id,
                entry.stats.orientation(),
                orientation
            );
        }
        let vals = row_vals(entry, bulk_velocity, char_length);
        debug_assert_eq!(vals.len(), columns.len());
        rows.push(ProfileRow {
            id: entry.id.clone(),
            vals,
        });
    }

    Ok(ProfileTable { columns, rows })
}

fn push_component(vals: &mut Vec<f64>, stats: &ComponentStats) {
    vals.extend([stats.average, stats.std_err, stats.std_dev]);
}

fn row_vals(entry: &ProfileEntry, bulk_velocity: f64, char_length: f64) -> Vec<f64> {
    let pos = &entry.position;
    let base = entry.stats.base();

    let mut vals = vec![pos.x, pos.y, pos.z];
    push_component(&mut vals, &base.u);
    push_component(&mut vals, &base.v);
    push_component(&mut vals, &base.w);
    vals.push(base.tke);
    push_component(&mut vals, &base.tau_uv);
    push_component(&mut vals, &base.tau_uw);

    if let Some(second) = entry.stats.second_vertical() {
        push_component(&mut vals, &second.w2);
        vals.push(second.tke2);
        push_component(&mut vals, &second.tau_uw2);
    }

    let bulk_velocity_2 = bulk_velocity.powi(2);
    vals.extend([
        base.u.average / bulk_velocity,
        pos.x / char_length,
        base.tke / bulk_velocity_2,
        base.tke_2d() / bulk_velocity_2,
    ]);

    vals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{BaseStats, SecondVerticalStats};
    use approx::assert_abs_diff_eq;

    fn component(average: f64, std_dev: f64) -> ComponentStats {
        ComponentStats {
            average,
            std_err: std_dev / 10.0,
            std_dev,
        }
    }

    fn base(u_average: f64) -> BaseStats {
        let u = component(u_average, 0.2);
        let v = component(0.0, 0.1);
        let w = component(0.0, 0.1);
        BaseStats {
            u,
            v,
            w,
            tke: 0.5 * (u.var() + v.var() + w.var()),
            tau_uv: component(0.001, 0.01),
            tau_uw: component(-0.002, 0.01),
        }
    }

    fn value(table: &ProfileTable, i_row: usize, name: &str) -> f64 {
        table.column(name).expect("column must exist")[i_row]
    }

    fn entry(id: &str, x: f64, stats: TurbulenceStats) -> ProfileEntry {
        ProfileEntry {
            id: id.to_string(),
            position: ProbePosition { x, y: 0.0, z: 0.1 },
            stats,
        }
    }

    #[test]
    fn normalizes_velocity_and_position() {
        let entries = [entry("p0", 2.0, TurbulenceStats::Longitudinal(base(0.5)))];
        let table =
            assemble(&entries, Orientation::Longitudinal, 1.0, 1.0).expect("failed to assemble");

        assert_eq!(table.rows().len(), 1);
        assert_abs_diff_eq!(value(&table, 0, "u/U (-)"), 0.5);
        assert_abs_diff_eq!(value(&table, 0, "x/L (-)"), 2.0);
        assert_abs_diff_eq!(
            value(&table, 0, "tke_2d/U^2 (-)"),
            0.5 * (0.04 + 0.01),
            epsilon = 1e-12
        );
        assert!(table.column("no such column").is_none());
    }

    #[test]
    fn normalization_scales_with_bulk_velocity() {
        let entries = [entry("p0", 1.0, TurbulenceStats::Longitudinal(base(0.5)))];
        let table =
            assemble(&entries, Orientation::Longitudinal, 2.0, 0.5).expect("failed to assemble");
        let tke = value(&table, 0, "tke (m^2/s^2)");

        assert_abs_diff_eq!(value(&table, 0, "u/U (-)"), 0.25);
        assert_abs_diff_eq!(value(&table, 0, "x/L (-)"), 2.0);
        assert_abs_diff_eq!(value(&table, 0, "tke/U^2 (-)"), tke / 4.0);
    }

    #[test]
    fn down_columns_only_for_down_orientation() {
        let long =
            assemble(&[], Orientation::Longitudinal, 1.0, 1.0).expect("failed to assemble");
        let has_down_column = |name: &String| name.contains("w2") || name.starts_with("tke2");
        assert!(!long.columns().iter().any(has_down_column));
        assert_eq!(long.columns().len(), 23);

        let down = assemble(&[], Orientation::Down, 1.0, 1.0).expect("failed to assemble");
        for name in DOWN_COLUMNS {
            assert!(down.columns().iter().any(|col| col == name));
        }
        assert_eq!(down.columns().len(), 30);
    }

    #[test]
    fn rows_keep_input_order_and_shape() {
        let second = SecondVerticalStats {
            w2: component(0.01, 0.1),
            tke2: 0.03,
            tau_uw2: component(0.0, 0.01),
        };
        let entries: Vec<_> = [3.0, 1.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i_pos, &x)| {
                entry(&format!("p{i_pos}"), x, TurbulenceStats::Down(base(0.4), second))
            })
            .collect();

        let table = assemble(&entries, Orientation::Down, 0.8, 0.2).expect("failed to assemble");
        assert_eq!(table.rows().len(), 3);
        for (i_row, row) in table.rows().iter().enumerate() {
            assert_eq!(row.id, format!("p{i_row}"));
            assert_eq!(row.vals.len(), table.columns().len());
        }
        assert_eq!(table.column("x (m)"), Some(vec![3.0, 1.0, 2.0]));
        assert_eq!(value(&table, 2, "tke2 (m^2/s^2)"), 0.03);
    }

    #[test]
    fn mismatched_orientation_is_an_error() {
        let entries = [entry("p0", 0.0, TurbulenceStats::Longitudinal(base(0.5)))];
        assert!(assemble(&entries, Orientation::Down, 1.0, 1.0).is_err());
    }

    #[test]
    fn non_positive_scales_are_errors() {
        assert!(assemble(&[], Orientation::Longitudinal, 0.0, 1.0).is_err());
        assert!(assemble(&[], Orientation::Longitudinal, 1.0, -1.0).is_err());
    }

    #[test]
    fn missing_position_propagates_to_normalized_x() {
        let entries = [entry("p0", f64::NAN, TurbulenceStats::Longitudinal(base(0.5)))];
        let table =
            assemble(&entries, Orientation::Longitudinal, 1.0, 1.0).expect("failed to assemble");
        assert!(value(&table, 0, "x/L (-)").is_nan());
    }
}
