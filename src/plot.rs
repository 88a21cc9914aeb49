//! Profile plots.

use crate::profile::ProfileTable;
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

const PLOT_WIDTH: u32 = 1200;
const PLOT_HEIGHT: u32 = 800;

const X_COLUMN: &str = "x/L (-)";
const TKE_COLUMN: &str = "tke/U^2 (-)";

const POINT_COLOR: RGBColor = RGBColor(112, 128, 144);

/// Points `(x/L, tke/U^2)` of a profile table, leaving out rows where either is missing.
pub fn tke_points(table: &ProfileTable) -> Vec<(f64, f64)> {
    match (table.column(X_COLUMN), table.column(TKE_COLUMN)) {
        (Some(xs), Some(tkes)) => xs
            .into_iter()
            .zip(tkes)
            .filter(|(x, tke)| x.is_finite() && tke.is_finite())
            .collect(),
        _ => Vec::new(),
    }
}

/// Scatter plot of the normalized TKE against the normalized x position.
///
/// Returns the number of plotted points. Nothing is written if the table has none.
pub fn plot_tke_profile<P: AsRef<Path>>(file: P, table: &ProfileTable) -> Result<usize> {
    let points = tke_points(table);
    if points.is_empty() {
        return Ok(0);
    }

    let x_range = axis_range(points.iter().map(|&(x, _)| x));
    let y_range = axis_range(points.iter().map(|&(_, tke)| tke));

    let root = BitMapBackend::new(file.as_ref(), (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("failed to fill background")?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Normalized TKE profile", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .context("failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc("x/L (-)")
        .y_desc("TKE/U^2 (-)")
        .draw()
        .context("failed to draw mesh")?;

    chart
        .draw_series(points.iter().map(|&point| Circle::new(point, 4, POINT_COLOR.filled())))
        .context("failed to draw points")?;

    root.present().context("failed to write plot")?;

    Ok(points.len())
}

/// Range covering all values with a margin; a single value gets a unit-width range.
fn axis_range(vals: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = vals.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), val| {
        (min.min(val), max.max(val))
    });
    let pad = if max > min { 0.05 * (max - min) } else { 0.5 };
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::ProbePosition;
    use crate::profile::{ProfileEntry, assemble};
    use crate::record::Orientation;
    use crate::stats::{BaseStats, ComponentStats, TurbulenceStats};

    fn entry(id: &str, x: f64, u_std_dev: f64) -> ProfileEntry {
        let component = |average, std_dev| ComponentStats {
            average,
            std_err: f64::NAN,
            std_dev,
        };
        let u = component(0.5, u_std_dev);
        let base = BaseStats {
            u,
            v: component(0.0, 0.0),
            w: component(0.0, 0.0),
            tke: 0.5 * u.var(),
            tau_uv: component(0.0, 0.0),
            tau_uw: component(0.0, 0.0),
        };
        ProfileEntry {
            id: id.to_string(),
            position: ProbePosition { x, y: 0.0, z: 0.0 },
            stats: TurbulenceStats::Longitudinal(base),
        }
    }

    #[test]
    fn points_skip_missing_positions_and_tke() {
        let entries = [
            entry("a", 0.1, 0.2),
            entry("b", f64::NAN, 0.2),
            entry("c", 0.3, f64::NAN),
            entry("d", 0.4, 0.1),
        ];
        let table =
            assemble(&entries, Orientation::Longitudinal, 1.0, 0.1).expect("failed to assemble");

        let points = tke_points(&table);
        assert_eq!(points.len(), 2);
        assert!((points[0].0 - 1.0).abs() < 1e-12);
        assert!((points[0].1 - 0.02).abs() < 1e-12);
        assert!((points[1].0 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_profile_writes_nothing() {
        let table = assemble(&[], Orientation::Longitudinal, 1.0, 1.0).expect("failed to assemble");
        let file = std::env::temp_dir().join(format!("advstat-{}-empty.png", std::process::id()));

        let n_points = plot_tke_profile(&file, &table).expect("failed to plot");
        assert_eq!(n_points, 0);
        assert!(!file.exists());
    }

    #[test]
    fn single_value_range_is_padded() {
        let range = axis_range([2.0, 2.0].into_iter());
        assert!(range.start < 2.0 && range.end > 2.0);

        let range = axis_range([0.0, 1.0].into_iter());
        assert!(range.start < 0.0 && range.end > 1.0);
    }
}
