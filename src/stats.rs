//! Turbulence statistics of a velocity record.
//!
//! Every aggregate ignores missing samples (`NAN`). A channel without any
//! valid sample yields `NAN` statistics instead of dividing by zero.

use crate::record::{Channel, Orientation, VelocityRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Running mean and population variance of the valid samples of a channel.
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    /// Add a sample; missing samples are skipped.
    pub fn add(&mut self, val: f64) {
        if val.is_nan() {
            return;
        }
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> ComponentStats {
        if self.n_vals == 0 {
            return ComponentStats::missing();
        }
        let n_vals = self.n_vals as f64;
        let std_dev = (self.diff_2_sum / n_vals).sqrt();
        ComponentStats {
            average: self.mean,
            std_err: std_dev / n_vals.sqrt(),
            std_dev,
        }
    }
}

/// Average, standard error and population standard deviation of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub average: f64,
    pub std_err: f64,
    pub std_dev: f64,
}

impl ComponentStats {
    pub fn missing() -> Self {
        Self {
            average: f64::NAN,
            std_err: f64::NAN,
            std_dev: f64::NAN,
        }
    }

    pub fn from_vals(vals: &[f64]) -> Self {
        let mut acc = Accumulator::new();
        vals.iter().for_each(|&val| acc.add(val));
        acc.report()
    }

    pub fn var(&self) -> f64 {
        self.std_dev.powi(2)
    }
}

/// Statistics available for every orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub u: ComponentStats,
    pub v: ComponentStats,
    pub w: ComponentStats,
    /// Turbulent kinetic energy from u, v and w1.
    pub tke: f64,
    pub tau_uv: ComponentStats,
    pub tau_uw: ComponentStats,
}

impl BaseStats {
    /// Planar (u, v) part of the turbulent kinetic energy.
    pub fn tke_2d(&self) -> f64 {
        0.5 * (self.u.var() + self.v.var())
    }
}

/// Statistics derived from the second vertical channel of a down-looking probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondVerticalStats {
    pub w2: ComponentStats,
    /// Turbulent kinetic energy from u, v and w2.
    pub tke2: f64,
    pub tau_uw2: ComponentStats,
}

/// Statistics of one record snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurbulenceStats {
    Longitudinal(BaseStats),
    Down(BaseStats, SecondVerticalStats),
}

impl TurbulenceStats {
    pub fn orientation(&self) -> Orientation {
        match self {
            TurbulenceStats::Longitudinal(_) => Orientation::Longitudinal,
            TurbulenceStats::Down(..) => Orientation::Down,
        }
    }

    pub fn base(&self) -> &BaseStats {
        match self {
            TurbulenceStats::Longitudinal(base) | TurbulenceStats::Down(base, _) => base,
        }
    }

    pub fn second_vertical(&self) -> Option<&SecondVerticalStats> {
        match self {
            TurbulenceStats::Longitudinal(_) => None,
            TurbulenceStats::Down(_, second) => Some(second),
        }
    }
}

/// Compute the turbulence statistics of a record.
///
/// # Errors
/// Returns an error if the orientation is down-looking and the record has no `w2` channel.
pub fn compute_stats(
    record: &VelocityRecord,
    orientation: Orientation,
) -> Result<TurbulenceStats> {
    let record = record
        .for_orientation(orientation)
        .context("failed to select channels")?;

    let u = channel(&record, Channel::U)?;
    let v = channel(&record, Channel::V)?;
    let w1 = channel(&record, Channel::W1)?;

    let u_stats = ComponentStats::from_vals(u);
    let v_stats = ComponentStats::from_vals(v);
    let w_stats = ComponentStats::from_vals(w1);

    let base = BaseStats {
        u: u_stats,
        v: v_stats,
        w: w_stats,
        tke: compute_tke(&u_stats, &v_stats, &w_stats),
        tau_uv: reynolds_stress(u, &u_stats, v, &v_stats),
        tau_uw: reynolds_stress(u, &u_stats, w1, &w_stats),
    };

    let stats = match orientation {
        Orientation::Longitudinal => TurbulenceStats::Longitudinal(base),
        Orientation::Down => {
            let w2 = channel(&record, Channel::W2)?;
            let w2_stats = ComponentStats::from_vals(w2);
            let second = SecondVerticalStats {
                w2: w2_stats,
                tke2: compute_tke(&u_stats, &v_stats, &w2_stats),
                tau_uw2: reynolds_stress(u, &u_stats, w2, &w2_stats),
            };
            TurbulenceStats::Down(base, second)
        }
    };

    Ok(stats)
}

fn channel(record: &VelocityRecord, channel: Channel) -> Result<&[f64]> {
    record
        .channel(channel)
        .with_context(|| format!("record has no {} channel", channel.label()))
}

fn compute_tke(u: &ComponentStats, v: &ComponentStats, w: &ComponentStats) -> f64 {
    0.5 * (u.var() + v.var() + w.var())
}

/// Per-sample Reynolds stress series of a record, named like the statistics
/// they average to: `tau_uv`, `tau_uw` and, with a `w2` channel, `tau_uw2`.
pub fn reynolds_stress_series(record: &VelocityRecord) -> Vec<(&'static str, Vec<f64>)> {
    let Some(u) = record.channel(Channel::U) else {
        return Vec::new();
    };
    let u_mean = ComponentStats::from_vals(u).average;

    [(Channel::V, "tau_uv"), (Channel::W1, "tau_uw"), (Channel::W2, "tau_uw2")]
        .into_iter()
        .filter_map(|(channel, name)| {
            let vals = record.channel(channel)?;
            let mean = ComponentStats::from_vals(vals).average;
            Some((name, fluctuation_product(u, u_mean, vals, mean)))
        })
        .collect()
}

/// Product of the fluctuations of two channels, missing wherever either sample is.
fn fluctuation_product(a: &[f64], a_mean: f64, b: &[f64], b_mean: f64) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(&a_val, &b_val)| (a_val - a_mean) * (b_val - b_mean))
        .collect()
}

fn reynolds_stress(
    a: &[f64],
    a_stats: &ComponentStats,
    b: &[f64],
    b_stats: &ComponentStats,
) -> ComponentStats {
    ComponentStats::from_vals(&fluctuation_product(a, a_stats.average, b, b_stats.average))
}
