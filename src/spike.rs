//! Spike detection after Goring & Nikora (2002).
//!
//! Two per-channel detectors are available:
//! - acceleration thresholding: the backward difference of consecutive samples,
//!   scaled by the sampling frequency, must stay within `±9.81 * lambda_a`;
//! - velocity thresholding: samples must stay within `mean ± k * std` of the
//!   whole channel.
//!
//! Missing samples are never flagged.

use crate::record::{Channel, VelocityRecord};
use crate::stats::ComponentStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gravitational acceleration (m/s^2).
pub const GRAVITY: f64 = 9.81;

/// Spike detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Acceleration,
    Velocity,
}

impl Method {
    /// Select a method by name: any name containing "vel" (ignoring case)
    /// selects velocity thresholding, anything else acceleration thresholding.
    pub fn from_name(name: &str) -> Self {
        if name.to_lowercase().contains("vel") {
            Method::Velocity
        } else {
            Method::Acceleration
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Method::Acceleration => "acceleration",
            Method::Velocity => "velocity",
        }
    }
}

/// Detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Sampling frequency (Hz).
    pub sampling_freq: f64,
    /// Multiplier of gravitational acceleration.
    pub lambda_a: f64,
    /// Multiplier of the velocity standard deviation.
    pub k: f64,
}

impl Thresholds {
    /// Acceleration threshold (m/s^2).
    pub fn acc_limit(&self) -> f64 {
        GRAVITY * self.lambda_a
    }
}

/// Per-channel spike counts of both detection methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeReport {
    pub acceleration: BTreeMap<Channel, usize>,
    pub velocity: BTreeMap<Channel, usize>,
}

impl SpikeReport {
    pub fn counts(&self, method: Method) -> &BTreeMap<Channel, usize> {
        match method {
            Method::Acceleration => &self.acceleration,
            Method::Velocity => &self.velocity,
        }
    }

    /// Number of spikes found in a channel, zero if the channel was not evaluated.
    pub fn count(&self, method: Method, channel: Channel) -> usize {
        self.counts(method).get(&channel).copied().unwrap_or(0)
    }
}

/// Outcome of a detection run.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Flags of the selected method, per channel.
    pub mask: BTreeMap<Channel, Vec<bool>>,
    pub report: SpikeReport,
}

/// Acceleration series of a channel.
///
/// `acc[i] = (vals[i] - vals[i - 1]) * sampling_freq`; the first sample has
/// no predecessor and its acceleration is missing, as is any acceleration
/// involving a missing sample.
pub fn acceleration(vals: &[f64], sampling_freq: f64) -> Vec<f64> {
    let mut acc = Vec::with_capacity(vals.len());
    if !vals.is_empty() {
        acc.push(f64::NAN);
    }
    acc.extend(vals.windows(2).map(|pair| (pair[1] - pair[0]) * sampling_freq));
    acc
}

/// Flag samples whose acceleration lies outside `(-acc_limit, acc_limit)`.
pub fn flag_acceleration(vals: &[f64], sampling_freq: f64, acc_limit: f64) -> Vec<bool> {
    acceleration(vals, sampling_freq)
        .into_iter()
        .map(|acc| !acc.is_nan() && !(acc > -acc_limit && acc < acc_limit))
        .collect()
}

/// Flag samples strictly outside `mean ± k * std` of the channel.
pub fn flag_velocity(vals: &[f64], k: f64) -> Vec<bool> {
    let stats = ComponentStats::from_vals(vals);
    let lower = stats.average - k * stats.std_dev;
    let upper = stats.average + k * stats.std_dev;
    vals.iter()
        .map(|&val| !val.is_nan() && (val < lower || val > upper))
        .collect()
}

/// Run both detectors on every channel of a record.
///
/// Counts of both methods are always reported; `method` only selects which
/// flags end up in the returned mask.
pub fn detect(record: &VelocityRecord, method: Method, thresholds: &Thresholds) -> Detection {
    let mut mask = BTreeMap::new();
    let mut report = SpikeReport {
        acceleration: BTreeMap::new(),
        velocity: BTreeMap::new(),
    };

    for &channel in record.channels() {
        let Some(vals) = record.channel(channel) else {
            continue;
        };

        let acc_flags = flag_acceleration(vals, thresholds.sampling_freq, thresholds.acc_limit());
        let vel_flags = flag_velocity(vals, thresholds.k);

        report.acceleration.insert(channel, count_flags(&acc_flags));
        report.velocity.insert(channel, count_flags(&vel_flags));

        let flags = match method {
            Method::Acceleration => acc_flags,
            Method::Velocity => vel_flags,
        };
        mask.insert(channel, flags);
    }

    Detection { mask, report }
}

fn count_flags(flags: &[bool]) -> usize {
    flags.iter().filter(|&&flag| flag).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const THRESHOLDS: Thresholds = Thresholds {
        sampling_freq: 200.0,
        lambda_a: 1.0,
        k: 3.0,
    };

    fn record(u: Vec<f64>) -> VelocityRecord {
        let n_smp = u.len();
        let time = (0..n_smp).map(|i_smp| i_smp as f64 / 200.0).collect();
        VelocityRecord::new(time, u, vec![0.0; n_smp], vec![0.0; n_smp], None)
            .expect("failed to build record")
    }

    #[test]
    fn method_is_selected_by_substring() {
        assert_eq!(Method::from_name("Velocity"), Method::Velocity);
        assert_eq!(Method::from_name("VEL-threshold"), Method::Velocity);
        assert_eq!(Method::from_name("acceleration"), Method::Acceleration);
        assert_eq!(Method::from_name(""), Method::Acceleration);
    }

    #[test]
    fn acceleration_is_backward_difference() {
        let acc = acceleration(&[1.0, 1.0, 1.0, 50.0, 1.0], 200.0);
        assert!(acc[0].is_nan());
        assert_abs_diff_eq!(acc[1], 0.0);
        assert_abs_diff_eq!(acc[3], 9800.0, epsilon = 1e-9);
        assert_abs_diff_eq!(acc[4], -9800.0, epsilon = 1e-9);
    }

    #[test]
    fn jump_flags_spike_and_successor() {
        let flags = flag_acceleration(&[1.0, 1.0, 1.0, 50.0, 1.0], 200.0, THRESHOLDS.acc_limit());
        assert_eq!(flags, vec![false, false, false, true, true]);
    }

    #[test]
    fn first_sample_is_never_an_acceleration_spike() {
        let flags = flag_acceleration(&[100.0, 1.0, 1.0], 200.0, THRESHOLDS.acc_limit());
        assert!(!flags[0]);
        assert!(flags[1]);
    }

    #[test]
    fn missing_samples_are_never_flagged() {
        let vals = [1.0, f64::NAN, 80.0, 1.0, f64::NAN];
        let acc_flags = flag_acceleration(&vals, 200.0, THRESHOLDS.acc_limit());
        assert!(!acc_flags[1]);
        assert!(!acc_flags[2]);
        assert!(acc_flags[3]);
        assert!(!acc_flags[4]);

        let vel_flags = flag_velocity(&vals, 0.5);
        assert!(!vel_flags[1]);
        assert!(!vel_flags[4]);
    }

    #[test]
    fn velocity_bounds_are_strict() {
        // mean 1, population std 1: both samples lie exactly on the bounds for k = 1
        let flags = flag_velocity(&[0.0, 2.0], 1.0);
        assert_eq!(flags, vec![false; 2]);

        let flags = flag_velocity(&[0.0, 2.0], 0.5);
        assert_eq!(flags, vec![true; 2]);
    }

    #[test]
    fn all_missing_channel_has_no_velocity_spikes() {
        assert_eq!(flag_velocity(&[f64::NAN; 3], 3.0), vec![false; 3]);
    }

    #[test]
    fn detect_reports_both_methods() {
        let mut u = [1.0, 1.01, 0.99, 1.0].repeat(5);
        u.push(50.0);
        u.extend([1.0, 1.01]);
        let rec = record(u);

        let detection = detect(&rec, Method::Velocity, &THRESHOLDS);
        let report = &detection.report;
        assert_eq!(report.count(Method::Velocity, Channel::U), 1);
        assert_eq!(report.count(Method::Acceleration, Channel::U), 2);
        assert_eq!(report.count(Method::Acceleration, Channel::V), 0);
        assert!(report.acceleration.get(&Channel::W2).is_none());

        let u_mask = &detection.mask[&Channel::U];
        assert_eq!(u_mask.iter().filter(|&&flag| flag).count(), 1);
        assert!(u_mask[20]);
    }

    #[test]
    fn channels_are_evaluated_independently() {
        let n_smp = 6;
        let time = (0..n_smp).map(|i_smp| i_smp as f64 / 200.0).collect();
        let rec = VelocityRecord::new(
            time,
            vec![0.0; n_smp],
            vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            vec![0.0; n_smp],
            Some(vec![0.0; n_smp]),
        )
        .expect("failed to build record");

        let detection = detect(&rec, Method::Acceleration, &THRESHOLDS);
        assert_eq!(detection.report.count(Method::Acceleration, Channel::V), 1);
        for channel in [Channel::U, Channel::W1, Channel::W2] {
            assert_eq!(detection.report.count(Method::Acceleration, channel), 0);
        }
    }
}
