use crate::record::Orientation;
use crate::spike::{Method, Thresholds};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Probe parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Mounting orientation of the probe.
    pub orientation: Orientation,
    /// Sampling frequency (Hz).
    pub sampling_freq: f64,
}

/// Flow scales used to normalize the profiles.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Bulk velocity (m/s).
    pub bulk_velocity: f64,
    /// Characteristic length (m).
    pub char_length: f64,
}

/// Despiking parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DespikeConfig {
    /// Name of the method used to remove spikes.
    pub method: String,
    /// Multiplier of gravitational acceleration.
    pub lambda_a: f64,
    /// Multiplier of the velocity standard deviation.
    pub k: f64,
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Value written in place of missing samples.
    pub missing_value: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            missing_value: -9999.0,
        }
    }
}

/// Experiment configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub probe: ProbeConfig,
    pub flow: FlowConfig,
    pub despike: DespikeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn method(&self) -> Method {
        Method::from_name(&self.despike.method)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            sampling_freq: self.probe.sampling_freq,
            lambda_a: self.despike.lambda_a,
            k: self.despike.k,
        }
    }

    fn validate(&self) -> Result<()> {
        check_pos(self.probe.sampling_freq).context("invalid sampling frequency")?;

        check_pos(self.flow.bulk_velocity).context("invalid bulk velocity")?;
        check_pos(self.flow.char_length).context("invalid characteristic length")?;

        check_pos(self.despike.lambda_a).context("invalid acceleration multiplier")?;
        check_pos(self.despike.k).context("invalid velocity multiplier")?;

        if !self.output.missing_value.is_finite() {
            bail!("missing value must be finite");
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_pos(num: f64) -> Result<()> {
    check_num(num, f64::MIN_POSITIVE..=f64::MAX)
}
