//! Velocity time series recorded by one ADV probe at one position.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Velocity channel of an ADV probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    U,
    V,
    W1,
    W2,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::U => "u",
            Channel::V => "v",
            Channel::W1 => "w1",
            Channel::W2 => "w2",
        }
    }
}

/// Probe mounting orientation.
///
/// Down-looking probes report a second vertical channel (`w2`),
/// longitudinal (side-looking) probes do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Longitudinal,
    Down,
}

impl Orientation {
    /// Channels that are meaningful for this orientation.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Orientation::Longitudinal => &[Channel::U, Channel::V, Channel::W1],
            Orientation::Down => &[Channel::U, Channel::V, Channel::W1, Channel::W2],
        }
    }
}

/// Time series of velocity samples.
///
/// Missing samples are stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityRecord {
    time: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
    w1: Vec<f64>,
    w2: Option<Vec<f64>>,
}

impl VelocityRecord {
    /// Create a record from its columns.
    ///
    /// # Errors
    /// Returns an error if the columns differ in length or if the
    /// timestamps are not finite and strictly increasing.
    pub fn new(
        time: Vec<f64>,
        u: Vec<f64>,
        v: Vec<f64>,
        w1: Vec<f64>,
        w2: Option<Vec<f64>>,
    ) -> Result<Self> {
        let n_samples = time.len();
        let lens = [u.len(), v.len(), w1.len()];
        if lens.into_iter().chain(w2.as_ref().map(Vec::len)).any(|len| len != n_samples) {
            bail!("all channels must have {n_samples} samples");
        }
        if time.iter().any(|t| !t.is_finite()) {
            bail!("timestamps must be finite");
        }
        if let Some(i_smp) = time.windows(2).position(|pair| pair[1] <= pair[0]) {
            bail!("timestamps must be strictly increasing (sample {})", i_smp + 1);
        }
        Ok(Self {
            time,
            u,
            v,
            w1,
            w2,
        })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Get the samples of a channel, if the record has it.
    pub fn channel(&self, channel: Channel) -> Option<&[f64]> {
        match channel {
            Channel::U => Some(&self.u),
            Channel::V => Some(&self.v),
            Channel::W1 => Some(&self.w1),
            Channel::W2 => self.w2.as_deref(),
        }
    }

    /// Orientation whose channel set the record carries.
    pub fn orientation(&self) -> Orientation {
        match self.w2 {
            Some(_) => Orientation::Down,
            None => Orientation::Longitudinal,
        }
    }

    /// Channels present in the record, in output order.
    pub fn channels(&self) -> &'static [Channel] {
        self.orientation().channels()
    }

    /// Project the record onto the channel set of an orientation.
    ///
    /// # Errors
    /// Returns an error if the orientation is down-looking and the record has no `w2` channel.
    pub fn for_orientation(&self, orientation: Orientation) -> Result<Self> {
        let w2 = match orientation {
            Orientation::Longitudinal => None,
            Orientation::Down => match &self.w2 {
                Some(w2) => Some(w2.clone()),
                None => {
                    bail!("down-looking orientation requires a w2 channel, but record has none")
                }
            },
        };
        Ok(Self {
            time: self.time.clone(),
            u: self.u.clone(),
            v: self.v.clone(),
            w1: self.w1.clone(),
            w2,
        })
    }

    /// Shift timestamps so the first sample is at t = 0.
    pub fn rebased(mut self) -> Self {
        if let Some(&t_0) = self.time.first() {
            self.time.iter_mut().for_each(|t| *t -= t_0);
        }
        self
    }

    /// Copy of the record with every flagged sample replaced by the missing-value marker.
    ///
    /// Channels absent from `mask` are copied unchanged.
    pub fn masked(&self, mask: &BTreeMap<Channel, Vec<bool>>) -> Self {
        let mut record = self.clone();
        for (&channel, flags) in mask {
            let vals = match channel {
                Channel::U => &mut record.u,
                Channel::V => &mut record.v,
                Channel::W1 => &mut record.w1,
                Channel::W2 => match record.w2.as_mut() {
                    Some(w2) => w2,
                    None => continue,
                },
            };
            for (val, &flag) in vals.iter_mut().zip(flags) {
                if flag {
                    *val = f64::NAN;
                }
            }
        }
        record
    }
}
