use serde::{Deserialize, Serialize};

/// Probe position (m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ProbePosition {
    /// Parse a position from a probe file stem such as `__8_16.5_6_T3`.
    ///
    /// A double underscore encodes a minus sign and the first three
    /// underscore-separated tokens are x, y and z. Coordinates that cannot be
    /// parsed are set to `NAN` and their tokens are returned alongside.
    pub fn from_file_stem(stem: &str) -> (Self, Vec<String>) {
        let stem = stem.replace("__", "-");
        let mut tokens = stem.split('_');
        let mut malformed = Vec::new();

        let mut coord = || match tokens.next() {
            Some(token) => token.trim().parse::<f64>().unwrap_or_else(|_| {
                malformed.push(token.to_string());
                f64::NAN
            }),
            None => {
                malformed.push(String::new());
                f64::NAN
            }
        };
        let (x, y, z) = (coord(), coord(), coord());

        (Self { x, y, z }, malformed)
    }
}
