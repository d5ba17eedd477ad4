use std::fmt::{self, Display};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use genomeloader_core::models::Region;

use crate::error::GeneratorError;

/// How far a window center may be moved away from its interval's midpoint.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    /// Up to `max(len / 2, (window_len - len) / 2)` bases either way.
    #[default]
    Sliding,
    /// Up to `output_seq_len / 2` bases either way.
    Detection,
    /// No jitter.
    None,
}

impl FromStr for JitterMode {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sliding" => Ok(JitterMode::Sliding),
            "detection" => Ok(JitterMode::Detection),
            "none" => Ok(JitterMode::None),
            _ => Err(GeneratorError::InvalidConfig(format!(
                "Invalid jitter mode '{}'. Expected one of: sliding, detection, none",
                s
            ))),
        }
    }
}

impl Display for JitterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JitterMode::Sliding => "sliding",
            JitterMode::Detection => "detection",
            JitterMode::None => "none",
        };
        write!(f, "{}", name)
    }
}

impl JitterMode {
    /// Largest shift, in bases, allowed for `region`.
    pub fn shift_bound(&self, region: &Region, window_len: u32, output_seq_len: u32) -> i64 {
        match self {
            JitterMode::Sliding => {
                let interval_len = region.width() as i64;
                (interval_len / 2).max((window_len as i64 - interval_len) / 2)
            }
            JitterMode::Detection => output_seq_len as i64 / 2,
            JitterMode::None => 0,
        }
    }

    /// Jittered midpoint of `region` in half-base units (`2 * midpoint`).
    pub fn jittered_mid_x2<R: Rng + ?Sized>(
        &self,
        region: &Region,
        window_len: u32,
        output_seq_len: u32,
        rng: &mut R,
    ) -> i64 {
        let bound = self.shift_bound(region, window_len, output_seq_len);
        let shift = if bound > 0 {
            rng.random_range(-bound..=bound)
        } else {
            0
        };
        region.mid_point_x2() + 2 * shift
    }
}

///
/// Half-open window of `len` bases centered on a midpoint given in half-base units.
///
/// The start is truncated toward zero when the midpoint ends in .5.
///
#[inline]
pub fn centered_window(mid_x2: i64, len: u32) -> (i64, i64) {
    let start = (mid_x2 - len as i64) / 2;
    (start, start + len as i64)
}
