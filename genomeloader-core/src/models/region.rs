use std::fmt::{self, Display};

///
/// Region struct, one row of a BED or bedGraph file
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,

    pub rest: Option<String>,
}

impl Region {
    pub fn new(chr: &str, start: u32, end: u32) -> Self {
        Region {
            chr: chr.to_string(),
            start,
            end,
            rest: None,
        }
    }

    ///
    /// Get length of the region
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    ///
    /// Numeric value stored in the first extra column, if any.
    ///
    /// bedGraph rows carry their signal here; plain BED rows usually carry
    /// a name, in which case this is `None`.
    ///
    pub fn value(&self) -> Option<f32> {
        self.rest
            .as_deref()
            .and_then(|rest| rest.split('\t').next())
            .and_then(|v| v.trim().parse::<f32>().ok())
    }

    ///
    /// Get file string of Region
    ///
    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}{}",
            self.chr,
            self.start,
            self.end,
            self.rest
                .as_deref()
                .map_or(String::new(), |s| format!("\t{}", s)),
        )
    }

    /// Midpoint doubled, `start + end`. Kept in half-base units so odd-width
    /// regions do not lose the trailing .5 before jitter is applied.
    pub fn mid_point_x2(&self) -> i64 {
        self.start as i64 + self.end as i64
    }

    /// Check if this region overlaps the half-open range `[start, end)` on `chr`.
    #[inline]
    pub fn overlaps(&self, chr: &str, start: u32, end: u32) -> bool {
        self.chr == chr && self.start < end && self.end > start
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
