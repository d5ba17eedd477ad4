use anyhow::Result;
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::RegionSetError;
use crate::models::Region;
use crate::utils::get_dynamic_reader;

///
/// RegionSet struct, the representation of an interval file (BED or bedGraph)
/// and of any ordered interval table derived from one.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub header: Option<String>,
    pub path: Option<PathBuf>,
}

pub struct RegionSetIterator<'a> {
    region_set: &'a RegionSet,
    index: usize,
}

fn parse_coordinate(field: Option<&str>, line: &str) -> Result<u32> {
    field
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| RegionSetError::RegionParseError(line.to_string()).into())
}

impl TryFrom<&Path> for RegionSet {
    type Error = anyhow::Error;

    ///
    /// Create a new [RegionSet] from a bed or bedGraph file.
    ///
    /// # Arguments:
    /// - value: path to the file on disk, optionally gzipped.
    fn try_from(value: &Path) -> Result<Self> {
        let path = value;

        if !path.is_file() {
            return Err(RegionSetError::FileReadError(path.display().to_string()).into());
        }
        let reader = get_dynamic_reader(path)?;

        let mut new_regions: Vec<Region> = Vec::new();
        let mut header: String = String::new();
        let mut first_line: bool = true;

        for line in reader.lines() {
            let string_line = line?;
            if string_line.trim().is_empty() {
                continue;
            }

            if string_line.starts_with("browser")
                | string_line.starts_with("track")
                | string_line.starts_with('#')
            {
                header.push_str(&string_line);
                first_line = false;
                continue;
            }

            let parts: Vec<&str> = string_line.split('\t').collect();

            // column headers like `chr start end` without a leading #
            if first_line {
                first_line = false;
                if parts.len() >= 3 && parts[1].parse::<u32>().is_err() {
                    header.push_str(&string_line);
                    continue;
                }
            }

            let start = parse_coordinate(parts.get(1).copied(), &string_line)?;
            let end = parse_coordinate(parts.get(2).copied(), &string_line)?;
            if end <= start {
                return Err(RegionSetError::RegionParseError(string_line).into());
            }

            new_regions.push(Region {
                chr: parts[0].to_owned(),
                start,
                end,
                rest: Some(parts[3..].join("\t")).filter(|s| !s.is_empty()),
            });
        }

        if new_regions.is_empty() {
            return Err(RegionSetError::EmptyRegionSet(path.display().to_string()).into());
        }

        let mut rs = RegionSet {
            regions: new_regions,
            header: match header.is_empty() {
                true => None,
                false => Some(header),
            },
            path: Some(value.to_owned()),
        };
        rs.sort();

        Ok(rs)
    }
}

impl TryFrom<&str> for RegionSet {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        RegionSet::try_from(Path::new(value))
    }
}

impl TryFrom<PathBuf> for RegionSet {
    type Error = anyhow::Error;

    fn try_from(value: PathBuf) -> Result<Self> {
        RegionSet::try_from(value.as_path())
    }
}

impl From<Vec<Region>> for RegionSet {
    fn from(regions: Vec<Region>) -> Self {
        RegionSet {
            regions,
            header: None,
            path: None,
        }
    }
}

impl FromIterator<Region> for RegionSet {
    fn from_iter<T: IntoIterator<Item = Region>>(iter: T) -> Self {
        RegionSet::from(iter.into_iter().collect::<Vec<Region>>())
    }
}

impl<'a> Iterator for RegionSetIterator<'a> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let region = self.region_set.regions.get(self.index)?;
        self.index += 1;
        Some(region)
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = RegionSetIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        RegionSetIterator {
            region_set: self,
            index: 0,
        }
    }
}

impl RegionSet {
    pub fn iter(&self) -> RegionSetIterator<'_> {
        self.into_iter()
    }

    ///
    /// Sort by chromosome then start. Original order is overwritten.
    ///
    pub fn sort(&mut self) {
        self.regions.sort_by(|a, b| {
            a.chr
                .cmp(&b.chr)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.end.cmp(&b.end))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    ///
    /// Rows `[start, end)` of the table, clipped to its length.
    ///
    pub fn slice(&self, start: usize, end: usize) -> &[Region] {
        let end = end.min(self.regions.len());
        let start = start.min(end);
        &self.regions[start..end]
    }
}

impl Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionSet with {} regions.", self.len())
    }
}
