//! Location track files.
//!
//! A track is a CSV file with a `latitude,longitude` header and one row
//! per location fix, in the order the alarm will request them. The first
//! row is the fix taken when the alarm is scheduled. A row with both
//! fields empty stands for a failed fix. Lines starting with `#` are
//! ignored.

use std::fs::File;
use std::io;
use std::path::Path;

use alarmageddon::geo::Coordinates;
use alarmageddon::platform::sim::LocationFix;
use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TrackRow {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub fn load(path: &Path) -> Result<Vec<LocationFix>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse(file).with_context(|| format!("reading {}", path.display()))
}

pub fn parse<R: io::Read>(reader: R) -> Result<Vec<LocationFix>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut fixes = Vec::new();
    for (index, row) in csv.deserialize::<TrackRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.with_context(|| format!("line {line}"))?;

        let fix = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => {
                let at = Coordinates::new(latitude, longitude);
                if !at.is_valid() {
                    bail!("line {line}: ({latitude}, {longitude}) is not a valid position");
                }
                LocationFix::At(at)
            }
            (None, None) => LocationFix::Unavailable,
            _ => bail!("line {line}: latitude and longitude must both be set or both be empty"),
        };
        fixes.push(fix);
    }

    if fixes.is_empty() {
        bail!("track has no fixes");
    }

    Ok(fixes)
}
