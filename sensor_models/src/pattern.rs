//! Receive antenna radiation pattern: a 360-sample azimuth → gain (dB) table.
//!
//! # File format
//! One decimal gain value per line, one line per degree of azimuth. Blank
//! lines are ignored; anything else that does not parse as a float is an
//! error. The stored data is measured with boresight at sample 90, so every
//! loaded table is rotated by [`BORESIGHT_SHIFT`] before use so that index 0
//! is the antenna boresight.

use crate::error::{Result, SensorError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Number of gain samples in a pattern (one per degree).
pub const PATTERN_LEN: usize = 360;

/// Rotation applied at load time to align stored data with boresight.
pub const BORESIGHT_SHIFT: usize = 90;

const BUNDLED_PATTERN: &str = include_str!("../data/yagi_5ghz.csv");

/// Immutable, boresight-aligned directional gain table.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiationPattern {
    gains: Arc<[f64]>,
}

impl RadiationPattern {
    /// Read and align a pattern from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SensorError::PatternIo {
            path: path.to_path_buf(),
            source,
        })?;
        let pattern = Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            SensorError::PatternIo { source, .. } => SensorError::PatternIo {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded radiation pattern");
        Ok(pattern)
    }

    /// Read and align a pattern from any line-oriented source.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut gains = Vec::with_capacity(PATTERN_LEN);
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| SensorError::PatternIo {
                path: Default::default(),
                source,
            })?;
            if let Some(gain) = parse_row(idx + 1, &line)? {
                gains.push(gain);
            }
        }
        Self::from_raw(gains)
    }

    /// Parse and align a pattern held in memory.
    pub fn parse(text: &str) -> Result<Self> {
        let mut gains = Vec::with_capacity(PATTERN_LEN);
        for (idx, line) in text.lines().enumerate() {
            if let Some(gain) = parse_row(idx + 1, line)? {
                gains.push(gain);
            }
        }
        Self::from_raw(gains)
    }

    /// Pattern shipped with the crate (5.7 GHz directional panel).
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_PATTERN)
    }

    /// Build from raw stored samples, applying the boresight rotation.
    pub fn from_raw(raw: Vec<f64>) -> Result<Self> {
        Ok(Self::from_aligned(raw)?.shift_by(BORESIGHT_SHIFT))
    }

    /// Build from samples that are already boresight-aligned.
    pub fn from_aligned(gains: Vec<f64>) -> Result<Self> {
        if gains.len() != PATTERN_LEN {
            return Err(SensorError::PatternSize {
                expected: PATTERN_LEN,
                actual: gains.len(),
            });
        }
        Ok(Self {
            gains: gains.into(),
        })
    }

    /// Circular rotation: `result[i] = self[(i + n) mod len]`.
    pub fn shift_by(&self, n: usize) -> Self {
        let len = self.gains.len();
        let gains: Vec<f64> = (0..len).map(|i| self.gains[(i + n) % len]).collect();
        Self {
            gains: gains.into(),
        }
    }

    /// Gain (dB) towards azimuth `theta` (radians).
    ///
    /// The degree index is truncated toward zero, then wrapped into the table.
    pub fn gain(&self, theta: f64) -> f64 {
        let len = self.gains.len() as i64;
        let idx = ((theta * 180.0 / std::f64::consts::PI) as i64).rem_euclid(len);
        self.gains[idx as usize]
    }

    pub fn gains(&self) -> &[f64] {
        &self.gains
    }
}

fn parse_row(line_no: usize, line: &str) -> Result<Option<f64>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| SensorError::MalformedPattern {
            line: line_no,
            content: trimmed.to_string(),
        })
}
