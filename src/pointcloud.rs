//! Point-cloud representation and PCD file reading.
//!
//! The reader handles ASCII PCD v0.7, which is what the scan capture app
//! emits. Binary PCD is rejected rather than misparsed.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// An ordered sequence of n-dimensional points. Never empty for a valid
/// artifact; dimensionality is uniform across points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    points: Vec<Vec<f32>>,
}

impl PointCloud {
    /// Build a cloud from raw rows. Fails on an empty cloud or ragged rows.
    pub fn new(points: Vec<Vec<f32>>) -> Result<Self> {
        let dims = match points.first() {
            Some(first) => first.len(),
            None => bail!("point cloud is empty"),
        };
        if dims == 0 {
            bail!("point cloud has zero-dimensional points");
        }
        if let Some(bad) = points.iter().position(|p| p.len() != dims) {
            bail!("point {} has {} dims, expected {}", bad, points[bad].len(), dims);
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimensionality of each point.
    pub fn dims(&self) -> usize {
        self.points[0].len()
    }

    pub fn points(&self) -> &[Vec<f32>] {
        &self.points
    }
}

/// Read an ASCII PCD file into a [`PointCloud`].
///
/// Only the header fields needed for parsing are interpreted; extra fields
/// (e.g. rgb, intensity) come through as additional point dimensions.
pub fn read_pcd(path: &Path) -> Result<PointCloud> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_pcd(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_pcd(text: &str) -> Result<PointCloud> {
    let mut lines = text.lines();
    let mut declared_points: Option<usize> = None;
    let mut dims: Option<usize> = None;

    // Header runs until the DATA line.
    loop {
        let line = match lines.next() {
            Some(line) => line.trim(),
            None => bail!("missing DATA line in PCD header"),
        };
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let key = tokens.next().unwrap_or_default();
        match key {
            "FIELDS" => dims = Some(tokens.count()),
            "POINTS" => {
                let n: usize = tokens
                    .next()
                    .context("POINTS line has no value")?
                    .parse()
                    .context("POINTS value is not an integer")?;
                declared_points = Some(n);
            }
            "DATA" => {
                let format = tokens.next().unwrap_or_default();
                if format != "ascii" {
                    bail!("unsupported PCD data format: {}", format);
                }
                break;
            }
            // VERSION, SIZE, TYPE, COUNT, WIDTH, HEIGHT, VIEWPOINT
            _ => {}
        }
    }

    let dims = dims.context("missing FIELDS line in PCD header")?;
    let mut points = Vec::with_capacity(declared_points.unwrap_or(0));
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Vec<f32> = line
            .split_whitespace()
            .map(|t| t.parse::<f32>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("bad point row: {:?}", line))?;
        if row.len() != dims {
            bail!("point row has {} values, header declares {}", row.len(), dims);
        }
        points.push(row);
    }

    if let Some(declared) = declared_points {
        if points.len() != declared {
            bail!("found {} points, header declares {}", points.len(), declared);
        }
    }

    PointCloud::new(points)
}
