//! Structured expansion plan: which axes to grow, by how much, where, and with what value.

use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use log::info;
use serde::Deserialize;

use crate::dtype::{PixelType, StorageKind};
use crate::error::{ExtentError, Result};

/// Largest line count accepted per axis; GDAL sizes are C ints.
pub const MAX_LINES: usize = i32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Rows,
    Columns,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => write!(f, "rows"),
            Axis::Columns => write!(f, "columns"),
        }
    }
}

/// Side of an axis: north/west is `Start`, south/east is `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    /// Compass direction for log output.
    pub fn direction(&self, axis: Axis) -> &'static str {
        match (axis, self) {
            (Axis::Rows, Edge::Start) => "north",
            (Axis::Rows, Edge::End) => "south",
            (Axis::Columns, Edge::Start) => "west",
            (Axis::Columns, Edge::End) => "east",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Start => write!(f, "start"),
            Edge::End => write!(f, "end"),
        }
    }
}

/// Per-axis entry of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisRequest {
    pub count: usize,
    pub edge: Edge,
    pub fill: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionRequest {
    pub axis: Axis,
    pub count: usize,
    pub edge: Edge,
    pub fill: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpansionPlan {
    #[serde(default)]
    pub rows: Option<AxisRequest>,
    #[serde(default)]
    pub columns: Option<AxisRequest>,
}

impl ExpansionPlan {
    /// Read a JSON plan such as `{"rows": {"count": 2, "edge": "end", "fill": -128}}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let plan: Self = serde_json::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reject counts no raster could grow by.
    pub fn validate(&self) -> Result<()> {
        for req in self.requests() {
            if req.count > MAX_LINES {
                return Err(ExtentError::CountTooLarge {
                    axis: req.axis,
                    count: req.count,
                    max: MAX_LINES,
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_none() && self.columns.is_none()
    }

    /// Requests in application order: rows first, then columns.
    pub fn requests(&self) -> Vec<ExpansionRequest> {
        [(Axis::Rows, self.rows), (Axis::Columns, self.columns)]
            .into_iter()
            .filter_map(|(axis, req)| {
                req.map(|r| ExpansionRequest {
                    axis,
                    count: r.count,
                    edge: r.edge,
                    fill: r.fill,
                })
            })
            .collect()
    }

    /// Requested line count for an axis, zero when the axis is absent.
    pub fn count(&self, axis: Axis) -> usize {
        let req = match axis {
            Axis::Rows => self.rows,
            Axis::Columns => self.columns,
        };
        req.map_or(0, |r| r.count)
    }

    /// Signed kind the grid must be widened to before expanding, `None` when
    /// every fill already fits `ty`. Zero-count requests insert nothing and are
    /// ignored.
    pub fn storage_for(&self, ty: PixelType) -> Result<Option<StorageKind>> {
        let mut target = None;
        for req in self.requests() {
            if req.count == 0 || ty.can_hold(req.fill) {
                continue;
            }
            let kind = StorageKind::widening(ty, req.axis, req.fill)?;
            target = target.max(Some(kind));
        }
        Ok(target)
    }

    pub fn log_summary(&self) {
        for req in self.requests() {
            info!(
                "Adding {} {} to {} ({}) with value {}",
                req.count,
                req.axis,
                req.edge,
                req.edge.direction(req.axis),
                req.fill
            );
        }
    }
}
