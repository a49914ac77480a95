use clap::Parser;

use crate::error::{ExtentError, Result};
use crate::plan::{Axis, AxisRequest, Edge, ExpansionPlan};

#[derive(Parser, Debug)]
#[command(name = "expand-raster")]
#[command(about = "Pad a single-band raster with rows or columns of a fill value")]
#[command(version)]
pub struct Args {
    /// Input raster path
    #[arg(short, long, value_name = "FILE")]
    pub input: String,

    /// Output GeoTIFF path (overwritten if it exists)
    #[arg(short, long, value_name = "FILE")]
    pub output: String,

    /// Number of rows to add
    #[arg(long, value_name = "N")]
    pub rows: Option<usize>,

    /// Where to add rows: start (north) or end (south)
    #[arg(long, value_enum, default_value_t = Edge::End)]
    pub rows_edge: Edge,

    /// Value of the new rows
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub rows_fill: Option<i64>,

    /// Number of columns to add
    #[arg(long, value_name = "N")]
    pub columns: Option<usize>,

    /// Where to add columns: start (west) or end (east)
    #[arg(long, value_enum, default_value_t = Edge::End)]
    pub columns_edge: Edge,

    /// Value of the new columns
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub columns_fill: Option<i64>,

    /// JSON plan file, instead of the per-axis flags
    #[arg(long, value_name = "FILE", conflicts_with_all = ["rows", "rows_fill", "columns", "columns_fill"])]
    pub plan: Option<String>,

    /// Output compression (LZW, DEFLATE, ZSTD or NONE)
    #[arg(long, value_name = "CODEC", default_value = "LZW")]
    pub compress: String,

    /// Write a tiled GeoTIFF with this block size (multiple of 16)
    #[arg(long, value_name = "PIXELS")]
    pub tile_size: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the expansion plan from the plan file or the per-axis flags.
    pub fn to_plan(&self) -> Result<ExpansionPlan> {
        if let Some(path) = &self.plan {
            return ExpansionPlan::from_json_file(path);
        }
        let plan = ExpansionPlan {
            rows: axis_request(Axis::Rows, self.rows, self.rows_edge, self.rows_fill)?,
            columns: axis_request(Axis::Columns, self.columns, self.columns_edge, self.columns_fill)?,
        };
        plan.validate()?;
        Ok(plan)
    }
}

fn axis_request(
    axis: Axis,
    count: Option<usize>,
    edge: Edge,
    fill: Option<i64>,
) -> Result<Option<AxisRequest>> {
    match (count, fill) {
        (Some(count), Some(fill)) => Ok(Some(AxisRequest { count, edge, fill })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ExtentError::IncompleteRequest(
            axis,
            format!("--{axis} needs --{axis}-fill"),
        )),
        (None, Some(_)) => Err(ExtentError::IncompleteRequest(
            axis,
            format!("--{axis}-fill needs --{axis}"),
        )),
    }
}
