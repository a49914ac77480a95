use clap::Parser;
use env_logger::Env;
use log::{error, info};

use raster_extent::cli::Args;
use raster_extent::{update_extent, ExtentOutcome, Result, WriteOptions};

fn main() {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Raster Extent Expander ===");

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<()> {
    let plan = args.to_plan()?;
    let options = WriteOptions::new(&args.compress, args.tile_size)?;

    match update_extent(&args.input, &args.output, &plan, &options)? {
        ExtentOutcome::NothingToDo => info!("No rows or columns to add. Exiting."),
        ExtentOutcome::Written { before, after } => info!(
            "Expanded {}x{} to {}x{}: {}",
            before.1, before.0, after.1, after.0, args.output
        ),
    }

    info!("=== Done! ===");
    Ok(())
}
