//! # Cutout - Main Entry Point
//!
//! Strips the background from a portrait photo using the on-device
//! inference engine.

use clap::Parser;
use cutout_cli::CutoutCliOptions;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let options = CutoutCliOptions::parse();
    options.logging.init_logging();

    if let Err(e) = options.run().await {
        error!("{e}");
        eprintln!("cutout: {}", e.user_message());
        process::exit(1);
    }
}
