//! Look-ahead simulator
//!
//! Runs a synthetic capture stream through the look-ahead queue the way an
//! encoder front-end would and prints a JSON summary.
//!
//! Usage: `lookahead-sim [config.json]`

mod capture;
mod config;
mod encode;

use anyhow::{anyhow, Result};
use config::SimConfig;
use lookahead_queue::LookaheadQueue;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!("Loading simulation config from {:?}", path);
            SimConfig::load(&path)?
        }
        None => SimConfig::default(),
    };
    config.validate()?;

    info!(
        frames = config.frames,
        depth = config.queue.effective_depth(),
        width = config.initial.width,
        height = config.initial.height,
        timebase = %config.timebase,
        "Look-ahead simulator starting"
    );

    let queue = LookaheadQueue::with_config(config.initial, config.queue.clone())?;
    let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity);
    let producer = capture::spawn(config.clone(), tx);

    let encoder = encode::run(queue, rx)?;
    let captured = producer
        .join()
        .map_err(|_| anyhow!("capture thread panicked"))??;
    let summary = encoder.summary();

    if let Some(cut) = encoder
        .reports()
        .iter()
        .filter_map(|r| r.temporal_delta.map(|d| (r.display_index, d.abs())))
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        info!(display_index = cut.0, delta = cut.1, "Largest temporal luma change");
    }

    info!(
        captured,
        encoded = summary.encoded,
        non_reference = summary.non_reference,
        reallocated = summary.stats.reallocated,
        reshaped = summary.stats.reshaped,
        "Simulation finished"
    );
    if !summary.in_display_order {
        return Err(anyhow!("frames were committed out of display order"));
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
