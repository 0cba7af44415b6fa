#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use ensemble::{DataProvider, EnsembleModel, SyntheticProvider, DEFAULT_PREDICT_BATCH_SIZE};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = cli::Args::parse();
    let cfg = args.ensemble_config()?;
    let seed = cfg.seed.unwrap_or(0);

    tracing::info!("Initializing ensemble...");
    let mut model = EnsembleModel::new(cfg.clone()).context("building ensemble")?;

    let mut provider = SyntheticProvider::new(args.samples, cfg.input_dim(), cfg.output_dim(), 0.05, seed);
    let train = provider.provide().context("generating training data")?;
    let chunk = args.chunk.max(1);

    tracing::info!(
        "Training on {} rows in chunks of {} (batch size {})...",
        train.len(),
        chunk,
        args.batch_size
    );
    for (i, start) in (0..train.len()).step_by(chunk).enumerate() {
        let part = train.slice(start, start + chunk)?;
        model
            .train(&part.inputs, &part.labels, args.batch_size)
            .with_context(|| format!("training chunk {i}"))?;
        tracing::info!("Chunk {} done. Elites: {:?}", i + 1, model.elite_indices());
    }

    let test = provider.held_out(args.predict_rows).context("generating held-out data")?;
    let prediction = model.predict(&test.inputs, DEFAULT_PREDICT_BATCH_SIZE)?;
    tracing::info!("Prediction shape: {:?}", prediction.mean.shape);

    if model.elite_indices().is_empty() {
        tracing::warn!("No training data was seen; skipping elite statistics.");
        return Ok(());
    }
    let (mu, var) = prediction.select(model.elite_indices())?.mixture()?;
    let n = mu.len().max(1) as f32;
    let mse = mu.data.iter().zip(&test.labels.data).map(|(m, y)| (m - y) * (m - y)).sum::<f32>() / n;
    let mean_var = var.data.iter().sum::<f32>() / n;
    tracing::info!(
        "Elites {:?}: held-out MSE {:.5}, mean predictive variance {:.5}",
        model.elite_indices(),
        mse,
        mean_var
    );
    Ok(())
}
