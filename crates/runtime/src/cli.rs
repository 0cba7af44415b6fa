use anyhow::{Context, Result};
use clap::Parser;
use ensemble::EnsembleConfig;
use std::path::PathBuf;

/// Trains a probabilistic ensemble on synthetic data and reports its elites.
#[derive(Parser, Debug)]
#[command(name = "ensemble_main", version)]
pub struct Args {
    #[arg(long, default_value_t = 5)]
    pub network_size: usize,
    #[arg(long, default_value_t = 3)]
    pub elite_size: usize,
    #[arg(long, default_value_t = 779)]
    pub state_size: usize,
    #[arg(long, default_value_t = 5)]
    pub action_size: usize,
    #[arg(long, default_value_t = 5)]
    pub reward_size: usize,
    #[arg(long, default_value_t = 50)]
    pub hidden_size: usize,
    /// Total training rows drawn from the synthetic provider.
    #[arg(long, default_value_t = 1000)]
    pub samples: usize,
    /// Rows handed to each `train` call.
    #[arg(long, default_value_t = 100)]
    pub chunk: usize,
    #[arg(long, default_value_t = ensemble::DEFAULT_TRAIN_BATCH_SIZE)]
    pub batch_size: usize,
    /// Held-out rows to predict after training.
    #[arg(long, default_value_t = 100)]
    pub predict_rows: usize,
    #[arg(long)]
    pub seed: Option<u64>,
    /// JSON `EnsembleConfig`; replaces the sizing flags above.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn ensemble_config(&self) -> Result<EnsembleConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => EnsembleConfig::new(self.network_size, self.elite_size, self.state_size, self.action_size)
                .with_reward_size(self.reward_size)
                .with_hidden_size(self.hidden_size),
        };
        if let Some(seed) = self.seed {
            cfg = cfg.with_seed(seed);
        }
        cfg.validate().context("invalid ensemble configuration")?;
        Ok(cfg)
    }
}
