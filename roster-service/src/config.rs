use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::Level;

use roster_core::{Randomizer, SeededRandomizer, ThreadRandomizer};

#[derive(Debug, Clone)]
pub struct Config {
    /// Seed for reproducible reviewer draws.
    /// Unset draws from the thread-local generator.
    pub rng_seed: Option<u64>,
    /// Maximum level emitted by the tracing subscriber.
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rng_seed: None,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let rng_seed = parse_rng_seed(env::var("ROSTER_RNG_SEED").ok())?;
        let log_level = parse_log_level(env::var("ROSTER_LOG_LEVEL").ok())?;

        Ok(Config {
            rng_seed,
            log_level,
        })
    }

    /// The randomness source selected by this configuration.
    pub fn randomizer(&self) -> Arc<dyn Randomizer> {
        match self.rng_seed {
            Some(seed) => Arc::new(SeededRandomizer::new(seed)),
            None => Arc::new(ThreadRandomizer),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse ROSTER_RNG_SEED. Missing or blank means "no seed".
pub fn parse_rng_seed(value: Option<String>) -> Result<Option<u64>> {
    non_blank(value)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .context("ROSTER_RNG_SEED must be a valid number")
        })
        .transpose()
}

/// Parse ROSTER_LOG_LEVEL. Missing or blank means `info`.
pub fn parse_log_level(value: Option<String>) -> Result<Level> {
    match non_blank(value) {
        None => Ok(Level::INFO),
        Some(s) => s
            .trim()
            .parse::<Level>()
            .with_context(|| format!("ROSTER_LOG_LEVEL is not a log level: {}", s)),
    }
}
