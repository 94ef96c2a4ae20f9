use std::env;

use anyhow::Context;

use crate::domain::ConvergencePolicy;

#[derive(Debug)]
pub struct Settings {
    /// HTTP server port.
    pub http_port: u16,
    /// Convergence threshold on the maximum per-centroid displacement.
    pub epsilon: f64,
    /// Iteration cap guaranteeing termination even under oscillation.
    pub max_iterations: u32,
    /// Upper bound accepted for generated dataset sizes.
    pub max_dataset_size: usize,
    /// Fixed RNG seed for reproducible sessions; unset means OS entropy.
    pub rng_seed: Option<u64>,
}

impl Settings {
    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_port(self.http_port)?;
        validate_epsilon(self.epsilon)?;
        validate_max_iterations(self.max_iterations)?;
        validate_max_dataset_size(self.max_dataset_size)?;
        Ok(())
    }

    #[must_use]
    pub fn convergence_policy(&self) -> ConvergencePolicy {
        ConvergencePolicy {
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
        }
    }
}

fn validate_port(port: u16) -> anyhow::Result<()> {
    if port == 0 {
        anyhow::bail!("Port cannot be 0");
    }
    Ok(())
}

fn validate_epsilon(epsilon: f64) -> anyhow::Result<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        anyhow::bail!("Epsilon must be a finite positive number");
    }
    Ok(())
}

fn validate_max_iterations(max_iterations: u32) -> anyhow::Result<()> {
    if max_iterations == 0 {
        anyhow::bail!("Iteration cap must be at least 1");
    }
    Ok(())
}

fn validate_max_dataset_size(max_dataset_size: usize) -> anyhow::Result<()> {
    if max_dataset_size == 0 {
        anyhow::bail!("Maximum dataset size must be at least 1");
    }
    Ok(())
}

/// Read a value from an environment variable, falling back to a default.
fn env_or<T: std::str::FromStr>(env_name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(env_name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {env_name}: {raw}")),
        Err(_) => Ok(default),
    }
}

pub fn get_configuration() -> anyhow::Result<Settings> {
    let http_port = env_or("HTTP_PORT", 3000)?;
    let epsilon = env_or("APP_EPSILON", 1e-6)?;
    let max_iterations = env_or("APP_MAX_ITERATIONS", 100)?;
    let max_dataset_size = env_or("APP_MAX_DATASET_SIZE", 100_000)?;
    let rng_seed = match env::var("APP_RNG_SEED") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .with_context(|| format!("Invalid value for APP_RNG_SEED: {raw}"))?,
        ),
        Err(_) => None,
    };

    let settings = Settings {
        http_port,
        epsilon,
        max_iterations,
        max_dataset_size,
        rng_seed,
    };

    // Validate settings before returning
    settings.validate()?;

    Ok(settings)
}
