use std::path::PathBuf;

use litter_core::LitterError;
use rand::Rng;

pub const DEFAULT_DATA_FILENAME: &str = "distribution.json";
pub const DEFAULT_OCCUPANCY: f64 = 0.95;
pub const DEFAULT_MULTIPLIER: u64 = 20;

pub struct LittererConfig {
    pub data_path: PathBuf,
    pub log_path: Option<PathBuf>,
    pub seed: u64,
    pub occupancy: f64,
    pub shuffle: bool,
    pub sort: bool,
    pub sleep_secs: u64,
    pub multiplier: u64,
}

impl LittererConfig {
    pub fn from_env() -> Result<Self, LitterError> {
        let data_path = std::env::var_os("LITTER_DATA_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILENAME));
        let log_path = std::env::var_os("LITTER_LOG_FILENAME").map(PathBuf::from);

        let seed = match std::env::var("LITTER_SEED") {
            Ok(v) => v
                .parse()
                .map_err(|_| LitterError::Configuration(format!("invalid LITTER_SEED: {v}")))?,
            Err(_) => rand::thread_rng().r#gen(),
        };

        let occupancy = match std::env::var("LITTER_OCCUPANCY") {
            Ok(v) => v.parse().map_err(|_| {
                LitterError::Configuration(format!("invalid LITTER_OCCUPANCY: {v}"))
            })?,
            Err(_) => DEFAULT_OCCUPANCY,
        };
        validate_occupancy(occupancy)?;

        let shuffle = env_flag("LITTER_SHUFFLE", true)?;
        let sort = env_flag("LITTER_SORT", false)?;
        validate_shuffle_sort(shuffle, sort)?;

        let sleep_secs = env_u64("LITTER_SLEEP", 0)?;
        let multiplier = env_u64("LITTER_MULTIPLIER", DEFAULT_MULTIPLIER)?;

        Ok(Self {
            data_path,
            log_path,
            seed,
            occupancy,
            shuffle,
            sort,
            sleep_secs,
            multiplier,
        })
    }
}

fn validate_occupancy(occupancy: f64) -> Result<(), LitterError> {
    if !(0.0..=1.0).contains(&occupancy) {
        return Err(LitterError::Configuration(
            "occupancy must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_shuffle_sort(shuffle: bool, sort: bool) -> Result<(), LitterError> {
    if shuffle && sort {
        return Err(LitterError::Configuration(
            "select either shuffle or sort, not both".to_string(),
        ));
    }
    Ok(())
}

fn env_flag(name: &str, default: bool) -> Result<bool, LitterError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| LitterError::Configuration(format!("invalid {name}: {v}"))),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64, LitterError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| LitterError::Configuration(format!("invalid {name}: {v}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_out_of_range_is_rejected() {
        assert!(validate_occupancy(-0.1).is_err());
        assert!(validate_occupancy(1.1).is_err());
        assert!(validate_occupancy(0.0).is_ok());
        assert!(validate_occupancy(1.0).is_ok());
    }

    #[test]
    fn s5_shuffle_and_sort_together_is_a_configuration_error() {
        assert!(validate_shuffle_sort(true, true).is_err());
        assert!(validate_shuffle_sort(true, false).is_ok());
        assert!(validate_shuffle_sort(false, true).is_ok());
        assert!(validate_shuffle_sort(false, false).is_ok());
    }
}
