use std::{env, path::PathBuf, time::Duration};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = env::var("TRIPLOG_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let poll_interval = match env::var("TRIPLOG_POLL_INTERVAL_MS") {
            Ok(raw) => {
                let millis: u64 = raw.parse().map_err(|err| {
                    AppError::Config(format!("invalid TRIPLOG_POLL_INTERVAL_MS: {err}"))
                })?;
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_millis(3000),
        };

        Ok(Self {
            data_dir,
            poll_interval,
        })
    }
}
