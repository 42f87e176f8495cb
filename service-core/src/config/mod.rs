//! Process configuration shared by every statement service: an optional
//! `configuration` file, overridden by `APP__`-prefixed environment
//! variables.

use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// HTTP listen port. Tests pass 0 to let the OS pick a free one.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Read `.env` first so local runs can keep their overrides there, then
    /// layer the `configuration` file (when present) under the environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let settings = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
