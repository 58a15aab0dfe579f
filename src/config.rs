use serde::Deserialize;

/// Runtime configuration, sourced from the environment with sane defaults
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_address: String,
    pub admin_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let source = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("admin_email", "admin@viewpay.local")?
            .add_source(config::Environment::default())
            .build()?;
        source.try_deserialize()
    }
}
