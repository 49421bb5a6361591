use config::{Environment, File, FileFormat};

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{AnalysisSettings, Config, IngestSettings, LoggingSettings};

/// Name of the optional configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "tradeclock";

/// Prefix for environment overrides, e.g. `TRADECLOCK__ANALYSIS__METRIC=pcr`.
pub const ENV_PREFIX: &str = "TRADECLOCK";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, `tradeclock.toml`
/// (optional), then `TRADECLOCK__*` environment variables.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"))
        .build()?;

    finish(builder)
}

/// Parses configuration from an in-memory TOML document.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}
