//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use dojo_pool::tournament::models::{
    BracketGenerationOptions, DEFAULT_ADVANCE_PER_GROUP, DEFAULT_GROUP_SIZE, DEFAULT_MAX_PLAYERS,
    DEFAULT_MINUTES_PER_MATCH,
};
use std::net::{Ipv4Addr, SocketAddr};

/// Largest field a single tournament may be configured for
pub const MAX_PLAYERS_LIMIT: usize = 1024;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are not exported when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Tournament defaults configuration
    pub tournament_defaults: TournamentDefaultsConfig,
}

/// Defaults applied to tournaments and bracket generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentDefaultsConfig {
    /// Players per group in group knockout tournaments
    pub group_size: usize,
    /// Finishers per group entering the knockout
    pub advance_per_group: usize,
    /// Expected table time per match, used for estimates
    pub minutes_per_match: u32,
    /// Maximum players per tournament, also the cap for client requests
    pub max_players: usize,
}

impl Default for TournamentDefaultsConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            advance_per_group: DEFAULT_ADVANCE_PER_GROUP,
            minutes_per_match: DEFAULT_MINUTES_PER_MATCH,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

impl TournamentDefaultsConfig {
    /// Generation options with the configured group settings
    pub fn bracket_options(&self) -> BracketGenerationOptions {
        BracketGenerationOptions::default().with_groups(self.group_size, self.advance_per_group)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr_env("SERVER_BIND")?
                .unwrap_or(SocketAddr::from((Ipv4Addr::LOCALHOST, 6969))),
        };

        // Metrics exporter, opt-in
        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_addr_env("METRICS_BIND")?,
        };

        let defaults = TournamentDefaultsConfig::default();
        let tournament_defaults = TournamentDefaultsConfig {
            group_size: parse_env_or("DEFAULT_GROUP_SIZE", defaults.group_size),
            advance_per_group: parse_env_or("DEFAULT_ADVANCE_PER_GROUP", defaults.advance_per_group),
            minutes_per_match: parse_env_or("DEFAULT_MINUTES_PER_MATCH", defaults.minutes_per_match),
            max_players: parse_env_or("MAX_PLAYERS_PER_TOURNAMENT", defaults.max_players),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            tournament_defaults,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.tournament_defaults;

        if defaults.group_size < 2 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_GROUP_SIZE".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if defaults.advance_per_group == 0 || defaults.advance_per_group > defaults.group_size {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_ADVANCE_PER_GROUP".to_string(),
                reason: format!("Must be between 1 and group size ({})", defaults.group_size),
            });
        }

        if defaults.minutes_per_match == 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_MINUTES_PER_MATCH".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if defaults.max_players < 2 || defaults.max_players > MAX_PLAYERS_LIMIT {
            return Err(ConfigError::Invalid {
                var: "MAX_PLAYERS_PER_TOURNAMENT".to_string(),
                reason: format!("Must be between 2 and {MAX_PLAYERS_LIMIT}"),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional socket address, rejecting values that do not parse
fn parse_addr_env(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not an IP:PORT address"),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
