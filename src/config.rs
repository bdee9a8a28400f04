//! Registry configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment
//! variables (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

use chrono::Duration;

/// Top-level registry configuration.
///
/// Loaded once at startup via [`RegistryConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Days after a transfer request until it self-approves.
    pub automatic_transfer_days: i64,

    /// Registration years added to the domain when a transfer completes.
    pub transfer_extension_years: u32,

    /// Transfer fee charged to the gaining registrar, in cents.
    pub transfer_fee_cents: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

/// Transfer timing and billing policy consumed by the lifecycle engine.
#[derive(Debug, Clone)]
pub struct TransferPolicy {
    /// Grace period after which a pending transfer self-approves.
    pub automatic_transfer_length: Duration,
    /// Registration years added on approval.
    pub extension_years: u32,
    /// Fee charged to the gaining registrar, in cents.
    pub fee_cents: u64,
}

impl RegistryConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let automatic_transfer_days = parse_env("AUTOMATIC_TRANSFER_DAYS", 5);
        let transfer_extension_years = parse_env("TRANSFER_EXTENSION_YEARS", 1);
        let transfer_fee_cents = parse_env("TRANSFER_FEE_CENTS", 1_100);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 10_000);

        Ok(Self {
            listen_addr,
            automatic_transfer_days,
            transfer_extension_years,
            transfer_fee_cents,
            event_bus_capacity,
        })
    }

    /// Projects the transfer policy consumed by the lifecycle engine.
    #[must_use]
    pub fn transfer_policy(&self) -> TransferPolicy {
        TransferPolicy {
            automatic_transfer_length: Duration::days(self.automatic_transfer_days),
            extension_years: self.transfer_extension_years,
            fee_cents: self.transfer_fee_cents,
        }
    }
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            automatic_transfer_length: Duration::days(5),
            extension_years: 1,
            fee_cents: 1_100,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
