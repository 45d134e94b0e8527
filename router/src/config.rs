//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};

use cairn_types::{Address, EngineParams, BPS_DENOMINATOR};
use cairn_utils::LogFormat;

use crate::RouterError;

/// Configuration for a Cairn engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Address allowed to call the admin setters.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Address the router acts as when calling collaborators.
    #[serde(default = "default_router_address")]
    pub router_address: String,

    /// The only address allowed to seal and reveal seeds.
    #[serde(default = "default_trusted_seeder")]
    pub trusted_seeder: String,

    /// Expedition module, also allowed to add vesting winnings.
    #[serde(default = "default_expedition_address")]
    pub expedition_address: String,

    /// Epoch length of the reference vesting ledger.
    #[serde(default = "default_vesting_epoch_secs")]
    pub vesting_epoch_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emission, round timing, windows, caps, tax/bonus and draw settings.
    /// Kept last so it serializes as a trailing `[params]` table.
    #[serde(default)]
    pub params: EngineParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_owner() -> String {
    "crn_owner".to_string()
}

fn default_router_address() -> String {
    "crn_router".to_string()
}

fn default_trusted_seeder() -> String {
    "crn_seeder".to_string()
}

fn default_expedition_address() -> String {
    "crn_expedition".to_string()
}

fn default_vesting_epoch_secs() -> u64 {
    7 * 24 * 3600
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, RouterError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RouterError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RouterError> {
        let config: Self = toml::from_str(s).map_err(|e| RouterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RouterError> {
        toml::to_string_pretty(self).map_err(|e| RouterError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber this config asks for.
    pub fn init_logging(&self) -> bool {
        cairn_utils::init_logging(self.log_format, &self.log_level)
    }

    pub fn owner(&self) -> Address {
        Address::new(self.owner.as_str())
    }

    pub fn router_address(&self) -> Address {
        Address::new(self.router_address.as_str())
    }

    pub fn trusted_seeder(&self) -> Address {
        Address::new(self.trusted_seeder.as_str())
    }

    pub fn expedition_address(&self) -> Address {
        Address::new(self.expedition_address.as_str())
    }

    /// Reject parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<(), RouterError> {
        let p = &self.params;
        for address in [
            &self.owner,
            &self.router_address,
            &self.trusted_seeder,
            &self.expedition_address,
        ] {
            if !Address::new(address.as_str()).is_valid() {
                return Err(RouterError::Config(format!("invalid address {address}")));
            }
        }
        if p.round_duration_mult.contains(&0) || p.base_round_duration_secs == 0 {
            return Err(RouterError::Config("round durations must be non-zero".into()));
        }
        if p.seal_window_secs > p.lockout_secs {
            return Err(RouterError::Config(
                "seal window must fit inside the lockout".into(),
            ));
        }
        if p.totem_pot_bps > BPS_DENOMINATOR
            || p.loser_pot_keep_bps > BPS_DENOMINATOR
            || p.draw_bias_bps > BPS_DENOMINATOR
            || p.max_bonus_bps > BPS_DENOMINATOR
            || p.max_deposit_fee_bps > BPS_DENOMINATOR
            || p.max_withdraw_tax_cap_bps > BPS_DENOMINATOR
        {
            return Err(RouterError::Config("basis points above 10000".into()));
        }
        if p.max_win_multiplier_bps < BPS_DENOMINATOR {
            return Err(RouterError::Config(
                "max win multiplier must be at least 1x".into(),
            ));
        }
        if p.default_min_withdraw_tax_bps > p.default_max_withdraw_tax_bps
            || p.default_max_withdraw_tax_bps > p.max_withdraw_tax_cap_bps
        {
            return Err(RouterError::Config("withdraw tax defaults out of range".into()));
        }
        if self.vesting_epoch_secs == 0 {
            return Err(RouterError::Config("vesting epoch must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            router_address: default_router_address(),
            trusted_seeder: default_trusted_seeder(),
            expedition_address: default_expedition_address(),
            vesting_epoch_secs: default_vesting_epoch_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            params: EngineParams::default(),
        }
    }
}
