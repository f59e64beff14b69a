use std::env;

use adaptive_payment_engine::settings::GatewaySettings;
use adaptive_tools::AdaptiveConfig;
use apg_common::helpers::parse_boolean_flag;
use chrono::Duration;
use log::*;

const DEFAULT_APG_HOST: &str = "127.0.0.1";
const DEFAULT_APG_PORT: u16 = 8370;
const DEFAULT_DELAYED_UPDATE_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Engine behavior toggles and the callback-URL base, passed into the reconciliation API at construction.
    pub gateway: GatewaySettings,
    /// Processor endpoints and credentials.
    pub processor: AdaptiveConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_APG_HOST.to_string(),
            port: DEFAULT_APG_PORT,
            gateway: GatewaySettings::default(),
            processor: AdaptiveConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("APG_HOST").ok().unwrap_or_else(|| DEFAULT_APG_HOST.into());
        let port = env::var("APG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for APG_PORT. {e} Using the default, {DEFAULT_APG_PORT}, instead."
                    );
                    DEFAULT_APG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_APG_PORT);
        let gateway = gateway_settings_from_env(&host, port);
        let processor = AdaptiveConfig::new_from_env_or_default();
        Self { host, port, gateway, processor }
    }
}

fn gateway_settings_from_env(host: &str, port: u16) -> GatewaySettings {
    let defaults = GatewaySettings::default();
    let base_url = env::var("APG_BASE_URL").ok().unwrap_or_else(|| {
        warn!("🪛️ APG_BASE_URL is not set. Callback URLs will point at http://{host}:{port}, which the processor \
               can only reach in local testing.");
        format!("http://{host}:{port}")
    });
    let use_ipn = parse_boolean_flag(env::var("APG_USE_IPN").ok(), defaults.use_ipn);
    let ipn_log_enabled = parse_boolean_flag(env::var("APG_IPN_LOG_ENABLED").ok(), defaults.ipn_log_enabled);
    let use_delayed_updates =
        parse_boolean_flag(env::var("APG_USE_DELAYED_UPDATES").ok(), defaults.use_delayed_updates);
    let delayed_update_delay = env::var("APG_DELAYED_UPDATE_MINUTES")
        .ok()
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for APG_DELAYED_UPDATE_MINUTES. {e}"))
                .ok()
        })
        .map(Duration::minutes)
        .unwrap_or_else(|| Duration::minutes(DEFAULT_DELAYED_UPDATE_MINUTES));
    let decimal_places = parse_env_u32("APG_DECIMAL_PLACES", defaults.decimal_places);
    let max_digits = parse_env_u32("APG_MAX_DIGITS", defaults.max_digits);
    let default_currency = env::var("APG_DEFAULT_CURRENCY").ok().unwrap_or(defaults.default_currency);
    GatewaySettings {
        base_url,
        use_ipn,
        ipn_log_enabled,
        use_delayed_updates,
        delayed_update_delay,
        decimal_places,
        max_digits,
        default_currency,
    }
}

fn parse_env_u32(var: &str, default: u32) -> u32 {
    env::var(var)
        .ok()
        .and_then(|s| {
            s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}")).ok()
        })
        .unwrap_or(default)
}
