use chrono::Duration;

use crate::db_types::{RecordKind, RecordRef};

/// Engine-level behavior toggles and the callback-URL base.
///
/// Everything the engine needs from its environment is passed in here explicitly at construction; there is no global
/// lookup for the current host or for feature flags.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Scheme + host (+ optional path prefix) under which this gateway's callback routes are reachable,
    /// e.g. `https://pay.example.com`. No trailing slash.
    pub base_url: String,
    /// When false, creation calls omit the IPN notification URL and state is driven by returns and polling only.
    pub use_ipn: bool,
    /// When true, every inbound IPN delivery is archived as an [`crate::db_types::IpnLog`] row.
    pub ipn_log_enabled: bool,
    /// When true, record creation and browser returns enqueue a delayed poll-based re-check.
    pub use_delayed_updates: bool,
    pub delayed_update_delay: Duration,
    /// Number of decimal places the processor expects for amounts in this deployment's currencies.
    pub decimal_places: u32,
    /// Largest supported amount width, whole and fractional digits combined.
    pub max_digits: u32,
    pub default_currency: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8370".to_string(),
            use_ipn: true,
            ipn_log_enabled: false,
            use_delayed_updates: false,
            delayed_update_delay: Duration::minutes(60),
            decimal_places: 2,
            max_digits: 10,
            default_currency: "USD".to_string(),
        }
    }
}

impl GatewaySettings {
    pub fn return_url(&self, record: RecordRef, token: &str) -> String {
        match record.kind {
            RecordKind::Payment => format!("{}/payments/{}/return/{}", self.base_url, record.id, token),
            RecordKind::Preapproval => format!("{}/preapprovals/{}/return/{}", self.base_url, record.id, token),
        }
    }

    pub fn cancel_url(&self, record: RecordRef, token: &str) -> String {
        match record.kind {
            RecordKind::Payment => format!("{}/payments/{}/cancel/{}", self.base_url, record.id, token),
            // The preapproval cancel view does not authenticate; it only acknowledges.
            RecordKind::Preapproval => format!("{}/preapprovals/{}/cancel", self.base_url, record.id),
        }
    }

    /// The IPN delivery URL is shared between record kinds; the notification body says which kind it is about.
    pub fn ipn_url(&self, record: RecordRef, token: &str) -> String {
        format!("{}/ipn/{}/{}", self.base_url, record.id, token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn callback_urls_thread_the_base_url() {
        let settings = GatewaySettings { base_url: "https://pay.example.com".into(), ..Default::default() };
        assert_eq!(
            settings.return_url(RecordRef::payment(42), "tok"),
            "https://pay.example.com/payments/42/return/tok"
        );
        assert_eq!(settings.cancel_url(RecordRef::preapproval(7), "tok"), "https://pay.example.com/preapprovals/7/cancel");
        assert_eq!(settings.ipn_url(RecordRef::payment(42), "tok"), "https://pay.example.com/ipn/42/tok");
    }
}
