use apg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const SANDBOX_ENDPOINT: &str = "https://svcs.sandbox.paypal.com/AdaptivePayments";
const LIVE_ENDPOINT: &str = "https://svcs.paypal.com/AdaptivePayments";
const SANDBOX_VERIFICATION_ENDPOINT: &str = "https://ipnpb.sandbox.paypal.com/cgi-bin/webscr";
const LIVE_VERIFICATION_ENDPOINT: &str = "https://ipnpb.paypal.com/cgi-bin/webscr";
const SANDBOX_PAYMENT_HOST: &str = "https://www.sandbox.paypal.com/webscr";
const LIVE_PAYMENT_HOST: &str = "https://www.paypal.com/webscr";

#[derive(Debug, Clone, Default)]
pub struct AdaptiveConfig {
    /// Base URL of the Adaptive Payments JSON API, without a trailing slash.
    pub endpoint: String,
    /// Where notification bodies are re-POSTed for verification.
    pub verification_endpoint: String,
    /// Where the sender's browser is redirected to complete a created payment or preapproval.
    pub payment_host: String,
    pub application_id: String,
    pub user_id: String,
    pub password: Secret<String>,
    pub signature: Secret<String>,
}

impl AdaptiveConfig {
    pub fn new_from_env_or_default() -> Self {
        let sandbox = parse_boolean_flag(std::env::var("APG_PROCESSOR_SANDBOX").ok(), true);
        if sandbox {
            info!("🪛️ Using the processor sandbox endpoints. Set APG_PROCESSOR_SANDBOX=0 for production.");
        }
        let endpoint = std::env::var("APG_PROCESSOR_ENDPOINT")
            .unwrap_or_else(|_| if sandbox { SANDBOX_ENDPOINT } else { LIVE_ENDPOINT }.to_string());
        let verification_endpoint = std::env::var("APG_PROCESSOR_VERIFICATION_ENDPOINT").unwrap_or_else(|_| {
            if sandbox { SANDBOX_VERIFICATION_ENDPOINT } else { LIVE_VERIFICATION_ENDPOINT }.to_string()
        });
        let payment_host = std::env::var("APG_PROCESSOR_PAYMENT_HOST")
            .unwrap_or_else(|_| if sandbox { SANDBOX_PAYMENT_HOST } else { LIVE_PAYMENT_HOST }.to_string());
        let application_id = std::env::var("APG_PROCESSOR_APPLICATION_ID").unwrap_or_else(|_| {
            error!("🪛️ APG_PROCESSOR_APPLICATION_ID is not set. Please set it to your processor application id.");
            String::default()
        });
        let user_id = std::env::var("APG_PROCESSOR_USERID").unwrap_or_else(|_| {
            error!("🪛️ APG_PROCESSOR_USERID is not set. Please set it to your processor API user id.");
            String::default()
        });
        let password = Secret::new(std::env::var("APG_PROCESSOR_PASSWORD").unwrap_or_else(|_| {
            error!("🪛️ APG_PROCESSOR_PASSWORD is not set. Please set it to your processor API password.");
            String::default()
        }));
        let signature = Secret::new(std::env::var("APG_PROCESSOR_SIGNATURE").unwrap_or_else(|_| {
            error!("🪛️ APG_PROCESSOR_SIGNATURE is not set. Please set it to your processor API signature.");
            String::default()
        }));
        Self { endpoint, verification_endpoint, payment_host, application_id, user_id, password, signature }
    }

    /// URL the sender's browser is sent to so they can approve a created payment.
    pub fn payment_redirect_url(&self, pay_key: &str) -> String {
        format!("{}?cmd=_ap-payment&paykey={pay_key}", self.payment_host)
    }

    pub fn preapproval_redirect_url(&self, preapproval_key: &str) -> String {
        format!("{}?cmd=_ap-preapproval&preapprovalkey={preapproval_key}", self.payment_host)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn redirect_urls_carry_the_key() {
        let config = AdaptiveConfig { payment_host: "https://example.com/webscr".into(), ..Default::default() };
        assert_eq!(config.payment_redirect_url("AP-1"), "https://example.com/webscr?cmd=_ap-payment&paykey=AP-1");
        assert_eq!(
            config.preapproval_redirect_url("PA-1"),
            "https://example.com/webscr?cmd=_ap-preapproval&preapprovalkey=PA-1"
        );
    }
}
