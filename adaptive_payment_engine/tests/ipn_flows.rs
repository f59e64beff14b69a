//! Notification handling: verification, authentication, amount cross-checks, idempotence and ordering.

mod support;

use std::sync::Arc;

use adaptive_payment_engine::{
    db_types::{NewPayment, PaymentStatus, StatusUpdate},
    ipn::IpnError,
    processor_types::IpnVerification,
    settings::GatewaySettings,
    traits::{PaymentStore, ProcessorError},
    IpnOutcome,
    TransitionError,
};
use rust_decimal_macros::dec;
use support::*;

fn verified_client() -> MockProcessor {
    let mut client = MockProcessor::new();
    client.expect_verify_ipn().returning(|_| Ok(IpnVerification::Verified));
    client
}

async fn created_payment(
    api: &adaptive_payment_engine::ReconciliationApi<adaptive_payment_engine::MemoryStore, MockProcessor>,
) -> (i64, String) {
    let payment = api.create_payment(NewPayment::new(usd(dec!(10.00)))).await.unwrap();
    api.store().set_pay_key(payment.id, "AP-123").await.unwrap();
    api.store().update_payment_status(payment.id, StatusUpdate::new(PaymentStatus::Created, "")).await.unwrap();
    (payment.id, payment.secret_token.to_string())
}

#[tokio::test]
async fn a_matching_completed_notification_completes_the_payment() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let outcome = api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    assert_eq!(outcome, IpnOutcome::Processed);
    let payment = store.fetch_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.sender_email, "buyer@example.com");
}

#[tokio::test]
async fn split_transactions_are_summed_for_the_cross_check() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 7.00", "USD 3.00"]);
    api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Completed);
}

#[tokio::test]
async fn an_amount_mismatch_is_a_hard_error_and_sticks() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 9.00"]);
    let outcome = api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    assert_eq!(outcome, IpnOutcome::Processed);
    let payment = store.fetch_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Error);
    assert!(payment.status_detail.contains("didn't match"));

    // a later, would-be-valid notification does not quietly clear the recorded error
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Error);
}

#[tokio::test]
async fn a_non_completed_status_is_recorded_as_an_error() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("PENDING", &["USD 10.00"]);
    api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    let payment = store.fetch_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Error);
    assert!(payment.status_detail.contains("PENDING"));
}

#[tokio::test]
async fn redelivered_notifications_are_idempotent() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    let writes_after_first = store.status_update_count().await;

    let outcome = api.handle_ipn(id, &token, "/ipn", &body).await.unwrap();
    assert_eq!(outcome, IpnOutcome::Processed);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Completed);
    assert_eq!(store.status_update_count().await, writes_after_first);
}

#[tokio::test]
async fn a_secret_mismatch_forces_error_and_answers_400() {
    let (api, store) = api(verified_client());
    let (id, _token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let outcome = api.handle_ipn(id, "forged-token", "/ipn", &body).await.unwrap();
    assert_eq!(outcome, IpnOutcome::SecretMismatch);
    let payment = store.fetch_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Error);
    assert!(payment.status_detail.contains("did not match"));
}

#[tokio::test]
async fn an_invalid_notification_is_discarded_without_touching_state() {
    let mut client = MockProcessor::new();
    client.expect_verify_ipn().returning(|_| Ok(IpnVerification::Invalid));
    let (api, store) = api(client);
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let err = api.handle_ipn(id, &token, "/ipn", &body).await.unwrap_err();
    assert!(matches!(err, TransitionError::Ipn(IpnError::VerificationFailed)));
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Created);
}

#[tokio::test]
async fn an_unreachable_verification_endpoint_discards_the_notification() {
    let mut client = MockProcessor::new();
    client.expect_verify_ipn().returning(|_| Err(ProcessorError::Transport("dns failure".to_string())));
    let (api, store) = api(client);
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let err = api.handle_ipn(id, &token, "/ipn", &body).await.unwrap_err();
    assert!(matches!(err, TransitionError::Ipn(IpnError::VerificationUnreachable(_))));
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Created);
}

#[tokio::test]
async fn an_unknown_record_answers_404() {
    let (api, _store) = api(verified_client());
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let outcome = api.handle_ipn(999, "token", "/ipn", &body).await.unwrap();
    assert_eq!(outcome, IpnOutcome::NotFound);
}

#[tokio::test]
async fn notification_logging_records_the_delivery() {
    let settings = GatewaySettings { ipn_log_enabled: true, ..Default::default() };
    let (api, store) = api_with(verified_client(), settings);
    let (id, token) = created_payment(&api).await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    api.handle_ipn(id, &token, "/ipn/1/token", &body).await.unwrap();
    let logs = store.ipn_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].path, "/ipn/1/token");
    assert_eq!(logs[0].return_status_code, Some(204));
    assert_eq!(logs[0].verify_response, "VERIFIED");
    assert!(logs[0].post_body.contains("transaction_type"));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_deliveries_for_one_record_serialize() {
    let (api, store) = api(verified_client());
    let (id, token) = created_payment(&api).await;
    let writes_before = store.status_update_count().await;
    let body = payment_ipn_body("COMPLETED", &["USD 10.00"]);
    let api = Arc::new(api);
    let (a, b) = {
        let (api1, body1, token1) = (Arc::clone(&api), body.clone(), token.clone());
        let (api2, body2, token2) = (Arc::clone(&api), body.clone(), token.clone());
        tokio::join!(
            tokio::spawn(async move { api1.handle_ipn(id, &token1, "/ipn", &body1).await }),
            tokio::spawn(async move { api2.handle_ipn(id, &token2, "/ipn", &body2).await }),
        )
    };
    assert_eq!(a.unwrap().unwrap(), IpnOutcome::Processed);
    assert_eq!(b.unwrap().unwrap(), IpnOutcome::Processed);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Completed);
    // one delivery applied, the other saw the completed record and was a no-op
    assert_eq!(store.status_update_count().await - writes_before, 1);
}
