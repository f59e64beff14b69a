use actix_web::http::StatusCode;
use adaptive_payment_engine::{
    db_types::PaymentStatus,
    processor_types::IpnVerification,
    traits::PaymentStore,
};

use super::{
    helpers::{created_payment, matching_ipn_body, post_request, test_api},
    mocks::MockProcessor,
};

fn verified_client() -> MockProcessor {
    let mut client = MockProcessor::new();
    client.expect_verify_ipn().returning(|_| Ok(IpnVerification::Verified));
    client
}

#[actix_web::test]
async fn a_verified_delivery_is_answered_with_204_and_applied() {
    let (api, store) = test_api(verified_client());
    let (id, token) = created_payment(&store).await;
    let (status, _body) = post_request(api, &format!("/ipn/{id}/{token}"), matching_ipn_body()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Completed);
}

#[actix_web::test]
async fn a_bad_secret_is_answered_with_400() {
    let (api, store) = test_api(verified_client());
    let (id, _token) = created_payment(&store).await;
    let (status, _body) = post_request(api, &format!("/ipn/{id}/forged"), matching_ipn_body()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Error);
}

#[actix_web::test]
async fn an_unknown_record_is_answered_with_404() {
    let (api, _store) = test_api(verified_client());
    let (status, _body) = post_request(api, "/ipn/999/token", matching_ipn_body()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn an_unverifiable_delivery_is_answered_with_5xx_so_the_processor_retries() {
    let mut client = MockProcessor::new();
    client.expect_verify_ipn().returning(|_| Ok(IpnVerification::Invalid));
    let (api, store) = test_api(client);
    let (id, token) = created_payment(&store).await;
    let (status, _body) = post_request(api, &format!("/ipn/{id}/{token}"), matching_ipn_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // nothing was applied
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Created);
}
