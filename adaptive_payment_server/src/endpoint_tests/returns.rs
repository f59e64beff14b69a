use actix_web::http::StatusCode;
use adaptive_payment_engine::{
    db_types::{NewPreapproval, PaymentStatus, PreapprovalStatus},
    traits::PaymentStore,
};
use apg_common::Money;
use rust_decimal_macros::dec;

use super::{
    helpers::{created_payment, get_request, test_api},
    mocks::MockProcessor,
};

#[actix_web::test]
async fn health_check() {
    let (api, _store) = test_api(MockProcessor::new());
    let (status, body) = get_request(api, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn a_payment_return_confirms_and_marks_the_record_returned() {
    let (api, store) = test_api(MockProcessor::new());
    let (id, token) = created_payment(&store).await;
    let (status, body) = get_request(api, &format!("/payments/{id}/return/{token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":true"));
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Returned);
}

#[actix_web::test]
async fn a_payment_return_with_a_bad_token_is_a_server_error() {
    let (api, store) = test_api(MockProcessor::new());
    let (id, _token) = created_payment(&store).await;
    let (status, _body) = get_request(api, &format!("/payments/{id}/return/forged")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Error);
}

#[actix_web::test]
async fn a_return_for_an_unknown_payment_is_404() {
    let (api, _store) = test_api(MockProcessor::new());
    let (status, _body) = get_request(api, "/payments/999/return/token").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_payment_cancel_cancels_the_record() {
    let (api, store) = test_api(MockProcessor::new());
    let (id, token) = created_payment(&store).await;
    let (status, _body) = get_request(api, &format!("/payments/{id}/cancel/{token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Canceled);
}

#[actix_web::test]
async fn a_preapproval_cancel_only_acknowledges() {
    let (api, store) = test_api(MockProcessor::new());
    let preapproval =
        store.create_preapproval(NewPreapproval::new(Money::new(dec!(100.00), "USD"))).await.unwrap();
    let (status, _body) = get_request(api, &format!("/preapprovals/{}/cancel", preapproval.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        store.fetch_preapproval(preapproval.id).await.unwrap().unwrap().status,
        PreapprovalStatus::New
    );
}
