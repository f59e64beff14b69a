use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use adaptive_payment_engine::{
    db_types::{NewPayment, PaymentStatus, StatusUpdate},
    settings::GatewaySettings,
    traits::{NullScheduler, PaymentStore},
    MemoryStore,
    ReconciliationApi,
};
use apg_common::Money;
use rust_decimal_macros::dec;

use super::mocks::MockProcessor;
use crate::routes;

pub type TestApi = ReconciliationApi<MemoryStore, MockProcessor>;

pub fn test_api(client: MockProcessor) -> (TestApi, MemoryStore) {
    let _ = env_logger::try_init().ok();
    let store = MemoryStore::new();
    let api =
        ReconciliationApi::new(store.clone(), Arc::new(client), GatewaySettings::default(), Arc::new(NullScheduler));
    (api, store)
}

/// Seeds a processed, `created` payment of 10.00 USD and returns `(id, secret token)`.
pub async fn created_payment(store: &MemoryStore) -> (i64, String) {
    let payment = store.create_payment(NewPayment::new(Money::new(dec!(10.00), "USD"))).await.unwrap();
    store.set_pay_key(payment.id, "AP-123").await.unwrap();
    store.update_payment_status(payment.id, StatusUpdate::new(PaymentStatus::Created, "")).await.unwrap();
    (payment.id, payment.secret_token.to_string())
}

fn add_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::health)
        .route("/ipn/{object_id}/{secret}", web::post().to(routes::ipn::<MemoryStore, MockProcessor>))
        .route("/payments/{id}/return/{secret}", web::get().to(routes::payment_return::<MemoryStore, MockProcessor>))
        .route("/payments/{id}/cancel/{secret}", web::get().to(routes::payment_cancel::<MemoryStore, MockProcessor>))
        .route(
            "/preapprovals/{id}/return/{secret}",
            web::get().to(routes::preapproval_return::<MemoryStore, MockProcessor>),
        )
        .route("/preapprovals/{id}/cancel", web::get().to(routes::preapproval_cancel::<MemoryStore, MockProcessor>));
}

pub async fn get_request(api: TestApi, path: &str) -> (StatusCode, String) {
    let app = test::init_service(App::new().app_data(web::Data::new(api)).configure(add_routes)).await;
    let req = test::TestRequest::get().uri(path).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn post_request(api: TestApi, path: &str, payload: Vec<u8>) -> (StatusCode, String) {
    let app = test::init_service(App::new().app_data(web::Data::new(api)).configure(add_routes)).await;
    let req = test::TestRequest::post().uri(path).set_payload(payload).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// A payment notification body matching [`created_payment`]'s amount.
pub fn matching_ipn_body() -> Vec<u8> {
    b"transaction_type=Adaptive+Payment+PAY&status=COMPLETED&sender_email=buyer%40example.com\
      &pay_key=AP-123&transaction%5B0%5D.id=TX0&transaction%5B0%5D.amount=USD+10.00"
        .to_vec()
}
