use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use adaptive_payment_engine::{MemoryStore, ReconciliationApi};
use adaptive_tools::AdaptiveApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes,
    scheduler::DelayedUpdateWorker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = MemoryStore::new();
    let client = AdaptiveApi::new(config.processor.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, store, Arc::new(client))?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    store: MemoryStore,
    client: Arc<AdaptiveApi>,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let scheduler = DelayedUpdateWorker::new(store.clone(), Arc::clone(&client), config.gateway.clone());
        let api = ReconciliationApi::new(
            store.clone(),
            Arc::clone(&client),
            config.gateway.clone(),
            Arc::new(scheduler),
        );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("apg::access_log"))
            .app_data(web::Data::new(api))
            .service(routes::health)
            .route("/ipn/{object_id}/{secret}", web::post().to(routes::ipn::<MemoryStore, AdaptiveApi>))
            .route(
                "/payments/{id}/return/{secret}",
                web::get().to(routes::payment_return::<MemoryStore, AdaptiveApi>),
            )
            .route(
                "/payments/{id}/cancel/{secret}",
                web::get().to(routes::payment_cancel::<MemoryStore, AdaptiveApi>),
            )
            .route(
                "/preapprovals/{id}/return/{secret}",
                web::get().to(routes::preapproval_return::<MemoryStore, AdaptiveApi>),
            )
            .route(
                "/preapprovals/{id}/cancel",
                web::get().to(routes::preapproval_cancel::<MemoryStore, AdaptiveApi>),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
