//! Request handler definitions
//!
//! Handlers stay thin: path extraction, one engine call, outcome-to-status mapping. All reconciliation decisions live
//! in the engine, so a handler must never inspect or mutate record state itself.
//!
//! actix cannot register generic handlers by itself, so the concrete store/client types are supplied with a turbofish
//! at registration time (see [`crate::server`]).

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use adaptive_payment_engine::{
    traits::{PaymentStore, ProcessorClient},
    IpnOutcome,
    ReconciliationApi,
};
use log::*;

use crate::{data_objects::JsonResponse, errors::ServerError};

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    "👍️\n"
}

/// Notification deliveries from the processor. 204 acknowledges the delivery, including business-level rejections
/// that were recorded on the record. 400 means the secret didn't match, 404 an unknown record, and 5xx a
/// verification problem the processor should retry.
pub async fn ipn<B, C>(
    req: HttpRequest,
    path: web::Path<(i64, String)>,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    let (object_id, token) = path.into_inner();
    trace!("🔔️ Received notification delivery for record #{object_id}");
    let outcome = api.handle_ipn(object_id, &token, req.path(), &body).await?;
    let response = match outcome {
        IpnOutcome::Processed => HttpResponse::NoContent().finish(),
        IpnOutcome::SecretMismatch => HttpResponse::BadRequest().finish(),
        IpnOutcome::NotFound => HttpResponse::NotFound().finish(),
    };
    Ok(response)
}

/// A sender returning from the processor's checkout. Note that this is a user returning to the site, not a returned
/// payment.
pub async fn payment_return<B, C>(
    path: web::Path<(i64, String)>,
    api: web::Data<ReconciliationApi<B, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    let (id, token) = path.into_inner();
    debug!("💳️ Return received for payment #{id}");
    let payment = api.payment_return(id, &token).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment #{} is {}", payment.id, payment.status))))
}

pub async fn payment_cancel<B, C>(
    path: web::Path<(i64, String)>,
    api: web::Data<ReconciliationApi<B, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    let (id, token) = path.into_inner();
    debug!("💳️ Cancellation received for payment #{id}");
    let payment = api.payment_cancel(id, &token).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment #{} is {}", payment.id, payment.status))))
}

pub async fn preapproval_return<B, C>(
    path: web::Path<(i64, String)>,
    api: web::Data<ReconciliationApi<B, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    let (id, token) = path.into_inner();
    info!("🗝️ Return received for preapproval #{id}");
    let preapproval = api.preapproval_return(id, &token).await?;
    Ok(HttpResponse::Ok()
        .json(JsonResponse::success(format!("Preapproval #{} is {}", preapproval.id, preapproval.status))))
}

/// Acknowledges a sender backing out of a preapproval flow. No state changes; cancellation against the processor is
/// a separate, deliberate call.
pub async fn preapproval_cancel<B, C>(
    path: web::Path<i64>,
    api: web::Data<ReconciliationApi<B, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: ProcessorClient + 'static,
{
    let id = path.into_inner();
    let preapproval = api.preapproval_cancel_view(id).await?;
    Ok(HttpResponse::Ok()
        .json(JsonResponse::success(format!("Preapproval #{} is {}", preapproval.id, preapproval.status))))
}
