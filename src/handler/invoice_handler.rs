use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::dto::invoice_dto::{
    CreatedResponse, InvoiceNumberResponse, ListInvoicesQuery, SearchInvoicesQuery, SuccessResponse,
};
use crate::service::invoice_service::{InvoiceFields, InvoiceService, InvoiceServiceImpl};
use crate::util::error::{HandlerError, HandlerErrorKind};

/// A body that is not a JSON object is a 400 with the usual error shape.
fn invoice_body(payload: Result<Json<InvoiceFields>, JsonRejection>) -> Result<InvoiceFields, HandlerError> {
    payload.map(|Json(fields)| fields).map_err(|rejection| {
        warn!("Rejected invoice body: {rejection}");
        HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: "Invoice body must be a JSON object".to_string(),
            details: Some(rejection.body_text()),
        }
    })
}

// GET /api/invoice-number
pub async fn invoice_number_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let number = service.next_number().await?;
    Ok(Json(InvoiceNumberResponse { number }))
}

// GET /api/invoices
pub async fn list_invoices_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let invoices = service
        .list(query.start_date.as_deref(), query.end_date.as_deref())
        .await?;
    Ok(Json(invoices))
}

// POST /api/invoices
pub async fn create_invoice_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    payload: Result<Json<InvoiceFields>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let fields = invoice_body(payload)?;
    let id = service.create(fields).await?;
    info!(invoice_id = %id, "Invoice created");
    Ok(Json(CreatedResponse { success: true, id }))
}

// GET /api/invoices/search
pub async fn search_invoices_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    Query(query): Query<SearchInvoicesQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let invoices = service.search(query.name, query.address).await?;
    Ok(Json(invoices))
}

// GET /api/invoices/{id}
pub async fn get_invoice_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.get(&id).await?))
}

// PUT /api/invoices/{id}
pub async fn update_invoice_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    Path(id): Path<String>,
    payload: Result<Json<InvoiceFields>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let fields = invoice_body(payload)?;
    service.update(&id, fields).await?;
    info!(invoice_id = %id, "Invoice updated");
    Ok(Json(SuccessResponse::ok()))
}

// DELETE /api/invoices/{id}
pub async fn delete_invoice_handler(
    State(service): State<Arc<InvoiceServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    service.delete(&id).await?;
    info!(invoice_id = %id, "Invoice deleted");
    Ok(Json(SuccessResponse::ok()))
}
