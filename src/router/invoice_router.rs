use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::handler::invoice_handler::{
    create_invoice_handler, delete_invoice_handler, get_invoice_handler, invoice_number_handler,
    list_invoices_handler, search_invoices_handler, update_invoice_handler,
};
use crate::middlewares::auth_middleware::require_auth;
use crate::service::invoice_service::InvoiceServiceImpl;

pub fn invoice_router(service: Arc<InvoiceServiceImpl>) -> Router {
    Router::new()
        .route("/api/invoice-number", get(invoice_number_handler))
        .route("/api/invoices", get(list_invoices_handler).post(create_invoice_handler))
        .route("/api/invoices/search", get(search_invoices_handler))
        .route(
            "/api/invoices/{id}",
            get(get_invoice_handler)
                .put(update_invoice_handler)
                .delete(delete_invoice_handler),
        )
        .route_layer(middleware::from_fn(require_auth))
        .with_state(service)
}
