use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::handler::page_handler::{
    billing_page, index_handler, monthly_report_page, monthly_stats_handler, saved_invoices_page,
};
use crate::middlewares::auth_middleware::require_auth;
use crate::service::stats_service::StatsServiceImpl;

/// Rendered pages plus the stats endpoint; every route needs a session.
pub fn page_router(service: Arc<StatsServiceImpl>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/billing", get(billing_page))
        .route("/saved_invoices", get(saved_invoices_page))
        .route("/monthly_report", get(monthly_report_page))
        .route("/api/stats/monthly", get(monthly_stats_handler))
        .route_layer(middleware::from_fn(require_auth))
        .with_state(service)
}
