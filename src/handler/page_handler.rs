use askama::Template;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;
use tower_sessions::Session;

use crate::handler::{page_flashes, render};
use crate::service::stats_service::{MonthlyStats, StatsService, StatsServiceImpl};
use crate::util::error::HandlerError;
use crate::util::session::Flash;

/// Monthly figures as shown on the pages, amounts with two decimals.
pub struct StatsView {
    pub monthly_count: u64,
    pub total_paid: String,
    pub total_balance: String,
}

impl From<MonthlyStats> for StatsView {
    fn from(stats: MonthlyStats) -> Self {
        StatsView {
            monthly_count: stats.count,
            total_paid: format!("{:.2}", stats.total_paid),
            total_balance: format!("{:.2}", stats.total_balance),
        }
    }
}

#[derive(Template)]
#[template(path = "billing.html")]
pub struct BillingTemplate {
    pub flashes: Vec<Flash>,
    pub stats: StatsView,
}

#[derive(Template)]
#[template(path = "saved_invoices.html")]
pub struct SavedInvoicesTemplate {
    pub flashes: Vec<Flash>,
    pub stats: StatsView,
}

#[derive(Template)]
#[template(path = "monthly_report.html")]
pub struct MonthlyReportTemplate {
    pub flashes: Vec<Flash>,
    pub stats: StatsView,
}

// GET /
pub async fn index_handler() -> Redirect {
    Redirect::to("/billing")
}

async fn page_context(service: &StatsServiceImpl, session: &Session) -> Result<(Vec<Flash>, StatsView), HandlerError> {
    let stats = service.monthly_stats().await?;
    Ok((page_flashes(session).await, stats.into()))
}

// GET /billing
pub async fn billing_page(
    State(service): State<Arc<StatsServiceImpl>>,
    session: Session,
) -> Result<impl IntoResponse, HandlerError> {
    let (flashes, stats) = page_context(&service, &session).await?;
    render(&BillingTemplate { flashes, stats })
}

// GET /saved_invoices
pub async fn saved_invoices_page(
    State(service): State<Arc<StatsServiceImpl>>,
    session: Session,
) -> Result<impl IntoResponse, HandlerError> {
    let (flashes, stats) = page_context(&service, &session).await?;
    render(&SavedInvoicesTemplate { flashes, stats })
}

// GET /monthly_report
pub async fn monthly_report_page(
    State(service): State<Arc<StatsServiceImpl>>,
    session: Session,
) -> Result<impl IntoResponse, HandlerError> {
    let (flashes, stats) = page_context(&service, &session).await?;
    render(&MonthlyReportTemplate { flashes, stats })
}

// GET /api/stats/monthly
pub async fn monthly_stats_handler(
    State(service): State<Arc<StatsServiceImpl>>,
) -> Result<Json<MonthlyStats>, HandlerError> {
    Ok(Json(service.monthly_stats().await?))
}
