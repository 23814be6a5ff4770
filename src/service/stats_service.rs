use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::model::invoice::Invoice;
use crate::repository::invoice_repo::{CreatedRange, InvoiceQuery, InvoiceRepository};
use crate::util::dates::month_window;
use crate::util::error::ServiceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyStats {
    #[serde(rename = "monthly_count")]
    pub count: u64,
    pub total_paid: f64,
    pub total_balance: f64,
}

impl MonthlyStats {
    /// Fold invoices into totals; missing `total`/`amountPaid` count as 0.
    pub fn from_invoices<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        invoices.into_iter().fold(MonthlyStats::default(), |mut stats, invoice| {
            let paid = invoice.amount_paid();
            stats.count += 1;
            stats.total_paid += paid;
            stats.total_balance += invoice.total() - paid;
            stats
        })
    }
}

#[async_trait]
pub trait StatsService: Send + Sync {
    /// Stats for the current UTC month.
    async fn monthly_stats(&self) -> Result<MonthlyStats, ServiceError>;
    /// Stats for the UTC month containing `now`.
    async fn monthly_stats_at(&self, now: DateTime<Utc>) -> Result<MonthlyStats, ServiceError>;
}

pub struct StatsServiceImpl {
    pub invoice_repo: Arc<dyn InvoiceRepository>,
}

impl StatsServiceImpl {
    pub fn new(invoice_repo: Arc<dyn InvoiceRepository>) -> Self {
        Self { invoice_repo }
    }
}

#[async_trait]
impl StatsService for StatsServiceImpl {
    async fn monthly_stats(&self) -> Result<MonthlyStats, ServiceError> {
        self.monthly_stats_at(Utc::now()).await
    }

    #[instrument(skip(self))]
    async fn monthly_stats_at(&self, now: DateTime<Utc>) -> Result<MonthlyStats, ServiceError> {
        let (start, end) =
            month_window(now).ok_or_else(|| ServiceError::Internal(format!("No month window for {}", now)))?;
        let query = InvoiceQuery::created_within(CreatedRange::half_open(start, end));
        let invoices = self.invoice_repo.find(&query).await?;
        let stats = MonthlyStats::from_invoices(&invoices);
        info!(count = stats.count, total_paid = stats.total_paid, "Monthly stats computed");
        Ok(stats)
    }
}
