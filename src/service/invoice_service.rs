use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::model::invoice::Invoice;
use crate::repository::counter_repo::InvoiceCounterRepository;
use crate::repository::invoice_repo::{CreatedRange, InvoiceQuery, InvoiceRepository};
use crate::repository::repository_error::RepositoryError;
use crate::util::dates::parse_timestamp;
use crate::util::error::ServiceError;

pub const INVOICE_PREFIX: &str = "G2FEE";

/// `G2FEE` followed by the sequence value padded to at least three digits.
pub fn format_invoice_number(seq: i64) -> String {
    format!("{}{:03}", INVOICE_PREFIX, seq)
}

pub type InvoiceFields = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait InvoiceService: Send + Sync {
    async fn next_number(&self) -> Result<String, ServiceError>;
    /// Returns the new invoice id as a hex string.
    async fn create(&self, fields: InvoiceFields) -> Result<String, ServiceError>;
    async fn get(&self, id: &str) -> Result<Invoice, ServiceError>;
    async fn update(&self, id: &str, fields: InvoiceFields) -> Result<(), ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
    /// Date filtering applies only when both bounds are given.
    async fn list(&self, start_date: Option<&str>, end_date: Option<&str>) -> Result<Vec<Invoice>, ServiceError>;
    async fn search(&self, name: Option<String>, address: Option<String>) -> Result<Vec<Invoice>, ServiceError>;
}

pub struct InvoiceServiceImpl {
    pub invoice_repo: Arc<dyn InvoiceRepository>,
    pub counter_repo: Arc<dyn InvoiceCounterRepository>,
}

impl InvoiceServiceImpl {
    pub fn new(invoice_repo: Arc<dyn InvoiceRepository>, counter_repo: Arc<dyn InvoiceCounterRepository>) -> Self {
        Self {
            invoice_repo,
            counter_repo,
        }
    }
}

fn parse_id(id: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(id).map_err(|_| ServiceError::InvalidId("invoice"))
}

fn parse_bound(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, ServiceError> {
    parse_timestamp(raw).ok_or_else(|| ServiceError::InvalidDate(raw.to_string()))
}

fn to_document(fields: InvoiceFields) -> Result<bson::Document, ServiceError> {
    bson::to_document(&fields).map_err(|e| ServiceError::InvalidInput(format!("Unsupported invoice field: {}", e)))
}

fn invoice_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound(_) => ServiceError::NotFound("Invoice not found".to_string()),
        other => ServiceError::from(other),
    }
}

#[async_trait]
impl InvoiceService for InvoiceServiceImpl {
    #[instrument(skip(self))]
    async fn next_number(&self) -> Result<String, ServiceError> {
        let seq = self.counter_repo.next_sequence().await.map_err(|e| {
            error!("Failed to advance invoice counter: {e}");
            ServiceError::Internal(e.to_string())
        })?;
        let number = format_invoice_number(seq);
        info!(number = %number, "Issued invoice number");
        Ok(number)
    }

    #[instrument(skip(self, fields))]
    async fn create(&self, fields: InvoiceFields) -> Result<String, ServiceError> {
        let document = to_document(fields)?;
        let id = self
            .invoice_repo
            .create(document, chrono::Utc::now())
            .await
            .map_err(invoice_error)?;
        Ok(id.to_hex())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Invoice, ServiceError> {
        let id = parse_id(id)?;
        self.invoice_repo.get_by_id(id).await.map_err(invoice_error)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: &str, fields: InvoiceFields) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        let document = to_document(fields)?;
        self.invoice_repo
            .update(id, document, chrono::Utc::now())
            .await
            .map_err(invoice_error)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        self.invoice_repo.delete(id).await.map_err(invoice_error)
    }

    #[instrument(skip(self))]
    async fn list(&self, start_date: Option<&str>, end_date: Option<&str>) -> Result<Vec<Invoice>, ServiceError> {
        let query = match (start_date, end_date) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                InvoiceQuery::created_within(CreatedRange::inclusive(parse_bound(start)?, parse_bound(end)?))
            }
            _ => InvoiceQuery::default(),
        };
        let invoices = self.invoice_repo.find(&query).await.map_err(invoice_error)?;
        info!("Listed {} invoices", invoices.len());
        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn search(&self, name: Option<String>, address: Option<String>) -> Result<Vec<Invoice>, ServiceError> {
        let query = InvoiceQuery {
            created: None,
            name,
            address,
        };
        let invoices = self.invoice_repo.find(&query).await.map_err(invoice_error)?;
        info!("Search matched {} invoices", invoices.len());
        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_padding() {
        assert_eq!(format_invoice_number(1), "G2FEE001");
        assert_eq!(format_invoice_number(42), "G2FEE042");
        assert_eq!(format_invoice_number(999), "G2FEE999");
    }

    #[test]
    fn test_invoice_number_widens_past_999() {
        assert_eq!(format_invoice_number(1000), "G2FEE1000");
        assert_eq!(format_invoice_number(123_456), "G2FEE123456");
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("65a1f0c2e4b0a1b2c3d4e5f6").is_ok());
        assert_eq!(parse_id("not-an-id"), Err(ServiceError::InvalidId("invoice")));
        assert_eq!(parse_id(""), Err(ServiceError::InvalidId("invoice")));
    }

    #[test]
    fn test_parse_bound_reports_raw_value() {
        assert_eq!(
            parse_bound("yesterday"),
            Err(ServiceError::InvalidDate("yesterday".to_string()))
        );
    }
}
