use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use mongodb::{Collection, Database};
use tracing::{error, info, instrument, warn};

use crate::model::invoice::{self, Invoice};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

pub const INVOICES_COLLECTION: &str = "invoices";

/// Window on `created_at`. The lower bound is always inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub to_inclusive: bool,
}

impl CreatedRange {
    /// `[from, to]`
    pub fn inclusive(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        CreatedRange { from, to, to_inclusive: true }
    }

    /// `[from, to)`
    pub fn half_open(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        CreatedRange { from, to, to_inclusive: false }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && if self.to_inclusive { instant <= self.to } else { instant < self.to }
    }
}

/// Filters understood by [`InvoiceRepository::find`]. Every present filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub created: Option<CreatedRange>,
    /// Case-insensitive substring of `name`. The needle is regex-escaped, so
    /// `.`, `*` and friends match themselves; empty needles are ignored.
    pub name: Option<String>,
    /// Case-insensitive literal substring of `address`, escaped like `name`.
    pub address: Option<String>,
}

impl InvoiceQuery {
    pub fn created_within(range: CreatedRange) -> Self {
        InvoiceQuery {
            created: Some(range),
            ..InvoiceQuery::default()
        }
    }

    /// MongoDB filter document for this query.
    pub fn to_filter(&self) -> Document {
        let mut filter = Document::new();
        if let Some(range) = &self.created {
            let upper = if range.to_inclusive { "$lte" } else { "$lt" };
            let mut bounds = doc! { "$gte": bson::DateTime::from_chrono(range.from) };
            bounds.insert(upper, bson::DateTime::from_chrono(range.to));
            filter.insert(invoice::CREATED_AT, bounds);
        }
        for (key, needle) in [(invoice::NAME, &self.name), (invoice::ADDRESS, &self.address)] {
            if let Some(needle) = needle.as_deref().filter(|n| !n.is_empty()) {
                filter.insert(key, doc! { "$regex": regex::escape(needle), "$options": "i" });
            }
        }
        filter
    }
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, fields: Document, created_at: DateTime<Utc>) -> RepositoryResult<ObjectId>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Invoice>;
    /// Shallow merge of `fields` into the stored document.
    async fn update(&self, id: ObjectId, fields: Document, updated_at: DateTime<Utc>) -> RepositoryResult<()>;
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
    async fn find(&self, query: &InvoiceQuery) -> RepositoryResult<Vec<Invoice>>;
}

pub struct MongoInvoiceRepository {
    collection: Collection<Document>,
}

impl MongoInvoiceRepository {
    pub fn new(db: &Database) -> Self {
        MongoInvoiceRepository {
            collection: db.collection::<Document>(INVOICES_COLLECTION),
        }
    }
}

fn to_invoice(raw: Document) -> RepositoryResult<Invoice> {
    Invoice::try_from(raw).map_err(|e| RepositoryError::serialization(format!("Malformed invoice document: {}", e)))
}

/// Listing skips documents that cannot be read as invoices instead of failing the whole result.
fn decode_listed(raw: Document) -> Option<Invoice> {
    let id = raw.get(invoice::ID).map(|id| id.to_string()).unwrap_or_default();
    match to_invoice(raw) {
        Ok(invoice) => Some(invoice),
        Err(e) => {
            warn!(document_id = %id, "Skipping invoice: {}", e);
            None
        }
    }
}

#[async_trait]
impl InvoiceRepository for MongoInvoiceRepository {
    #[instrument(skip(self, fields))]
    async fn create(&self, mut fields: Document, created_at: DateTime<Utc>) -> RepositoryResult<ObjectId> {
        let id = ObjectId::new();
        invoice::strip_server_fields(&mut fields);
        fields.insert(invoice::ID, id);
        fields.insert(invoice::CREATED_AT, bson::DateTime::from_chrono(created_at));
        match self.collection.insert_one(fields, None).await {
            Ok(_) => {
                info!(invoice_id = %id, "Invoice created");
                Ok(id)
            }
            Err(e) => {
                error!("Failed to create invoice: {}", e);
                Err(RepositoryError::database(format!("Failed to create invoice: {}", e)))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Invoice> {
        let result = self.collection.find_one(doc! { "_id": id }, None).await;
        match result {
            Ok(Some(raw)) => to_invoice(raw),
            Ok(None) => Err(RepositoryError::not_found(format!("Invoice not found for ID: {}", id))),
            Err(e) => {
                error!("Failed to fetch invoice by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch invoice by ID: {}", e)))
            }
        }
    }

    #[instrument(skip(self, fields), fields(id = %id))]
    async fn update(&self, id: ObjectId, mut fields: Document, updated_at: DateTime<Utc>) -> RepositoryResult<()> {
        invoice::strip_server_fields(&mut fields);
        fields.insert(invoice::UPDATED_AT, bson::DateTime::from_chrono(updated_at));
        let update = doc! { "$set": fields };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => {
                info!("Invoice updated");
                Ok(())
            }
            Ok(_) => Err(RepositoryError::not_found(format!("No invoice found to update for ID: {}", id))),
            Err(e) => {
                error!("Failed to update invoice: {}", e);
                Err(RepositoryError::database(format!("Failed to update invoice: {}", e)))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("Invoice deleted");
                Ok(())
            }
            Ok(_) => Err(RepositoryError::not_found(format!("No invoice found to delete for ID: {}", id))),
            Err(e) => {
                error!("Failed to delete invoice: {}", e);
                Err(RepositoryError::database(format!("Failed to delete invoice: {}", e)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn find(&self, query: &InvoiceQuery) -> RepositoryResult<Vec<Invoice>> {
        let mut cursor = self
            .collection
            .find(query.to_filter(), None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to list invoices: {}", e)))?;
        let mut invoices = Vec::new();
        while let Some(raw) = cursor.next().await {
            let raw = raw.map_err(|e| RepositoryError::serialization(format!("Failed to read invoice: {}", e)))?;
            invoices.extend(decode_listed(raw));
        }
        info!("Fetched {} invoices", invoices.len());
        Ok(invoices)
    }
}
