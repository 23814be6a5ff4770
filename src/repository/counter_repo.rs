use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::{
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
    Collection, Database,
};
use tracing::{error, info, instrument};

use crate::repository::repository_error::{RepositoryError, RepositoryResult};

pub const COUNTER_COLLECTION: &str = "invoice_counter";
pub const COUNTER_ID: &str = "invoice_number";
pub const INITIAL_SEQ: i64 = 1;

/// Persisted sequence behind human-facing invoice numbers.
#[async_trait]
pub trait InvoiceCounterRepository: Send + Sync {
    /// Create the counter with `seq = 1` unless it already exists.
    async fn ensure_initialized(&self) -> RepositoryResult<()>;

    /// Atomically hand out the current sequence value and advance the counter.
    async fn next_sequence(&self) -> RepositoryResult<i64>;
}

pub struct MongoInvoiceCounterRepository {
    collection: Collection<Document>,
}

impl MongoInvoiceCounterRepository {
    pub fn new(db: &Database) -> Self {
        MongoInvoiceCounterRepository {
            collection: db.collection::<Document>(COUNTER_COLLECTION),
        }
    }
}

fn read_seq(counter: &Document) -> RepositoryResult<i64> {
    match counter.get("seq") {
        Some(Bson::Int32(v)) => Ok(i64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v),
        Some(other) => Err(RepositoryError::serialization(format!(
            "Invoice counter seq has unexpected type: {:?}",
            other.element_type()
        ))),
        None => Err(RepositoryError::serialization("Invoice counter has no seq field")),
    }
}

#[async_trait]
impl InvoiceCounterRepository for MongoInvoiceCounterRepository {
    #[instrument(skip(self))]
    async fn ensure_initialized(&self) -> RepositoryResult<()> {
        // $setOnInsert only writes when the upsert creates the document
        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .collection
            .update_one(
                doc! { "_id": COUNTER_ID },
                doc! { "$setOnInsert": { "seq": INITIAL_SEQ } },
                options,
            )
            .await
            .map_err(RepositoryError::from)?;
        if result.upserted_id.is_some() {
            info!("Invoice counter created with seq = {}", INITIAL_SEQ);
        } else {
            info!("Invoice counter already present");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn next_sequence(&self) -> RepositoryResult<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let previous = self
            .collection
            .find_one_and_update(doc! { "_id": COUNTER_ID }, doc! { "$inc": { "seq": 1_i64 } }, options)
            .await
            .map_err(RepositoryError::from)?;
        match previous {
            Some(counter) => read_seq(&counter),
            None => {
                error!("Invoice counter document is missing");
                Err(RepositoryError::not_found("Invoice counter has not been initialized"))
            }
        }
    }
}
