//! MongoDB-backed session records for `tower-sessions`.
//!
//! A TTL index on `expiry_date` lets the server drop expired sessions, so the
//! collection only holds sessions that are still usable.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::{
    options::{IndexOptions, ReplaceOptions},
    Collection, Database, IndexModel,
};
use std::collections::HashMap;
use std::time::Duration;
use tower_sessions::{
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store::{self, SessionStore},
};
use tracing::{debug, info};

use crate::repository::repository_error::{is_duplicate_key, RepositoryError, RepositoryResult};

pub const SESSIONS_COLLECTION: &str = "sessions";

const EXPIRY_DATE: &str = "expiry_date";
const DATA: &str = "data";

#[derive(Debug, Clone)]
pub struct MongoSessionStore {
    collection: Collection<Document>,
}

impl MongoSessionStore {
    pub fn new(db: &Database) -> Self {
        MongoSessionStore {
            collection: db.collection::<Document>(SESSIONS_COLLECTION),
        }
    }

    /// TTL index: MongoDB removes a session once `expiry_date` has passed.
    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "expiry_date": 1 })
            .options(IndexOptions::builder().expire_after(Duration::from_secs(0)).build())
            .build();
        self.collection.create_index(index, None).await.map_err(RepositoryError::from)?;
        info!("TTL index on sessions.expiry_date ensured");
        Ok(())
    }
}

fn backend(err: mongodb::error::Error) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

fn to_bson_date(instant: OffsetDateTime) -> bson::DateTime {
    bson::DateTime::from_millis((instant.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn from_bson_date(date: bson::DateTime) -> session_store::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(date.timestamp_millis()) * 1_000_000)
        .map_err(|e| session_store::Error::Decode(e.to_string()))
}

fn record_to_document(record: &Record) -> session_store::Result<Document> {
    let data = bson::to_bson(&record.data).map_err(|e| session_store::Error::Encode(e.to_string()))?;
    Ok(doc! {
        "_id": record.id.to_string(),
        "data": data,
        "expiry_date": to_bson_date(record.expiry_date),
    })
}

fn document_to_record(id: Id, stored: Document) -> session_store::Result<Record> {
    let decode = |e: String| session_store::Error::Decode(e);
    let data = match stored.get(DATA) {
        Some(Bson::Document(data)) => {
            bson::from_document::<HashMap<String, serde_json::Value>>(data.clone()).map_err(|e| decode(e.to_string()))?
        }
        _ => HashMap::new(),
    };
    let expiry_date = stored.get_datetime(EXPIRY_DATE).map_err(|e| decode(e.to_string()))?;
    Ok(Record {
        id,
        data,
        expiry_date: from_bson_date(*expiry_date)?,
    })
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            match self.collection.insert_one(record_to_document(record)?, None).await {
                Ok(_) => return Ok(()),
                Err(e) if is_duplicate_key(&e) => {
                    debug!("Session id collision, drawing a new one");
                    record.id = Id::default();
                }
                Err(e) => return Err(backend(e)),
            }
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "_id": record.id.to_string() }, record_to_document(record)?, options)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        // the TTL monitor runs about once a minute, so filter on expiry too
        let filter = doc! {
            "_id": session_id.to_string(),
            "expiry_date": { "$gt": bson::DateTime::now() },
        };
        match self.collection.find_one(filter, None).await.map_err(backend)? {
            Some(stored) => document_to_record(*session_id, stored).map(Some),
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.collection
            .delete_one(doc! { "_id": session_id.to_string() }, None)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
