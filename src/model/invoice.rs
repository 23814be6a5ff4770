//! Invoice documents.
//!
//! Invoices carry caller-defined billing fields. Only a handful of keys are
//! read by the server: `total` and `amountPaid` feed the monthly stats,
//! `name` and `address` are searchable. `_id`, `created_at` and `updated_at`
//! are owned by the server and lifted out of the field map.

use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const ID: &str = "_id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const TOTAL: &str = "total";
pub const AMOUNT_PAID: &str = "amountPaid";
pub const NAME: &str = "name";
pub const ADDRESS: &str = "address";

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: ObjectId,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Everything the caller supplied, minus the server-owned keys.
    pub fields: Document,
}

impl Invoice {
    pub fn total(&self) -> f64 {
        self.number(TOTAL)
    }

    pub fn amount_paid(&self) -> f64 {
        self.number(AMOUNT_PAID)
    }

    /// Numeric value of a field; absent or non-numeric values read as 0.
    pub fn number(&self, key: &str) -> f64 {
        match self.fields.get(key) {
            Some(Bson::Double(v)) => *v,
            Some(Bson::Int32(v)) => f64::from(*v),
            Some(Bson::Int64(v)) => *v as f64,
            Some(Bson::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get_str(key).ok()
    }
}

/// Drop keys the server owns so callers cannot overwrite them.
pub fn strip_server_fields(fields: &mut Document) {
    fields.remove(ID);
    fields.remove(CREATED_AT);
    fields.remove(UPDATED_AT);
}

fn take_timestamp(doc: &mut Document, key: &str) -> Option<DateTime<Utc>> {
    match doc.remove(key) {
        Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
        Some(other) => {
            // keep legacy non-date values visible rather than dropping them
            doc.insert(key, other);
            None
        }
        None => None,
    }
}

impl TryFrom<Document> for Invoice {
    type Error = bson::document::ValueAccessError;

    fn try_from(mut doc: Document) -> Result<Self, Self::Error> {
        let id = doc.get_object_id(ID)?;
        doc.remove(ID);
        let created_at = take_timestamp(&mut doc, CREATED_AT);
        let updated_at = take_timestamp(&mut doc, UPDATED_AT);
        Ok(Invoice {
            id,
            created_at,
            updated_at,
            fields: doc,
        })
    }
}

impl Serialize for Invoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        map.serialize_entry(ID, &self.id.to_hex())?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, &value.clone().into_relaxed_extjson())?;
        }
        if let Some(created_at) = self.created_at {
            map.serialize_entry(CREATED_AT, &created_at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        }
        if let Some(updated_at) = self.updated_at {
            map.serialize_entry(UPDATED_AT, &updated_at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        }
        map.end()
    }
}
