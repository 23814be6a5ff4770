use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub mobile: String,
    pub password_hash: String,
    pub created_at: Option<String>,
}

impl User {
    pub fn new(mobile: String, password_hash: String) -> Self {
        User {
            id: None,
            mobile,
            password_hash,
            created_at: None,
        }
    }

    /// Hex form of the id, as stored in the session.
    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }
}
