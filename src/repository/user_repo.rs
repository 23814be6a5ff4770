use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{options::IndexOptions, Collection, Database, IndexModel};
use tracing::{error, info, instrument};

use crate::model::user::User;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

pub const USERS_COLLECTION: &str = "users";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_mobile(&self, mobile: &str) -> RepositoryResult<Option<User>>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        MongoUserRepository {
            collection: db.collection::<User>(USERS_COLLECTION),
        }
    }

    /// Unique index on `mobile`; a racing second registration fails with a duplicate key.
    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "mobile": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index, None).await.map_err(RepositoryError::from)?;
        info!("Unique index on users.mobile ensured");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(mobile = %user.mobile))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        user.created_at = Some(chrono::Utc::now().to_rfc3339());
        match self.collection.insert_one(&user, None).await {
            Ok(_) => {
                info!("User inserted");
                Ok(user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    async fn find_by_mobile(&self, mobile: &str) -> RepositoryResult<Option<User>> {
        let filter = doc! { "mobile": mobile };
        self.collection
            .find_one(filter, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by mobile: {}", e)))
    }
}
