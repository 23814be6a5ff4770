#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use bson::{oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tower_sessions::MemoryStore;

use billing_backend::app::app::{create_router, AppServices};
use billing_backend::config::session_conf::{SessionConfig, DEFAULT_INACTIVITY_MINUTES};
use billing_backend::middlewares::session_layer::create_session_layer;
use billing_backend::model::invoice::{self, Invoice};
use billing_backend::model::user::User;
use billing_backend::repository::counter_repo::{InvoiceCounterRepository, INITIAL_SEQ};
use billing_backend::repository::invoice_repo::{InvoiceQuery, InvoiceRepository};
use billing_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use billing_backend::repository::user_repo::UserRepository;
use billing_backend::service::invoice_service::InvoiceServiceImpl;
use billing_backend::service::stats_service::StatsServiceImpl;
use billing_backend::service::user_service::UserServiceImpl;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.mobile) {
            return Err(RepositoryError::already_exists("mobile already registered"));
        }
        user.id = Some(ObjectId::new());
        user.created_at = Some(Utc::now().to_rfc3339());
        users.insert(user.mobile.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_mobile(&self, mobile: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(mobile).cloned())
    }
}

/// Keeps insertion order, like an unsorted collection scan.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Mutex<Vec<Invoice>>,
}

fn contains_ci(haystack: Option<&str>, needle: &Option<String>) -> bool {
    match needle.as_deref().filter(|n| !n.is_empty()) {
        None => true,
        Some(needle) => haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
    }
}

fn matches(invoice: &Invoice, query: &InvoiceQuery) -> bool {
    let in_range = match (&query.created, invoice.created_at) {
        (None, _) => true,
        (Some(range), Some(created_at)) => range.contains(created_at),
        (Some(_), None) => false,
    };
    in_range
        && contains_ci(invoice.text(invoice::NAME), &query.name)
        && contains_ci(invoice.text(invoice::ADDRESS), &query.address)
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, mut fields: Document, created_at: DateTime<Utc>) -> RepositoryResult<ObjectId> {
        invoice::strip_server_fields(&mut fields);
        let id = ObjectId::new();
        self.invoices.lock().unwrap().push(Invoice {
            id,
            created_at: Some(created_at),
            updated_at: None,
            fields,
        });
        Ok(id)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Invoice> {
        self.invoices
            .lock()
            .unwrap()
            .iter()
            .find(|invoice| invoice.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Invoice not found for ID: {}", id)))
    }

    async fn update(&self, id: ObjectId, mut fields: Document, updated_at: DateTime<Utc>) -> RepositoryResult<()> {
        invoice::strip_server_fields(&mut fields);
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .iter_mut()
            .find(|invoice| invoice.id == id)
            .ok_or_else(|| RepositoryError::not_found(format!("No invoice found to update for ID: {}", id)))?;
        for (key, value) in fields {
            invoice.fields.insert(key, value);
        }
        invoice.updated_at = Some(updated_at);
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|invoice| invoice.id != id);
        if invoices.len() == before {
            return Err(RepositoryError::not_found(format!("No invoice found to delete for ID: {}", id)));
        }
        Ok(())
    }

    async fn find(&self, query: &InvoiceQuery) -> RepositoryResult<Vec<Invoice>> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|invoice| matches(invoice, query))
            .cloned()
            .collect())
    }
}

/// `seq` is the next value to hand out, as in the stored counter.
pub struct InMemoryCounterRepository {
    seq: AtomicI64,
}

impl InMemoryCounterRepository {
    pub fn starting_at(seq: i64) -> Self {
        InMemoryCounterRepository { seq: AtomicI64::new(seq) }
    }
}

impl Default for InMemoryCounterRepository {
    fn default() -> Self {
        InMemoryCounterRepository::starting_at(INITIAL_SEQ)
    }
}

#[async_trait]
impl InvoiceCounterRepository for InMemoryCounterRepository {
    async fn ensure_initialized(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn next_sequence(&self) -> RepositoryResult<i64> {
        Ok(self.seq.fetch_add(1, Ordering::SeqCst))
    }
}

pub struct TestContext {
    pub invoice_repo: Arc<InMemoryInvoiceRepository>,
    pub services: AppServices,
}

pub fn test_context() -> TestContext {
    let user_repo = Arc::new(InMemoryUserRepository::default());
    let invoice_repo = Arc::new(InMemoryInvoiceRepository::default());
    let counter_repo = Arc::new(InMemoryCounterRepository::default());
    let services = AppServices {
        user_service: Arc::new(UserServiceImpl::new(user_repo)),
        invoice_service: Arc::new(InvoiceServiceImpl::new(invoice_repo.clone(), counter_repo)),
        stats_service: Arc::new(StatsServiceImpl::new(invoice_repo.clone())),
    };
    TestContext { invoice_repo, services }
}

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        secret: "k".repeat(64),
        cookie_name: "billing_session".to_string(),
        secure: false,
        inactivity_minutes: DEFAULT_INACTIVITY_MINUTES,
    }
}

/// Full router over in-memory repositories, with the production session layer on a memory store.
pub fn test_app(context: &TestContext) -> Router {
    let layer = create_session_layer(MemoryStore::default(), &test_session_config()).expect("test session config");
    create_router(&context.services).layer(layer)
}
