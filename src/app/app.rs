use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, MongoConfig, SessionConfig};
use crate::middlewares::session_layer::create_session_layer;
use crate::repository::counter_repo::{InvoiceCounterRepository, MongoInvoiceCounterRepository};
use crate::repository::invoice_repo::MongoInvoiceRepository;
use crate::repository::mongo_client;
use crate::repository::session_repo::MongoSessionStore;
use crate::repository::user_repo::MongoUserRepository;
use crate::router::invoice_router::invoice_router;
use crate::router::page_router::page_router;
use crate::router::user_router::user_router;
use crate::service::invoice_service::InvoiceServiceImpl;
use crate::service::stats_service::StatsServiceImpl;
use crate::service::user_service::UserServiceImpl;

pub type AppError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct AppServices {
    pub user_service: Arc<UserServiceImpl>,
    pub invoice_service: Arc<InvoiceServiceImpl>,
    pub stats_service: Arc<StatsServiceImpl>,
}

/// All routes, without the session layer.
pub fn create_router(services: &AppServices) -> Router {
    Router::new()
        .merge(user_router(services.user_service.clone()))
        .merge(page_router(services.stats_service.clone()))
        .merge(invoice_router(services.invoice_service.clone()))
        .route("/health", get(|| async { "OK" }))
}

/// Bind `APP_HOST:APP_PORT`; the host may be an IP address or a resolvable name.
pub async fn bind(config: &AppConfig) -> std::io::Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port)).await
}

pub struct App {
    pub config: AppConfig,
    pub router: Router,
}

impl App {
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;
        let session_config = SessionConfig::from_env()?;

        let db = mongo_client::connect(&mongo_config).await?;

        let user_repo = Arc::new(MongoUserRepository::new(&db));
        user_repo.ensure_indexes().await?;
        let counter_repo = Arc::new(MongoInvoiceCounterRepository::new(&db));
        counter_repo.ensure_initialized().await?;
        let invoice_repo = Arc::new(MongoInvoiceRepository::new(&db));

        let services = AppServices {
            user_service: Arc::new(UserServiceImpl::new(user_repo)),
            invoice_service: Arc::new(InvoiceServiceImpl::new(invoice_repo.clone(), counter_repo)),
            stats_service: Arc::new(StatsServiceImpl::new(invoice_repo)),
        };
        let session_store = MongoSessionStore::new(&db);
        session_store.ensure_indexes().await?;
        let session_layer = create_session_layer(session_store, &session_config)?;

        let router = create_router(&services)
            .layer(session_layer)
            .layer(TraceLayer::new_for_http());
        Ok(App { config, router })
    }

    pub async fn start(self) -> Result<(), AppError> {
        let listener = bind(&self.config).await?;
        info!("🚀 Server running at http://{}", listener.local_addr()?);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
