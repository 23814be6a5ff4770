pub mod app;

pub use app::{create_router, App, AppServices};
