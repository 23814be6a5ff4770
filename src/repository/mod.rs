pub mod counter_repo;
pub mod invoice_repo;
pub mod mongo_client;
pub mod repository_error;
pub mod session_repo;
pub mod user_repo;
