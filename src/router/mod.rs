pub mod invoice_router;
pub mod page_router;
pub mod user_router;
