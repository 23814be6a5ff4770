pub mod auth_middleware;
pub mod session_layer;
