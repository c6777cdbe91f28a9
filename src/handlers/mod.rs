pub mod api_handlers;
pub mod consent_handlers;
pub mod health_handlers;
pub mod page_handlers;
pub mod qr_handlers;
