pub mod error;
pub mod lifecycle;
pub mod maintenance_service;
pub mod notification_service;
pub mod verification_service;
