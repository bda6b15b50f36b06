//! Infrastructure services

mod seed_validation_service;

pub use seed_validation_service::SeedValidationService;
