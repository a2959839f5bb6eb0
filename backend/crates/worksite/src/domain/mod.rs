//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Object, Work, WorkImage, Review)
//! - Domain value objects (Rating, WorkAction, ObjectStats, ImageUpload)
//! - Domain services (the work status engine)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
