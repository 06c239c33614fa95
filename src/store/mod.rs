//! Durable entity storage
//!
//! Records are opaque JSON documents grouped into named collections. Each
//! collection is a directory beneath the data path and each record is one
//! file named after its numeric id.

pub mod entity;
pub mod error;

pub use entity::EntityStore;
pub use error::StoreError;
