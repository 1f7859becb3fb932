//! Domain layer - Pure plant HAL model with no I/O
//!
//! This crate contains:
//! - Register addressing helpers
//! - Bus description and the protocol-client / register-bus ports
//! - Device kinds, capabilities and the `FieldDevice` port
//! - Tag definitions, quality and live values
//! - HAL events and the publisher port
//!
//! Principles:
//! - No dependencies on infrastructure or an async runtime
//! - Configuration mistakes surface as `DomainError` at construction
//! - Runtime I/O failures are values (`Option`/`bool`), never errors

pub mod addressing;
pub mod bus;
pub mod device;
pub mod error;
pub mod event;
pub mod tag;

// Re-export commonly used types
pub use error::DomainError;
pub use event::{DropReason, HalEvent};
pub use tag::{TagQuality, TagValue};
