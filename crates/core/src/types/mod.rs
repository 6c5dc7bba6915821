//! Core types for Threadbare.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod owner;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use owner::{OwnerKey, SessionKey, SessionKeyError};
pub use price::{Price, PriceError};
pub use status::{OrderStatus, OrderStatusError};
