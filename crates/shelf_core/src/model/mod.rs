//! Persistent entity model.
//!
//! # Responsibility
//! - Define the value holders stored by the data-access layer.
//! - Describe how each entity maps onto its table (`Entity`).
//!
//! # Invariants
//! - Identity is `None` while transient and assigned by the store on first
//!   persist; it never changes afterwards.

pub mod author;
pub mod book;
pub mod entity;
