//! Data Transfer Objects for request/response serialization.
//!
//! Decoding an [`EventBatch`] is the structural validation step; encoding
//! it back is the canonicalization step.

pub mod webhook_dto;

pub use webhook_dto::*;
