//! Pipedef Core
//!
//! Core types and the structural codec for the pipedef provider.
//!
//! This crate contains:
//! - Domain types: Pipeline definition records and the organization resource policy
//! - DTOs: Request and response envelopes exchanged with the management API
//! - Schema: The attribute-bag surface each resource exposes, with plan-time validation
//! - Codec: Expand (attribute bag -> domain record) and flatten (domain record -> attribute bag)
//! - Validation: Aggregation of vendor-reported validation errors

pub mod codec;
pub mod domain;
pub mod dto;
pub mod schema;
pub mod validation;

/// Generic attribute bag: the loosely-typed map the host framework hands to a resource.
pub type Bag = serde_json::Map<String, serde_json::Value>;
