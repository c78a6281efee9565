//! Core domain types
//!
//! This module contains the records exchanged with the management API.
//! They are shared between the codec (which builds and reads them) and the
//! client (which puts them on the wire).

pub mod pipeline;
pub mod policy;
