//! Data Transfer Objects for the management API
//!
//! This module contains the request and response envelopes exchanged with the
//! management service. The records they carry live in [`crate::domain`].

pub mod pipeline;
pub mod policy;
