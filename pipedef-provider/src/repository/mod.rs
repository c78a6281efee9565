//! Repository layer
//!
//! Repositories abstract the remote calls each resource makes. They are thin
//! and carry no business logic; `ManagementClient` implements all of them.
//!
//! All repositories are trait-based to enable testing and mocking.

mod definitions;
mod policies;

// Re-export traits
pub use definitions::DefinitionRepository;
pub use policies::ResourcePolicyRepository;
