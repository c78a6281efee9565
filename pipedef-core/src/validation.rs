//! Validation error aggregation
//!
//! The service reports validation failures per object. They are folded into a
//! single composite error whose text embeds every object id followed by its
//! messages, in the order the service returned them.

use thiserror::Error;

use crate::domain::pipeline::ValidationError;

/// Composite of every validation error in a submission response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.entries))]
pub struct ValidationErrors {
    entries: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Aggregates a batch of per-object errors
    ///
    /// Returns `None` when the batch is empty.
    pub fn aggregate(errors: &[ValidationError]) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }

        Some(Self {
            entries: errors.to_vec(),
        })
    }

    /// The per-object errors, in reported order
    pub fn entries(&self) -> &[ValidationError] {
        &self.entries
    }

    /// Whether the aggregated text contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }
}

fn render(entries: &[ValidationError]) -> String {
    entries
        .iter()
        .map(|entry| format!("id: {}, error: [{}]", entry.id, entry.errors.join("; ")))
        .collect::<Vec<_>>()
        .join("\n")
}
