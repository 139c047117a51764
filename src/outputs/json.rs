//! JSON rendering.
//!
//! The outcome is serialized as a single object tagged by `status`:
//!
//! ```text
//! {"status": "results", "terms": "...", "generated_at": "...", "articles": [...]}
//! {"status": "no_results", "terms": "..."}
//! {"status": "usage_error"}
//! {"status": "failed", "terms": "...", "message": "..."}
//! ```

use crate::models::SearchOutcome;

/// Serialize an outcome as pretty-printed JSON.
pub fn render_document(outcome: &SearchOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}
