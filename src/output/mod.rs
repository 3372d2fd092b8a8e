//! Persisted artifacts

mod json;

pub use json::{artifact_timestamp, read_email_artifacts, JsonArtifactWriter};
