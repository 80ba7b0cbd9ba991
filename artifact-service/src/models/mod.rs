//! Domain models for the artifact service.

pub mod artifact;
pub mod envelope;
pub mod request;

pub use artifact::{storage_key, Artifact, ArtifactKind};
pub use envelope::{HandlerResponse, ProxyEvent};
pub use request::{CodeRequest, ImageRequest};
