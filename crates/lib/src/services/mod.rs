//! Clients for external collaborator services.

pub mod rag;

pub use rag::{QueryMode, RagClient, RagError};
