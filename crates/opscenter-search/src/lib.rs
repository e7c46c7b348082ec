//! Managed search integration.
//!
//! - [`importer`]: hands stored documents to the Discovery Engine
//!   (Vertex AI Search) import API and waits for the long-running operation.
//! - [`backend`]: the query seam behind `POST /docs/query`. No search
//!   backend is wired yet, so [`UnintegratedSearch`] answers every query
//!   with zero citations.

pub mod backend;
pub mod error;
pub mod importer;

pub use backend::{SearchAnswer, SearchBackend, UnintegratedSearch};
pub use error::SearchError;
pub use importer::{DocumentImporter, TokenSource, VertexImporter};
