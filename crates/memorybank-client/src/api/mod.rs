//! API endpoint implementations.

mod auth;
mod graph;
mod notes;

pub use auth::AuthApi;
pub use graph::GraphApi;
pub use notes::NotesApi;
