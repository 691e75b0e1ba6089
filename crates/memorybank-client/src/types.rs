//! Request and response types for the Memory Bank API.

use serde::{Deserialize, Deserializer, Serialize};

pub use memorybank_core::graph::{ConceptGraph, GraphData};
pub use memorybank_core::session::{Session, User};

/// Login/registration response: both tokens plus the user record.
pub type TokenResponse = Session;

/// Read an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Notes
// ─────────────────────────────────────────────────────────────────────────────

/// Concept extracted from a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptItem {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: String,
}

/// Relation between two extracted concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationItem {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub relation: String,
}

/// Full note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Serialized page rasters, see `PageRasterStore::serialize_all`.
    #[serde(default)]
    pub drawing_data: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concepts: Vec<ConceptItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Vec<RelationItem>,
    pub created_at: String,
    pub updated_at: String,
}

/// Note as it appears in the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteListItem {
    pub id: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concepts: Vec<ConceptItem>,
    pub created_at: String,
}

/// Request to create a note. Binary fields are base64 without a data-URL prefix.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
    pub thumbnail: String,
}

/// Request to update a note. `drawing_data` always replaces the whole field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EmailRegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoogleAuthRequest {
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}
