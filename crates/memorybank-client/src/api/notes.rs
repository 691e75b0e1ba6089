//! Notes API.

use url::Url;

use crate::client::MemoryBankClient;
use crate::error::Result;
use crate::types::{DeleteResponse, Note, NoteCreateRequest, NoteListItem, NoteUpdateRequest};

/// Notes API client.
pub struct NotesApi {
    client: MemoryBankClient,
}

impl NotesApi {
    pub(crate) fn new(client: MemoryBankClient) -> Self {
        Self { client }
    }

    /// List all notes of the signed-in user.
    pub async fn list(&self) -> Result<Vec<NoteListItem>> {
        self.client.get(&["notes"]).await
    }

    pub async fn get(&self, id: &str) -> Result<Note> {
        self.client.get(&["notes", id]).await
    }

    pub async fn create(&self, request: &NoteCreateRequest) -> Result<Note> {
        self.client.post(&["notes"], request).await
    }

    /// Update a note. Every field that is set replaces the stored value.
    pub async fn update(&self, id: &str, request: &NoteUpdateRequest) -> Result<Note> {
        self.client.put(&["notes", id], request).await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResponse> {
        self.client.delete(&["notes", id]).await
    }

    /// Address of the note's PDF: `{base}/uploads/{id}/pdf`.
    pub fn pdf_url(&self, id: &str) -> Result<Url> {
        self.client.url(&["uploads", id, "pdf"])
    }

    /// Download the note's PDF bytes.
    pub async fn fetch_pdf(&self, id: &str) -> Result<Vec<u8>> {
        let bytes = self.client.get_bytes(&["uploads", id, "pdf"]).await?;
        log::debug!("Fetched {} byte PDF for note {}", bytes.len(), id);
        Ok(bytes)
    }
}
