//! Annotation controller: one open note, its annotation session and its PDF.
//!
//! The controller wires an [`AnnotationSession`] to the notes API. Saves are
//! single-flight: while one save is awaiting the server a second one is
//! rejected with [`AnnotateError::SaveInProgress`].

use kurbo::Size;
use memorybank_client::types::{Note, NoteUpdateRequest};
use memorybank_client::MemoryBankClient;
use memorybank_core::annotation::{AnnotationError, AnnotationSession, CaptureEffect, SessionConfig};
use memorybank_core::input::{PointerEvent, TouchEvent, WheelEvent};
use memorybank_core::tools::ToolKind;
use memorybank_core::InkColor;
use memorybank_render::{RenderError, generate_thumbnail};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::notify::{Notifier, Toast};
use crate::shortcuts::ShortcutRegistry;

/// Annotation controller errors.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Client(#[from] memorybank_client::Error),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("A save is already in progress")]
    SaveInProgress,
    #[error("Note {0} has no PDF")]
    NoPdf(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;

/// In-flight marker for a save. Cleared when dropped.
pub struct SaveFlag<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SaveFlag<'a> {
    /// Mark a save as started, or `None` if one is already running.
    pub fn try_begin(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SaveFlag<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Loading state of the note's PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfState {
    Loading,
    Ready(Vec<u8>),
    /// Fetch failed; the message is shown next to a retry action.
    Failed(String),
}

impl PdfState {
    pub fn is_ready(&self) -> bool {
        matches!(self, PdfState::Ready(_))
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            PdfState::Ready(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, PdfState::Failed(_))
    }
}

/// Partial tool change. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolChange {
    #[serde(default)]
    pub kind: Option<ToolKind>,
    /// `#RRGGBB` or `#RRGGBBAA`.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
}

/// One recorded input step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Pointer(PointerEvent),
    Touch(TouchEvent),
    Wheel(WheelEvent),
    Key(String),
    Tool(ToolChange),
    Page(u32),
    NextPage,
    PrevPage,
    /// Additive page zoom, as produced by the zoom buttons.
    Zoom(f64),
    Clear,
    Save,
}

fn default_page_count() -> u32 {
    1
}

/// A recorded input session, replayed by `memorybank annotate`.
///
/// ```json
/// {
///   "page_count": 2,
///   "steps": [
///     {"key": "p"},
///     {"pointer": {"phase": "down", "pointer_type": "pen", "position": {"x": 10, "y": 10}, "pressure": 0.6}},
///     {"pointer": {"phase": "up", "pointer_type": "pen", "position": {"x": 80, "y": 40}}},
///     "next_page",
///     "save"
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotationScript {
    #[serde(default = "default_page_count")]
    pub page_count: u32,
    #[serde(default)]
    pub page_size: Option<Size>,
    pub steps: Vec<ScriptStep>,
}

impl AnnotationScript {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// What a replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub strokes: usize,
    pub saves: usize,
    /// Page shown when the script ended.
    pub page: u32,
}

/// Controller for one open note.
pub struct AnnotationController {
    client: MemoryBankClient,
    note_id: String,
    session: Mutex<AnnotationSession>,
    saving: AtomicBool,
    pdf: PdfState,
    notifier: Arc<dyn Notifier>,
}

impl AnnotationController {
    /// Fetch the note and open an annotation session over its saved drawing data.
    pub async fn open(
        client: MemoryBankClient,
        note_id: &str,
        config: SessionConfig,
        notifier: Arc<dyn Notifier>,
    ) -> AnnotateResult<Self> {
        match Self::load_session(&client, note_id, config).await {
            Ok(session) => Ok(Self::with_session(client, note_id, session, notifier)),
            Err(e) => {
                // A 401 is already reported by the session's unauthorized hook
                let signed_out = matches!(&e, AnnotateError::Client(c) if c.is_unauthorized());
                if !signed_out {
                    notifier.notify(Toast::error("Failed to load note", e.to_string()));
                }
                Err(e)
            }
        }
    }

    async fn load_session(
        client: &MemoryBankClient,
        note_id: &str,
        config: SessionConfig,
    ) -> AnnotateResult<AnnotationSession> {
        let note = client.notes().get(note_id).await?;
        if note.pdf_url.is_none() {
            return Err(AnnotateError::NoPdf(note_id.to_string()));
        }
        let session = match note.drawing_data.as_deref() {
            Some(data) => AnnotationSession::with_drawing_data(config, data),
            None => AnnotationSession::new(config),
        };
        log::info!(
            "Opened note {} ({} annotated pages)",
            note_id,
            session.store().len()
        );
        Ok(session)
    }

    /// Wrap an already-built session.
    pub fn with_session(
        client: MemoryBankClient,
        note_id: &str,
        session: AnnotationSession,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            note_id: note_id.to_string(),
            session: Mutex::new(session),
            saving: AtomicBool::new(false),
            pdf: PdfState::Loading,
            notifier,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn pdf_state(&self) -> &PdfState {
        &self.pdf
    }

    /// Lock the session for direct inspection or input.
    pub fn session(&self) -> MutexGuard<'_, AnnotationSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the PDF with the session's bearer token.
    pub async fn load_pdf(&mut self) -> &PdfState {
        self.pdf = PdfState::Loading;
        self.pdf = match self.client.notes().fetch_pdf(&self.note_id).await {
            Ok(bytes) => PdfState::Ready(bytes),
            Err(e) => {
                log::warn!("Failed to load PDF for note {}: {}", self.note_id, e);
                self.notifier
                    .notify(Toast::error("Failed to load PDF", e.to_string()));
                PdfState::Failed(e.to_string())
            }
        };
        &self.pdf
    }

    /// Retry a failed PDF fetch. Any other state is left alone.
    pub async fn retry_pdf(&mut self) -> &PdfState {
        if self.pdf.can_retry() {
            log::info!("Retrying PDF fetch for note {}", self.note_id);
            return self.load_pdf().await;
        }
        &self.pdf
    }

    /// Flush the current page and send every page plus a fresh thumbnail.
    pub async fn save(&self) -> AnnotateResult<Note> {
        let Some(_flag) = SaveFlag::try_begin(&self.saving) else {
            log::debug!("Save of note {} already in flight", self.note_id);
            return Err(AnnotateError::SaveInProgress);
        };

        let request = match self.save_request() {
            Ok(request) => request,
            Err(e) => {
                self.notifier
                    .notify(Toast::error("Failed to save annotations", e.to_string()));
                return Err(e);
            }
        };

        match self.client.notes().update(&self.note_id, &request).await {
            Ok(note) => {
                self.notifier.notify(Toast::success("Annotations saved"));
                Ok(note)
            }
            Err(e) => {
                self.notifier
                    .notify(Toast::error("Failed to save annotations", e.to_string()));
                Err(e.into())
            }
        }
    }

    fn save_request(&self) -> AnnotateResult<NoteUpdateRequest> {
        let mut session = self.session();
        let drawing_data = session.save_payload()?;
        let thumbnail = generate_thumbnail(session.store())?;
        log::debug!(
            "Saving {} pages for note {}",
            session.store().len(),
            self.note_id
        );
        Ok(NoteUpdateRequest {
            drawing_data: Some(drawing_data),
            thumbnail: Some(thumbnail),
            ..Default::default()
        })
    }

    /// Replay a recorded script against the session.
    pub async fn replay(&self, script: &AnnotationScript) -> AnnotateResult<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        if let Some(size) = script.page_size {
            self.session().set_page_size(size)?;
        }
        for step in &script.steps {
            if let ScriptStep::Save = step {
                self.save().await?;
                summary.saves += 1;
            } else if self.apply(step)? {
                summary.strokes += 1;
            }
            summary.steps += 1;
        }
        summary.page = self.session().current_page();
        Ok(summary)
    }

    /// Apply one non-save step. Returns whether it finished a stroke.
    fn apply(&self, step: &ScriptStep) -> AnnotateResult<bool> {
        let mut session = self.session();
        match step {
            ScriptStep::Pointer(event) => {
                let effect = session.handle_pointer(event)?;
                return Ok(matches!(effect, CaptureEffect::Finished { .. }));
            }
            ScriptStep::Touch(event) => {
                session.handle_touch(event);
            }
            ScriptStep::Wheel(event) => {
                session.handle_wheel(event);
            }
            ScriptStep::Key(key) => {
                if let Some(action) = ShortcutRegistry::describe(session.handle_key(key)) {
                    log::debug!("Key {}: {}", key, action);
                }
            }
            ScriptStep::Tool(change) => {
                if let Some(kind) = change.kind {
                    session.set_tool_kind(kind);
                }
                if let Some(color) = &change.color {
                    let color = InkColor::from_hex(color)
                        .ok_or_else(|| AnnotateError::InvalidColor(color.clone()))?;
                    session.set_color(color);
                }
                if let Some(width) = change.width {
                    session.set_width(width);
                }
            }
            ScriptStep::Page(page) => session.go_to_page(*page)?,
            ScriptStep::NextPage => {
                session.next_page()?;
            }
            ScriptStep::PrevPage => {
                session.prev_page()?;
            }
            ScriptStep::Zoom(delta) => {
                if session.zoom_by(*delta) {
                    log::debug!("Page scale {:.2}", session.viewport().scale);
                }
            }
            ScriptStep::Clear => session.clear_page(),
            ScriptStep::Save => {}
        }
        Ok(false)
    }
}
