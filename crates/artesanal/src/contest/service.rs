use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::allocator::{AllocationError, CodeAllocator};
use super::entry::{Entry, EntryId, EntryView, TrackingCode};
use super::export;
use super::form::{SubmissionForm, ValidationError};
use super::notify::{EmailAttachment, EmailMessage, NotificationDispatcher};
use super::render::{self, BrandingAsset, RenderError, DOCUMENT_FILENAME};
use super::store::{EntryStore, StoreError};

/// How many times `submit` redraws a code after the store rejects an
/// insert for uniqueness. Each redraw runs a full bounded allocation, so
/// this only triggers when two workers race on the same candidate.
const CREATE_RETRY_LIMIT: usize = 3;

/// Use-case controller tying allocation, persistence, rendering, and
/// notification together. Persistence comes first: once an entry is
/// stored, downstream failures degrade the receipt status instead of
/// failing the submission.
pub struct SubmissionService<S, N> {
    store: Arc<S>,
    dispatcher: Arc<N>,
    allocator: CodeAllocator,
    branding_path: PathBuf,
}

impl<S, N> SubmissionService<S, N>
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<N>, branding_path: PathBuf) -> Self {
        Self::with_allocator(store, dispatcher, CodeAllocator::new(), branding_path)
    }

    pub fn with_allocator(
        store: Arc<S>,
        dispatcher: Arc<N>,
        allocator: CodeAllocator,
        branding_path: PathBuf,
    ) -> Self {
        Self {
            store,
            dispatcher,
            allocator,
            branding_path,
        }
    }

    /// Accept one submission end-to-end.
    pub fn submit(&self, form: SubmissionForm) -> Result<SubmissionReceipt, SubmissionError> {
        let validated = form.validate()?;
        let email = validated.email.clone();

        let entry = self.persist(validated)?;
        info!(id = %entry.id, code = %entry.tracking_code(), "entry persisted");

        let document = match self.render(&entry) {
            Ok(document) => document,
            Err(err) => {
                error!(id = %entry.id, %err, "certificate rendering failed after persistence");
                return Ok(SubmissionReceipt::degraded(
                    &entry,
                    SubmissionStatus::DocumentFailed {
                        detail: err.to_string(),
                    },
                ));
            }
        };

        let message = confirmation_message(&entry, email, document.clone());
        if let Err(err) = self.dispatcher.dispatch(message) {
            warn!(id = %entry.id, %err, "confirmation dispatch failed after persistence");
            return Ok(SubmissionReceipt {
                id: entry.id,
                tracking_code: entry.tracking_code().clone(),
                status: SubmissionStatus::NotificationFailed {
                    detail: err.to_string(),
                },
                document: Some(document),
            });
        }

        Ok(SubmissionReceipt {
            id: entry.id,
            tracking_code: entry.tracking_code().clone(),
            status: SubmissionStatus::Confirmed,
            document: Some(document),
        })
    }

    /// Allocate a code and insert, redrawing when a concurrent submission
    /// wins the same candidate. The store's uniqueness constraint is the
    /// arbiter; the allocator's existence check is only a fast path.
    fn persist(
        &self,
        validated: super::form::ValidatedSubmission,
    ) -> Result<Entry, SubmissionError> {
        for attempt in 0..CREATE_RETRY_LIMIT {
            let code = self.allocator.allocate(self.store.as_ref())?;
            let details = validated.clone().into_details(code);
            match self.store.create(details) {
                Ok(entry) => return Ok(entry),
                Err(StoreError::ConstraintViolation) => {
                    warn!(attempt, "tracking code lost to a concurrent insert; redrawing");
                    continue;
                }
                Err(other) => return Err(SubmissionError::Storage(other)),
            }
        }
        Err(SubmissionError::Storage(StoreError::ConstraintViolation))
    }

    fn render(&self, entry: &Entry) -> Result<Vec<u8>, RenderError> {
        let branding = BrandingAsset::load(&self.branding_path)?;
        render::render(entry, &branding)
    }

    /// Re-render the certificate for an existing entry (download on
    /// demand; nothing is re-sent).
    pub fn document(&self, id: EntryId) -> Result<Vec<u8>, SubmissionError> {
        let entry = self.entry(id)?;
        Ok(self.render(&entry)?)
    }

    pub fn entry(&self, id: EntryId) -> Result<Entry, SubmissionError> {
        self.store
            .get(id)?
            .ok_or(SubmissionError::Storage(StoreError::NotFound))
    }

    pub fn entries(&self) -> Result<Vec<EntryView>, SubmissionError> {
        Ok(self.store.list_all()?.iter().map(Entry::view).collect())
    }

    /// Serialize every entry as spreadsheet rows, id ascending.
    pub fn export(&self) -> Result<Vec<u8>, SubmissionError> {
        let entries = self.store.list_all()?;
        let mut buffer = Vec::new();
        export::write_csv(&entries, &mut buffer)
            .map_err(|err| SubmissionError::Export(err.to_string()))?;
        Ok(buffer)
    }

    /// Permanent removal. Repeating the call reports `NotFound` again.
    pub fn delete(&self, id: EntryId) -> Result<(), SubmissionError> {
        self.store.delete(id)?;
        info!(%id, "entry deleted");
        Ok(())
    }
}

fn confirmation_message(entry: &Entry, email: String, document: Vec<u8>) -> EmailMessage {
    EmailMessage {
        to: email,
        subject: "Confirmação de Inscrição".to_string(),
        html_body: format!(
            "<p>Sua inscrição foi confirmada.</p>\
             <p>Código de inscrição: <b>{}</b></p>",
            entry.tracking_code()
        ),
        attachment: Some(EmailAttachment {
            filename: DOCUMENT_FILENAME.to_string(),
            content_type: mime::APPLICATION_PDF,
            bytes: document,
        }),
    }
}

/// Terminal outcome of an accepted submission. Anything other than
/// `Confirmed` still means the entry is durably saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Confirmed,
    DocumentFailed { detail: String },
    NotificationFailed { detail: String },
}

impl SubmissionStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Confirmed => "confirmed",
            SubmissionStatus::DocumentFailed { .. } => "document_failed",
            SubmissionStatus::NotificationFailed { .. } => "notification_failed",
        }
    }
}

/// What the caller gets back for a persisted submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub id: EntryId,
    pub tracking_code: TrackingCode,
    pub status: SubmissionStatus,
    /// Rendered certificate, present unless rendering failed.
    pub document: Option<Vec<u8>>,
}

impl SubmissionReceipt {
    fn degraded(entry: &Entry, status: SubmissionStatus) -> Self {
        Self {
            id: entry.id,
            tracking_code: entry.tracking_code().clone(),
            status,
            document: None,
        }
    }
}

/// Error raised by the submission service. `Validation` is the only
/// user-correctable kind; the rest indicate infrastructure or keyspace
/// trouble and nothing was persisted when `submit` returns them.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("export serialization failed: {0}")]
    Export(String),
}
