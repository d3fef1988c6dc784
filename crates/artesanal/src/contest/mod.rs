//! Contest entry intake: validation, code allocation, persistence,
//! certificate rendering, and notification.

pub mod allocator;
pub mod entry;
pub mod export;
pub mod form;
pub mod notify;
pub mod render;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use allocator::{AllocationError, CodeAllocator};
pub use entry::{Category, Entry, EntryDetails, EntryId, EntryView, TrackingCode};
pub use export::{read_csv, write_csv, EXPORT_CONTENT_TYPE, EXPORT_FILENAME};
pub use form::{SubmissionForm, ValidationError};
pub use notify::{DispatchError, EmailAttachment, EmailMessage, NotificationDispatcher};
pub use render::{BrandingAsset, RenderError, DOCUMENT_CONTENT_TYPE, DOCUMENT_FILENAME};
pub use router::contest_router;
pub use service::{SubmissionError, SubmissionReceipt, SubmissionService, SubmissionStatus};
pub use store::{EntryStore, StoreError};
