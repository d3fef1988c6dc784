use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use artesanal::config::{MailConfig, MailTlsMode};
use artesanal::contest::store::EntryStore;
use artesanal::contest::{
    DispatchError, EmailMessage, Entry, EntryDetails, EntryId, NotificationDispatcher, StoreError,
    TrackingCode,
};
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process entry store. Insertion is the serialization point: the code
/// uniqueness check and the insert happen under one lock, and issued codes
/// stay retired after deletion so they are never handed out again.
#[derive(Default)]
pub(crate) struct InMemoryEntryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    entries: BTreeMap<u64, Entry>,
    issued_codes: HashSet<String>,
}

impl EntryStore for InMemoryEntryStore {
    fn create(&self, details: EntryDetails) -> Result<Entry, StoreError> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        if !inner
            .issued_codes
            .insert(details.tracking_code.as_str().to_string())
        {
            return Err(StoreError::ConstraintViolation);
        }
        inner.next_id += 1;
        let entry = Entry {
            id: EntryId(inner.next_id),
            submitted_at: Utc::now(),
            details,
        };
        inner.entries.insert(entry.id.0, entry.clone());
        Ok(entry)
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner.entries.get(&id.0).cloned())
    }

    fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner.entries.values().cloned().collect())
    }

    fn delete(&self, id: EntryId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        inner
            .entries
            .remove(&id.0)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn exists_by_code(&self, code: &TrackingCode) -> Result<bool, StoreError> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner.issued_codes.contains(code.as_str()))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("entry store mutex poisoned".to_string())
}

/// Either a real SMTP transport or a log-only stand-in, picked once at
/// startup from the mail configuration.
pub(crate) enum MailDispatcher {
    Smtp(SmtpDispatcher),
    Logging(LoggingDispatcher),
}

impl NotificationDispatcher for MailDispatcher {
    fn dispatch(&self, message: EmailMessage) -> Result<(), DispatchError> {
        match self {
            MailDispatcher::Smtp(dispatcher) => dispatcher.dispatch(message),
            MailDispatcher::Logging(dispatcher) => dispatcher.dispatch(message),
        }
    }
}

/// SMTP-backed dispatcher built from [`MailConfig`]. One blocking send per
/// call, bounded by the configured timeout; no internal retries.
pub(crate) struct SmtpDispatcher {
    transport: SmtpTransport,
    sender: String,
    timeout: Duration,
}

impl SmtpDispatcher {
    pub(crate) fn from_config(config: &MailConfig) -> Result<Self, DispatchError> {
        let builder = match config.tls {
            MailTlsMode::None => SmtpTransport::builder_dangerous(&config.host),
            MailTlsMode::StartTls => {
                let params = TlsParameters::new(config.host.clone()).map_err(transport_error)?;
                SmtpTransport::builder_dangerous(&config.host).tls(Tls::Required(params))
            }
            MailTlsMode::Implicit => {
                let params = TlsParameters::new(config.host.clone()).map_err(transport_error)?;
                SmtpTransport::builder_dangerous(&config.host).tls(Tls::Wrapper(params))
            }
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            transport,
            sender: config.sender.clone(),
            timeout: config.timeout,
        })
    }
}

impl NotificationDispatcher for SmtpDispatcher {
    fn dispatch(&self, message: EmailMessage) -> Result<(), DispatchError> {
        let from = self
            .sender
            .parse()
            .map_err(|_| DispatchError::Recipient(self.sender.clone()))?;
        let to = message
            .to
            .parse()
            .map_err(|_| DispatchError::Recipient(message.to.clone()))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html_body));
        if let Some(attachment) = message.attachment {
            let content_type = ContentType::parse(attachment.content_type.as_ref())
                .map_err(|err| DispatchError::Transport(err.to_string()))?;
            body = body.singlepart(
                Attachment::new(attachment.filename).body(attachment.bytes, content_type),
            );
        }

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .multipart(body)
            .map_err(|err| DispatchError::Transport(err.to_string()))?;

        self.transport.send(&email).map_err(|err| {
            if err.is_timeout() {
                DispatchError::Timeout(self.timeout)
            } else {
                DispatchError::Transport(err.to_string())
            }
        })?;
        Ok(())
    }
}

fn transport_error(err: lettre::transport::smtp::Error) -> DispatchError {
    DispatchError::Transport(err.to_string())
}

/// Dispatcher used when no mail block is configured: the confirmation is
/// logged and dropped so local submissions still complete.
#[derive(Default)]
pub(crate) struct LoggingDispatcher;

impl NotificationDispatcher for LoggingDispatcher {
    fn dispatch(&self, message: EmailMessage) -> Result<(), DispatchError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachment = message.attachment.as_ref().map(|a| a.filename.as_str()),
            "mail transport not configured; confirmation logged instead of sent"
        );
        Ok(())
    }
}
