use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::contest::entry::{Entry, EntryDetails, EntryId, TrackingCode};
use crate::contest::form::SubmissionForm;
use crate::contest::notify::{DispatchError, EmailMessage, NotificationDispatcher};
use crate::contest::render::tiny_jpeg;
use crate::contest::service::SubmissionService;
use crate::contest::store::{EntryStore, StoreError};

/// In-memory store double with the same guarantees the production store
/// makes: atomic code check + insert, ascending ids, codes retired
/// forever.
#[derive(Default)]
pub(super) struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    next_id: u64,
    entries: BTreeMap<u64, Entry>,
    issued_codes: HashSet<String>,
}

impl MemoryStore {
    pub(super) fn len(&self) -> usize {
        self.inner.lock().expect("lock").entries.len()
    }
}

impl EntryStore for MemoryStore {
    fn create(&self, details: EntryDetails) -> Result<Entry, StoreError> {
        let mut inner = self.inner.lock().expect("lock");
        if !inner.issued_codes.insert(details.tracking_code.as_str().to_string()) {
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
        Ok(self.inner.lock().expect("lock").entries.get(&id.0).cloned())
    }

    fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("lock")
            .entries
            .values()
            .cloned()
            .collect())
    }

    fn delete(&self, id: EntryId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("lock");
        inner
            .entries
            .remove(&id.0)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn exists_by_code(&self, code: &TrackingCode) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("lock")
            .issued_codes
            .contains(code.as_str()))
    }
}

/// Dispatcher double that records messages and can be switched into a
/// failing mode.
#[derive(Default)]
pub(super) struct RecordingDispatcher {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("lock").clone()
    }

    pub(super) fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, message: EmailMessage) -> Result<(), DispatchError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(DispatchError::Transport("connection reset".to_string()));
        }
        self.sent.lock().expect("lock").push(message);
        Ok(())
    }
}

static LOGO_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write the fixture JPEG to a unique temp path and return it.
pub(super) fn temp_logo() -> PathBuf {
    let suffix = LOGO_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "artesanal-test-logo-{}-{suffix}.jpg",
        std::process::id()
    ));
    std::fs::write(&path, tiny_jpeg()).expect("fixture logo written");
    path
}

pub(super) fn sample_form() -> SubmissionForm {
    SubmissionForm {
        nome_completo: Some("Maria da Silva".to_string()),
        cpf: Some("123.456.789-00".to_string()),
        nome_estabelecimento: Some("Queijaria Serra Azul".to_string()),
        volume_producao_anual: Some("1200".to_string()),
        cnpj: Some("12.345.678/0001-90".to_string()),
        telefone: Some("5561991330000".to_string()),
        email: Some("maria@serra-azul.com.br".to_string()),
        endereco: Some("Estrada da Serra, km 12".to_string()),
        municipio: Some("São Roque de Minas".to_string()),
        estado: Some("MG".to_string()),
        cep: Some("37928-000".to_string()),
        nome_produto: Some("Queijo Canastra Meia Cura".to_string()),
        registro_estabelecimento_mapa: Some("MG-0001".to_string()),
        registro_produto_mapa: Some("MG-0001-P".to_string()),
        categoria_inscrita: Some("Queijo".to_string()),
        pasteurizado: Some("false".to_string()),
        data_fabricacao_amostras: Some("2024-05-10".to_string()),
        lote: Some("L-042".to_string()),
        quantidade_unidades_amostrais: Some("3".to_string()),
        embalagem_amostral: Some("Vácuo".to_string()),
        quantidade_ml_amostral: Some("500".to_string()),
        informacoes_adicionais: None,
        origem_conhecimento: Some("Instagram".to_string()),
        outro_origem_conhecimento: None,
        historia_producao: Some(
            "Produção familiar na Serra da Canastra desde 1987, com maturação em cava.".to_string(),
        ),
        aceitou_termos: Some("on".to_string()),
    }
}

pub(super) fn build_service() -> (
    SubmissionService<MemoryStore, RecordingDispatcher>,
    Arc<MemoryStore>,
    Arc<RecordingDispatcher>,
) {
    let store = Arc::new(MemoryStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = SubmissionService::new(store.clone(), dispatcher.clone(), temp_logo());
    (service, store, dispatcher)
}
