//! Integration specifications for the contest submission workflow.
//!
//! Scenarios run end-to-end through the public service facade and HTTP
//! router with in-memory infrastructure, so persistence-first semantics,
//! code uniqueness, and the rendered certificate are validated without
//! reaching into private modules.

mod common {
    use std::collections::{BTreeMap, HashSet};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use artesanal::contest::store::EntryStore;
    use artesanal::contest::{
        DispatchError, EmailMessage, Entry, EntryDetails, EntryId, NotificationDispatcher,
        StoreError, SubmissionForm, SubmissionService, TrackingCode,
    };

    #[derive(Default)]
    pub(super) struct MemoryStore {
        inner: Mutex<StoreInner>,
    }

    #[derive(Default)]
    struct StoreInner {
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

    /// Header-only JPEG (2x1, one component): enough for the renderer's
    /// dimension scan, not a decodable picture.
    fn tiny_jpeg() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(b"JFIF\0");
        bytes.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x02, 0x01]);
        bytes.extend_from_slice(&[0x01, 0x11, 0x00]);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    pub(super) fn temp_logo() -> PathBuf {
        let suffix = LOGO_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "artesanal-workflow-logo-{}-{suffix}.jpg",
            std::process::id()
        ));
        std::fs::write(&path, tiny_jpeg()).expect("fixture logo written");
        path
    }

    pub(super) fn cheese_form() -> SubmissionForm {
        SubmissionForm {
            nome_completo: Some("Maria da Silva".to_string()),
            cpf: Some("123.456.789-00".to_string()),
            nome_estabelecimento: Some("Queijaria Serra Azul".to_string()),
            volume_producao_anual: Some("1200".to_string()),
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
            historia_producao: Some(
                "Produção familiar na Serra da Canastra desde 1987.".to_string(),
            ),
            aceitou_termos: Some("on".to_string()),
            ..SubmissionForm::default()
        }
    }

    pub(super) fn honey_form() -> SubmissionForm {
        SubmissionForm {
            nome_completo: Some("João Apicultor".to_string()),
            cpf: Some("987.654.321-00".to_string()),
            nome_estabelecimento: Some("Apiário Flor do Cerrado".to_string()),
            volume_producao_anual: Some("800".to_string()),
            telefone: Some("5562999887766".to_string()),
            email: Some("joao@flordocerrado.com.br".to_string()),
            endereco: Some("Fazenda Boa Vista, zona rural".to_string()),
            municipio: Some("Pirenópolis".to_string()),
            estado: Some("GO".to_string()),
            cep: Some("72980-000".to_string()),
            nome_produto: Some("Mel de Aroeira".to_string()),
            registro_estabelecimento_mapa: Some("GO-0042".to_string()),
            registro_produto_mapa: Some("GO-0042-P".to_string()),
            categoria_inscrita: Some("Mel".to_string()),
            data_fabricacao_amostras: Some("2024-06-02".to_string()),
            lote: Some("ENV-2024-06".to_string()),
            quantidade_unidades_amostrais: Some("4".to_string()),
            embalagem_amostral: Some("Pote de vidro".to_string()),
            quantidade_ml_amostral: Some("350".to_string()),
            historia_producao: Some("Colmeias em área de cerrado preservado.".to_string()),
            aceitou_termos: Some("on".to_string()),
            ..SubmissionForm::default()
        }
    }

    pub(super) fn build_service() -> (
        Arc<SubmissionService<MemoryStore, RecordingDispatcher>>,
        Arc<MemoryStore>,
        Arc<RecordingDispatcher>,
    ) {
        let store = Arc::new(MemoryStore::default());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let service = Arc::new(SubmissionService::new(
            store.clone(),
            dispatcher.clone(),
            temp_logo(),
        ));
        (service, store, dispatcher)
    }
}

use artesanal::contest::{SubmissionError, SubmissionStatus, TrackingCode};

// Needles must be WinAnsi-encoded, matching the content stream ("ã" is
// 0xE3, not the UTF-8 pair).
fn pdf_contains(document: &[u8], needle: &[u8]) -> bool {
    document.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn honey_submission_flows_end_to_end() {
    let (service, store, dispatcher) = common::build_service();

    let receipt = service
        .submit(common::honey_form())
        .expect("submission succeeds");

    assert_eq!(receipt.status, SubmissionStatus::Confirmed);
    assert!(TrackingCode::parse(receipt.tracking_code.as_str()).is_some());
    assert_eq!(store.len(), 1);

    let document = receipt.document.expect("document rendered");
    assert!(document.starts_with(b"%PDF-1.4"));
    assert!(pdf_contains(&document, b"Jo\xE3o Apicultor"));
    assert!(pdf_contains(&document, receipt.tracking_code.as_str().as_bytes()));
    assert!(pdf_contains(&document, b"Mel"));

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "joao@flordocerrado.com.br");
}

#[test]
fn listing_and_export_track_both_categories() {
    let (service, _store, _dispatcher) = common::build_service();
    service.submit(common::cheese_form()).expect("cheese");
    service.submit(common::honey_form()).expect("honey");

    let views = service.entries().expect("listing");
    assert_eq!(views.len(), 2);

    let csv = service.export().expect("export");
    let records = artesanal::contest::read_csv(csv.as_slice()).expect("export parses");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].categoria_inscrita, "Queijo");
    assert_eq!(records[1].categoria_inscrita, "Mel");
    assert!(records[0].id < records[1].id);
}

#[test]
fn notification_failure_keeps_the_entry_and_document() {
    let (service, store, dispatcher) = common::build_service();
    dispatcher.fail_next();

    let receipt = service
        .submit(common::cheese_form())
        .expect("submission persists");

    assert!(matches!(
        receipt.status,
        SubmissionStatus::NotificationFailed { .. }
    ));
    assert!(receipt.document.is_some());
    assert_eq!(store.len(), 1);

    // The certificate stays downloadable afterwards.
    let document = service.document(receipt.id).expect("re-render");
    assert!(pdf_contains(&document, receipt.tracking_code.as_str().as_bytes()));
}

#[test]
fn deleted_entries_never_free_their_codes() {
    let (service, store, _dispatcher) = common::build_service();
    let receipt = service.submit(common::cheese_form()).expect("submits");

    service.delete(receipt.id).expect("delete succeeds");
    assert_eq!(store.len(), 0);
    assert!(matches!(
        service.delete(receipt.id),
        Err(SubmissionError::Storage(
            artesanal::contest::StoreError::NotFound
        ))
    ));

    use artesanal::contest::store::EntryStore;
    assert!(store
        .exists_by_code(&receipt.tracking_code)
        .expect("existence query"));
}

#[test]
fn concurrent_submissions_get_distinct_codes() {
    let (service, store, _dispatcher) = common::build_service();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || {
                service
                    .submit(common::cheese_form())
                    .expect("submits")
                    .tracking_code
            })
        })
        .collect();

    let mut codes: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().expect("thread joins").as_str().to_string())
        .collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 8);
    assert_eq!(store.len(), 8);
}
