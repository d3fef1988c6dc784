use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// Fixed download name for the admin export.
pub const EXPORT_FILENAME: &str = "inscricoes.csv";
/// Canonical content type for the export payload.
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// One spreadsheet row. The column set and names are the entry's declared
/// wire fields; dates are pre-formatted so the file is self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: u64,
    pub codigo_unico: String,
    pub nome_completo: String,
    pub cpf: String,
    pub nome_estabelecimento: String,
    pub volume_producao_anual: u32,
    pub cnpj: Option<String>,
    pub telefone: String,
    pub email: String,
    pub endereco: String,
    pub municipio: String,
    pub estado: String,
    pub cep: String,
    pub nome_produto: String,
    pub registro_estabelecimento_mapa: String,
    pub registro_produto_mapa: String,
    pub categoria_inscrita: String,
    pub pasteurizado: bool,
    pub data_fabricacao_amostras: String,
    pub lote: String,
    pub quantidade_unidades_amostrais: u32,
    pub embalagem_amostral: String,
    pub quantidade_ml_amostral: u32,
    pub informacoes_adicionais: Option<String>,
    pub origem_conhecimento: Option<String>,
    pub outro_origem_conhecimento: Option<String>,
    pub historia_producao: String,
    pub aceitou_termos: bool,
    pub data_hora_inscricao: String,
}

impl ExportRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        let details = &entry.details;
        Self {
            id: entry.id.0,
            codigo_unico: details.tracking_code.as_str().to_string(),
            nome_completo: details.full_name.clone(),
            cpf: details.tax_id.clone(),
            nome_estabelecimento: details.establishment_name.clone(),
            volume_producao_anual: details.annual_production_volume,
            cnpj: details.company_tax_id.clone(),
            telefone: details.phone.clone(),
            email: details.email.clone(),
            endereco: details.address.clone(),
            municipio: details.municipality.clone(),
            estado: details.state.clone(),
            cep: details.postal_code.clone(),
            nome_produto: details.product_name.clone(),
            registro_estabelecimento_mapa: details.establishment_registration.clone(),
            registro_produto_mapa: details.product_registration.clone(),
            categoria_inscrita: details.category.label().to_string(),
            pasteurizado: details.pasteurized,
            data_fabricacao_amostras: details.manufacturing_date.format("%Y-%m-%d").to_string(),
            lote: details.batch.clone(),
            quantidade_unidades_amostrais: details.sample_unit_count,
            embalagem_amostral: details.sample_packaging.clone(),
            quantidade_ml_amostral: details.sample_volume_ml,
            informacoes_adicionais: details.additional_information.clone(),
            origem_conhecimento: details.referral_source.clone(),
            outro_origem_conhecimento: details.referral_source_other.clone(),
            historia_producao: details.production_history.clone(),
            aceitou_termos: details.accepted_terms,
            data_hora_inscricao: entry.submitted_at_label(),
        }
    }
}

/// Column names in [`ExportRecord`] field order. Written explicitly so an
/// empty export still carries the header row.
const EXPORT_COLUMNS: [&str; 29] = [
    "id",
    "codigo_unico",
    "nome_completo",
    "cpf",
    "nome_estabelecimento",
    "volume_producao_anual",
    "cnpj",
    "telefone",
    "email",
    "endereco",
    "municipio",
    "estado",
    "cep",
    "nome_produto",
    "registro_estabelecimento_mapa",
    "registro_produto_mapa",
    "categoria_inscrita",
    "pasteurizado",
    "data_fabricacao_amostras",
    "lote",
    "quantidade_unidades_amostrais",
    "embalagem_amostral",
    "quantidade_ml_amostral",
    "informacoes_adicionais",
    "origem_conhecimento",
    "outro_origem_conhecimento",
    "historia_producao",
    "aceitou_termos",
    "data_hora_inscricao",
];

/// Serialize all entries as tabular rows, headers first even when there are
/// no entries, id order preserved from the caller's slice.
pub fn write_csv<W: Write>(entries: &[Entry], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(EXPORT_COLUMNS)?;
    for entry in entries {
        csv_writer.serialize(ExportRecord::from_entry(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read an export back into records. Exists for round-trip verification and
/// offline tooling; the service itself only writes.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExportRecord>, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.deserialize::<ExportRecord>() {
        records.push(record?);
    }
    Ok(records)
}
