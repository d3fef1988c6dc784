use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entry::{Category, EntryDetails, TrackingCode};

/// Raw submission payload exactly as it arrives from the public form. All
/// values are strings (or absent); the wire names are the form's field
/// names. Typing happens in [`SubmissionForm::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub nome_completo: Option<String>,
    pub cpf: Option<String>,
    pub nome_estabelecimento: Option<String>,
    pub volume_producao_anual: Option<String>,
    pub cnpj: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub endereco: Option<String>,
    pub municipio: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
    pub nome_produto: Option<String>,
    pub registro_estabelecimento_mapa: Option<String>,
    pub registro_produto_mapa: Option<String>,
    pub categoria_inscrita: Option<String>,
    pub pasteurizado: Option<String>,
    pub data_fabricacao_amostras: Option<String>,
    pub lote: Option<String>,
    pub quantidade_unidades_amostrais: Option<String>,
    pub embalagem_amostral: Option<String>,
    pub quantidade_ml_amostral: Option<String>,
    pub informacoes_adicionais: Option<String>,
    pub origem_conhecimento: Option<String>,
    pub outro_origem_conhecimento: Option<String>,
    pub historia_producao: Option<String>,
    pub aceitou_termos: Option<String>,
}

/// User-correctable problems with a submission.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("mandatory field '{0}' is missing or empty")]
    MissingField(&'static str),
    #[error("field '{field}' is not a valid date (expected YYYY-MM-DD): '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field '{field}' is not a recognized boolean token: '{value}'")]
    InvalidFlag { field: &'static str, value: String },
    #[error("unknown contest category: '{0}'")]
    UnknownCategory(String),
    #[error("field 'email' does not look like an e-mail address: '{0}'")]
    InvalidEmail(String),
    #[error("the contest terms were not accepted")]
    TermsNotAccepted,
}

/// A fully typed submission that passed validation. Still missing its
/// tracking code; [`ValidatedSubmission::into_details`] attaches one.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub full_name: String,
    pub tax_id: String,
    pub establishment_name: String,
    pub annual_production_volume: u32,
    pub company_tax_id: Option<String>,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub municipality: String,
    pub state: String,
    pub postal_code: String,
    pub product_name: String,
    pub establishment_registration: String,
    pub product_registration: String,
    pub category: Category,
    pub pasteurized: bool,
    pub manufacturing_date: NaiveDate,
    pub batch: String,
    pub sample_unit_count: u32,
    pub sample_packaging: String,
    pub sample_volume_ml: u32,
    pub additional_information: Option<String>,
    pub referral_source: Option<String>,
    pub referral_source_other: Option<String>,
    pub production_history: String,
}

impl ValidatedSubmission {
    pub fn into_details(self, tracking_code: TrackingCode) -> EntryDetails {
        EntryDetails {
            tracking_code,
            full_name: self.full_name,
            tax_id: self.tax_id,
            establishment_name: self.establishment_name,
            annual_production_volume: self.annual_production_volume,
            company_tax_id: self.company_tax_id,
            phone: self.phone,
            email: self.email,
            address: self.address,
            municipality: self.municipality,
            state: self.state,
            postal_code: self.postal_code,
            product_name: self.product_name,
            establishment_registration: self.establishment_registration,
            product_registration: self.product_registration,
            category: self.category,
            pasteurized: self.pasteurized,
            manufacturing_date: self.manufacturing_date,
            batch: self.batch,
            sample_unit_count: self.sample_unit_count,
            sample_packaging: self.sample_packaging,
            sample_volume_ml: self.sample_volume_ml,
            additional_information: self.additional_information,
            referral_source: self.referral_source,
            referral_source_other: self.referral_source_other,
            production_history: self.production_history,
            accepted_terms: true,
        }
    }
}

impl SubmissionForm {
    /// Validate the raw form into typed values. Terms acceptance is part of
    /// validation: a submission without it never reaches the store.
    pub fn validate(self) -> Result<ValidatedSubmission, ValidationError> {
        let full_name = required(self.nome_completo, "nome_completo")?;
        let tax_id = required(self.cpf, "cpf")?;
        let establishment_name = required(self.nome_estabelecimento, "nome_estabelecimento")?;
        let annual_production_volume =
            parse_number(self.volume_producao_anual, "volume_producao_anual")?;
        let company_tax_id = optional(self.cnpj);
        let phone = required(self.telefone, "telefone")?;
        let email = required(self.email, "email")?;
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }
        let address = required(self.endereco, "endereco")?;
        let municipality = required(self.municipio, "municipio")?;
        let state = required(self.estado, "estado")?;
        let postal_code = required(self.cep, "cep")?;
        let product_name = required(self.nome_produto, "nome_produto")?;
        let establishment_registration = required(
            self.registro_estabelecimento_mapa,
            "registro_estabelecimento_mapa",
        )?;
        let product_registration =
            required(self.registro_produto_mapa, "registro_produto_mapa")?;

        let raw_category = required(self.categoria_inscrita, "categoria_inscrita")?;
        let category = Category::parse(&raw_category)
            .ok_or(ValidationError::UnknownCategory(raw_category))?;

        let pasteurized = parse_flag(self.pasteurizado, "pasteurizado")?;

        let raw_date = required(self.data_fabricacao_amostras, "data_fabricacao_amostras")?;
        let manufacturing_date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d").map_err(
            |_| ValidationError::InvalidDate {
                field: "data_fabricacao_amostras",
                value: raw_date,
            },
        )?;

        let batch = required(self.lote, "lote")?;
        let sample_unit_count = parse_number(
            self.quantidade_unidades_amostrais,
            "quantidade_unidades_amostrais",
        )?;
        let sample_packaging = required(self.embalagem_amostral, "embalagem_amostral")?;
        let sample_volume_ml =
            parse_number(self.quantidade_ml_amostral, "quantidade_ml_amostral")?;
        let production_history = required(self.historia_producao, "historia_producao")?;

        if !parse_flag(self.aceitou_termos, "aceitou_termos")? {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(ValidatedSubmission {
            full_name,
            tax_id,
            establishment_name,
            annual_production_volume,
            company_tax_id,
            phone,
            email,
            address,
            municipality,
            state,
            postal_code,
            product_name,
            establishment_registration,
            product_registration,
            category,
            pasteurized,
            manufacturing_date,
            batch,
            sample_unit_count,
            sample_packaging,
            sample_volume_ml,
            additional_information: optional(self.informacoes_adicionais),
            referral_source: optional(self.origem_conhecimento),
            referral_source_other: optional(self.outro_origem_conhecimento),
            production_history,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(value: Option<String>, field: &'static str) -> Result<u32, ValidationError> {
    let raw = required(value, field)?;
    raw.parse::<u32>().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: raw,
    })
}

/// Checkbox-style booleans arrive as string tokens; `"true"` and `"on"`
/// mean accepted, absence means declined.
fn parse_flag(value: Option<String>, field: &'static str) -> Result<bool, ValidationError> {
    let raw = match value {
        Some(v) => v,
        None => return Ok(false),
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" | "" => Ok(false),
        _ => Err(ValidationError::InvalidFlag { field, value: raw }),
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}
