use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate identifier for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public tracking code handed to the applicant: `CNA-` plus four decimal
/// digits with leading zeros preserved. Unique forever, never recycled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingCode(String);

pub const CODE_PREFIX: &str = "CNA";

impl TrackingCode {
    /// Format a code from a raw draw in `0..=9999`.
    pub fn from_number(number: u16) -> Self {
        debug_assert!(number <= 9999);
        Self(format!("{CODE_PREFIX}-{number:04}"))
    }

    /// Accepts only the canonical `CNA-0000`..`CNA-9999` shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix(CODE_PREFIX)?.strip_prefix('-')?;
        if digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of competition categories. Each selects its own certificate
/// field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Queijo")]
    Cheese,
    #[serde(rename = "Mel")]
    Honey,
}

impl Category {
    /// Wire/display name, as submitted on the entry form.
    pub const fn label(self) -> &'static str {
        match self {
            Category::Cheese => "Queijo",
            Category::Honey => "Mel",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Queijo" => Some(Category::Cheese),
            "Mel" => Some(Category::Honey),
            _ => None,
        }
    }
}

/// Everything the applicant declares plus the allocated tracking code —
/// the record as handed to the store, before identity assignment.
///
/// Serde names follow the external form/CSV contract inherited from the
/// original registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(rename = "codigo_unico")]
    pub tracking_code: TrackingCode,
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    #[serde(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "nome_estabelecimento")]
    pub establishment_name: String,
    #[serde(rename = "volume_producao_anual")]
    pub annual_production_volume: u32,
    #[serde(rename = "cnpj")]
    pub company_tax_id: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "nome_produto")]
    pub product_name: String,
    #[serde(rename = "registro_estabelecimento_mapa")]
    pub establishment_registration: String,
    #[serde(rename = "registro_produto_mapa")]
    pub product_registration: String,
    #[serde(rename = "categoria_inscrita")]
    pub category: Category,
    #[serde(rename = "pasteurizado")]
    pub pasteurized: bool,
    #[serde(rename = "data_fabricacao_amostras")]
    pub manufacturing_date: NaiveDate,
    #[serde(rename = "lote")]
    pub batch: String,
    #[serde(rename = "quantidade_unidades_amostrais")]
    pub sample_unit_count: u32,
    #[serde(rename = "embalagem_amostral")]
    pub sample_packaging: String,
    #[serde(rename = "quantidade_ml_amostral")]
    pub sample_volume_ml: u32,
    #[serde(rename = "informacoes_adicionais")]
    pub additional_information: Option<String>,
    #[serde(rename = "origem_conhecimento")]
    pub referral_source: Option<String>,
    #[serde(rename = "outro_origem_conhecimento")]
    pub referral_source_other: Option<String>,
    #[serde(rename = "historia_producao")]
    pub production_history: String,
    #[serde(rename = "aceitou_termos")]
    pub accepted_terms: bool,
}

/// A persisted contest entry. `id` and `submitted_at` are assigned by the
/// store at creation and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(rename = "data_hora_inscricao")]
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: EntryDetails,
}

impl Entry {
    pub fn tracking_code(&self) -> &TrackingCode {
        &self.details.tracking_code
    }

    /// Timestamp string embedded in certificates and exports. Derived from
    /// the stored timestamp so re-rendering is stable.
    pub fn submitted_at_label(&self) -> String {
        self.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn view(&self) -> EntryView {
        let details = &self.details;
        EntryView {
            id: self.id,
            codigo_unico: details.tracking_code.clone(),
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
            categoria_inscrita: details.category,
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
            data_hora_inscricao: self.submitted_at_label(),
        }
    }
}

/// Listing projection returned by the admin listing endpoint: the full
/// wire field set with both dates pre-formatted.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: EntryId,
    pub codigo_unico: TrackingCode,
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
    pub categoria_inscrita: Category,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_code_preserves_leading_zeros() {
        assert_eq!(TrackingCode::from_number(7).as_str(), "CNA-0007");
        assert_eq!(TrackingCode::from_number(9999).as_str(), "CNA-9999");
    }

    #[test]
    fn tracking_code_parse_rejects_malformed_input() {
        assert!(TrackingCode::parse("CNA-1234").is_some());
        assert!(TrackingCode::parse("CNA-123").is_none());
        assert!(TrackingCode::parse("CNA-12345").is_none());
        assert!(TrackingCode::parse("XYZ-1234").is_none());
        assert!(TrackingCode::parse("CNA-12a4").is_none());
    }

    #[test]
    fn category_labels_round_trip() {
        for category in [Category::Cheese, Category::Honey] {
            assert_eq!(Category::parse(category.label()), Some(category));
        }
        assert_eq!(Category::parse("Cachaça"), None);
    }
}
