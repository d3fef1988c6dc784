//! Static per-category field layouts.
//!
//! The order and labels of certificate lines are a rendering contract,
//! fixed here rather than derived from storage order. Each category ships
//! its own template; changing a template is a versioned contract change.

use super::{RenderError, MISSING_VALUE};
use crate::contest::entry::{Category, Entry};

/// One certificate line: a bold label and the rendered value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CertificateLine {
    pub(super) label: String,
    pub(super) value: String,
}

/// How a field's absence is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// The store must never hold an entry without this value.
    Mandatory,
    /// Rendered as the explicit placeholder when absent.
    Optional,
}

struct FieldSpec {
    label: &'static str,
    presence: Presence,
    value: fn(&Entry) -> Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn yes_no(value: bool) -> Option<String> {
    Some(if value { "Sim" } else { "Não" }.to_string())
}

/// Template for dairy entries: the full §cheese disclosure including the
/// pasteurization flag and sample packaging details.
const CHEESE_LAYOUT: &[FieldSpec] = &[
    FieldSpec {
        label: "Nome completo",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.full_name),
    },
    FieldSpec {
        label: "CPF",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.tax_id),
    },
    FieldSpec {
        label: "CNPJ",
        presence: Presence::Optional,
        value: |e| e.details.company_tax_id.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "Nome do estabelecimento",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.establishment_name),
    },
    FieldSpec {
        label: "Volume de produção anual",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.annual_production_volume.to_string()),
    },
    FieldSpec {
        label: "Telefone",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.phone),
    },
    FieldSpec {
        label: "E-mail",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.email),
    },
    FieldSpec {
        label: "Endereço",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.address),
    },
    FieldSpec {
        label: "Município",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.municipality),
    },
    FieldSpec {
        label: "Estado",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.state),
    },
    FieldSpec {
        label: "CEP",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.postal_code),
    },
    FieldSpec {
        label: "Nome do produto",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.product_name),
    },
    FieldSpec {
        label: "Registro do estabelecimento no MAPA",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.establishment_registration),
    },
    FieldSpec {
        label: "Registro do produto no MAPA",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.product_registration),
    },
    FieldSpec {
        label: "Categoria inscrita",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.category.label().to_string()),
    },
    FieldSpec {
        label: "Pasteurizado",
        presence: Presence::Mandatory,
        value: |e| yes_no(e.details.pasteurized),
    },
    FieldSpec {
        label: "Data de fabricação das amostras",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.manufacturing_date.format("%Y-%m-%d").to_string()),
    },
    FieldSpec {
        label: "Lote",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.batch),
    },
    FieldSpec {
        label: "Quantidade de unidades amostrais",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.sample_unit_count.to_string()),
    },
    FieldSpec {
        label: "Embalagem amostral",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.sample_packaging),
    },
    FieldSpec {
        label: "Quantidade (ml) amostral",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.sample_volume_ml.to_string()),
    },
    FieldSpec {
        label: "Informações adicionais",
        presence: Presence::Optional,
        value: |e| e.details.additional_information.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "Origem do conhecimento",
        presence: Presence::Optional,
        value: |e| e.details.referral_source.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "Outra origem do conhecimento",
        presence: Presence::Optional,
        value: |e| e.details.referral_source_other.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "História da produção",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.production_history),
    },
    FieldSpec {
        label: "Data/hora da inscrição",
        presence: Presence::Mandatory,
        value: |e| Some(e.submitted_at_label()),
    },
    FieldSpec {
        label: "Aceitou os termos",
        presence: Presence::Mandatory,
        value: |e| yes_no(e.details.accepted_terms),
    },
];

/// Template for honey entries: producer capacity and packaging framing,
/// no pasteurization line.
const HONEY_LAYOUT: &[FieldSpec] = &[
    FieldSpec {
        label: "Nome completo",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.full_name),
    },
    FieldSpec {
        label: "CPF",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.tax_id),
    },
    FieldSpec {
        label: "E-mail",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.email),
    },
    FieldSpec {
        label: "Telefone/WhatsApp",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.phone),
    },
    FieldSpec {
        label: "Município",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.municipality),
    },
    FieldSpec {
        label: "Estado",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.state),
    },
    FieldSpec {
        label: "CEP",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.postal_code),
    },
    FieldSpec {
        label: "Registro do estabelecimento no MAPA",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.establishment_registration),
    },
    FieldSpec {
        label: "Registro do produto no MAPA",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.product_registration),
    },
    FieldSpec {
        label: "Nome fantasia",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.establishment_name),
    },
    FieldSpec {
        label: "Produto",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.product_name),
    },
    FieldSpec {
        label: "Lote e data de envase",
        presence: Presence::Mandatory,
        value: |e| {
            let batch = non_empty(&e.details.batch)?;
            Some(format!(
                "{} ({})",
                batch,
                e.details.manufacturing_date.format("%Y-%m-%d")
            ))
        },
    },
    FieldSpec {
        label: "Categoria inscrita",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.category.label().to_string()),
    },
    FieldSpec {
        label: "Capacidade produtiva anual",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.annual_production_volume.to_string()),
    },
    FieldSpec {
        label: "Quantidade de unidades amostrais",
        presence: Presence::Mandatory,
        value: |e| Some(e.details.sample_unit_count.to_string()),
    },
    FieldSpec {
        label: "Embalagem amostral",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.sample_packaging),
    },
    FieldSpec {
        label: "História do produtor",
        presence: Presence::Mandatory,
        value: |e| non_empty(&e.details.production_history),
    },
    FieldSpec {
        label: "Origem do conhecimento",
        presence: Presence::Optional,
        value: |e| e.details.referral_source.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "Outra origem do conhecimento",
        presence: Presence::Optional,
        value: |e| e.details.referral_source_other.as_deref().and_then(non_empty),
    },
    FieldSpec {
        label: "Data/hora da inscrição",
        presence: Presence::Mandatory,
        value: |e| Some(e.submitted_at_label()),
    },
    FieldSpec {
        label: "Aceitou os termos",
        presence: Presence::Mandatory,
        value: |e| yes_no(e.details.accepted_terms),
    },
];

fn layout_for(category: Category) -> &'static [FieldSpec] {
    match category {
        Category::Cheese => CHEESE_LAYOUT,
        Category::Honey => HONEY_LAYOUT,
    }
}

/// Build the ordered certificate lines for an entry. A missing mandatory
/// value means the store holds a corrupt record and rendering must stop.
pub(super) fn certificate_lines(entry: &Entry) -> Result<Vec<CertificateLine>, RenderError> {
    let mut lines = Vec::new();
    // Tracking code leads regardless of category.
    lines.push(CertificateLine {
        label: "Código de inscrição".to_string(),
        value: entry.details.tracking_code.as_str().to_string(),
    });

    for spec in layout_for(entry.details.category) {
        let value = match ((spec.value)(entry), spec.presence) {
            (Some(value), _) => value,
            (None, Presence::Optional) => MISSING_VALUE.to_string(),
            (None, Presence::Mandatory) => {
                return Err(RenderError::InvariantViolation(format!(
                    "mandatory field '{}' is empty on entry {}",
                    spec.label, entry.id
                )));
            }
        };
        lines.push(CertificateLine {
            label: spec.label.to_string(),
            value,
        });
    }
    Ok(lines)
}
