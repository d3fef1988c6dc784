use std::path::PathBuf;
use std::sync::Arc;

use artesanal::config::AppConfig;
use artesanal::contest::{SubmissionForm, SubmissionService, SubmissionStatus};
use artesanal::error::AppError;
use clap::Args;

use crate::infra::{InMemoryEntryStore, LoggingDispatcher};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the rendered certificate to this path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Submit the honey-category sample instead of the cheese one
    #[arg(long)]
    pub(crate) honey: bool,
}

/// Drive one submission through the full pipeline without a network in
/// sight: in-memory store, log-only mail, real validation and rendering.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let store = Arc::new(InMemoryEntryStore::default());
    let dispatcher = Arc::new(LoggingDispatcher);
    let service = SubmissionService::new(store, dispatcher, config.branding.asset_path.clone());

    let form = if args.honey {
        honey_sample()
    } else {
        cheese_sample()
    };

    let receipt = service.submit(form)?;
    println!("inscrição registrada");
    println!("  id:      {}", receipt.id);
    println!("  código:  {}", receipt.tracking_code);
    println!("  status:  {}", receipt.status.label());
    if let SubmissionStatus::DocumentFailed { detail } = &receipt.status {
        println!("  detalhe: {detail}");
    }

    match (args.output, receipt.document) {
        (Some(path), Some(document)) => {
            std::fs::write(&path, document)?;
            println!("  pdf:     {}", path.display());
        }
        (Some(_), None) => {
            println!("  pdf:     não gerado (veja o detalhe acima)");
        }
        (None, Some(document)) => {
            println!("  pdf:     {} bytes (use --output para salvar)", document.len());
        }
        (None, None) => {}
    }

    Ok(())
}

fn cheese_sample() -> SubmissionForm {
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
        historia_producao: Some(
            "Produção familiar na Serra da Canastra desde 1987, com maturação em cava.".to_string(),
        ),
        origem_conhecimento: Some("Instagram".to_string()),
        aceitou_termos: Some("on".to_string()),
        ..SubmissionForm::default()
    }
}

fn honey_sample() -> SubmissionForm {
    SubmissionForm {
        nome_completo: Some("João Apicultor".to_string()),
        nome_estabelecimento: Some("Apiário Flor do Cerrado".to_string()),
        nome_produto: Some("Mel de Aroeira".to_string()),
        categoria_inscrita: Some("Mel".to_string()),
        email: Some("joao@flordocerrado.com.br".to_string()),
        municipio: Some("Pirenópolis".to_string()),
        estado: Some("GO".to_string()),
        cep: Some("72980-000".to_string()),
        endereco: Some("Fazenda Boa Vista, zona rural".to_string()),
        cpf: Some("987.654.321-00".to_string()),
        telefone: Some("5562999887766".to_string()),
        volume_producao_anual: Some("800".to_string()),
        registro_estabelecimento_mapa: Some("GO-0042".to_string()),
        registro_produto_mapa: Some("GO-0042-P".to_string()),
        data_fabricacao_amostras: Some("2024-06-02".to_string()),
        lote: Some("ENV-2024-06".to_string()),
        quantidade_unidades_amostrais: Some("4".to_string()),
        embalagem_amostral: Some("Pote de vidro".to_string()),
        quantidade_ml_amostral: Some("350".to_string()),
        historia_producao: Some(
            "Colmeias em área de cerrado preservado, colheita única por estação.".to_string(),
        ),
        aceitou_termos: Some("on".to_string()),
        ..SubmissionForm::default()
    }
}
