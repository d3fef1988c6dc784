use std::sync::atomic::Ordering;
use std::sync::Arc;

use artesanal::config::AppConfig;
use artesanal::contest::{BrandingAsset, SubmissionService};
use artesanal::error::AppError;
use artesanal::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEntryStore, MailDispatcher, SmtpDispatcher};
use crate::routes::with_contest_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    // Fail now rather than on the first submission.
    BrandingAsset::load(&config.branding.asset_path)
        .map_err(artesanal::contest::SubmissionError::from)?;

    let dispatcher = match &config.mail {
        Some(mail) => {
            let smtp = SmtpDispatcher::from_config(mail)?;
            info!(host = %mail.host, port = mail.port, "confirmation mail goes out via SMTP");
            MailDispatcher::Smtp(smtp)
        }
        None => {
            warn!("no mail configuration; confirmations will be logged, not sent");
            MailDispatcher::Logging(Default::default())
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryEntryStore::default());
    let service = Arc::new(SubmissionService::new(
        store,
        Arc::new(dispatcher),
        config.branding.asset_path.clone(),
    ));

    let app = with_contest_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "contest submission service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
