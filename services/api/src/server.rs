use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCredentialRepository};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use domestic_connect::backend::BackendClient;
use domestic_connect::config::AppConfig;
use domestic_connect::error::AppError;
use domestic_connect::marketplace::accounts::{
    AccountService, PasswordPolicy, RestIdentityProvider,
};
use domestic_connect::marketplace::directory::{
    AgencyCsvImporter, DirectoryCatalog, DirectoryLoader, HttpDirectorySource,
};
use domestic_connect::notifications::NotificationCenter;
use domestic_connect::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryCredentialRepository::default());
    let mut accounts = AccountService::new(
        repository,
        PasswordPolicy::new(config.auth.min_password_length),
    )
    .with_session_ttl(config.auth.session_ttl());
    if let Some(identity) = &config.auth.identity {
        match RestIdentityProvider::new(identity, config.backend.timeout) {
            Ok(provider) => accounts = accounts.with_identity_provider(Arc::new(provider)),
            Err(err) => warn!(error = %err, "identity provider disabled"),
        }
    }

    let client = BackendClient::new(&config.backend)?;
    let loader = DirectoryLoader::new(
        Arc::new(HttpDirectorySource::new(client)),
        Arc::new(NotificationCenter::default()),
    );
    let catalog = Arc::new(DirectoryCatalog::load(loader).await);
    if let Some(path) = args.agencies_csv.take() {
        catalog.seed_agencies(AgencyCsvImporter::from_path(path)?);
    }

    let app = with_marketplace_routes(Arc::new(accounts), catalog)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = %config.backend.base_url, "domestic connect ready");

    axum::serve(listener, app).await?;
    Ok(())
}
