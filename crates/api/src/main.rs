use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::FromRef, Router};

use floodnet_database::{Database, DatabaseInfo};
use floodnet_pipeline::Ingestion;
use tokio::net::TcpListener;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_scalar::{Scalar, Servable as ScalarServable};

mod routes;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub ingestion: Arc<Ingestion>,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.database.clone()
    }
}

impl FromRef<AppState> for Arc<Ingestion> {
    fn from_ref(state: &AppState) -> Self {
        state.ingestion.clone()
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Token"))),
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Configure logging and environment
    floodnet_config::setup_logging();
    floodnet_config::init().await;

    let config = floodnet_config::config().await;

    // Connect to the database and prepare indexes
    let database = DatabaseInfo::Auto
        .connect()
        .await
        .expect("Database connection failed.");
    database
        .migrate_database()
        .await
        .expect("Database migration failed.");

    // Assemble the pipeline with its collaborators
    let ingestion = Arc::new(Ingestion::from_config(database.clone()).await);

    // Configure API schema
    #[derive(OpenApi)]
    #[openapi(
        modifiers(&SecurityAddon),
        paths(
            routes::root::root,
            routes::submit::submit_report,
            routes::reports::public_feed,
            routes::reports::insights,
            routes::weather::weather,
            routes::whatsapp::whatsapp_inbound,
            routes::admin::list_reports,
            routes::admin::edit_report,
            routes::admin::delete_report,
        ),
        components(
            schemas(
                routes::root::RootResponse,
                routes::submit::SubmitPayload,
                routes::admin::DataEditReport,
                routes::whatsapp::WhatsAppInbound,
                floodnet_models::v0::Report,
                floodnet_models::v0::ReportStatus,
                floodnet_models::v0::Category,
                floodnet_models::v0::Severity,
                floodnet_models::v0::SubmissionOutcome,
                floodnet_models::v0::Insights,
                floodnet_models::v0::ReportInsight,
                floodnet_models::v0::HotspotCell,
                floodnet_models::v0::WeatherSummary,
            )
        )
    )]
    struct ApiDoc;

    // Configure Axum and router
    let app = Router::new()
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(routes::router())
        .with_state(AppState {
            database,
            ingestion,
        });

    // Configure TCP listener and bind
    let address: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .expect("valid bind address");
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("listening on {address}");
    axum::serve(listener, app.into_make_service()).await
}
