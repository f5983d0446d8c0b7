use cached::proc_macro::cached;
use config::{Config, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Floodnet.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Floodnet.toml").exists() {
            builder = builder.add_source(File::new("Floodnet.toml", FileFormat::Toml));
        }

        builder.build().unwrap()
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub mongodb: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Api {
    pub host: String,
    pub port: u16,
    pub admin_token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FilesS3 {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Files {
    pub max_file_size: usize,
    pub min_file_size: usize,
    pub s3: FilesS3,
}

/// What the verification gate decides when the classifier cannot answer
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Accept the submission as verified
    FailOpen,
    /// Reject the submission as unverified
    FailClosed,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Verification {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub instruction: String,
    pub timeout_seconds: u64,
    pub fallback: FallbackPolicy,
    pub auto_approve: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Reports {
    pub duplicate_radius_metres: f64,
    pub hotspot_min_reports: usize,
    pub alert_statuses: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AlertsTwilio {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AlertsWebhook {
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Alerts {
    pub max_attempts: u32,
    pub twilio: AlertsTwilio,
    pub webhook: AlertsWebhook,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Weather {
    pub endpoint: String,
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub production: bool,
    pub database: Database,
    pub api: Api,
    pub files: Files,
    pub verification: Verification,
    pub reports: Reports,
    pub alerts: Alerts,
    pub weather: Weather,
}

pub async fn init() {
    println!(
        ":: Floodnet Configuration ::\n\x1b[32m{:?}\x1b[0m",
        config().await
    );
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read().await.try_deserialize::<Settings>().unwrap()
}

/// Configure logging and common environment for a service binary
pub fn setup_logging() {
    dotenvy::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Log a foreign error and collapse it into InternalError
#[macro_export]
macro_rules! report_internal_error {
    ( $expr: expr ) => {
        $expr.map_err(|err| {
            tracing::error!("Internal error occurred: {err:?}");
            create_error!(InternalError)
        })
    };
}
