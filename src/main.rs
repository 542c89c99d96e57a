mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderName, HeaderValue, Method};
use config::Config;
use db::{verificationdb::VerificationExt, DBClient};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    dtos::verificationdtos::VerificationFee,
    mail::sendmail::Mailer,
    middleware::API_KEY_HEADER,
    service::{
        maintenance_service::MaintenanceService,
        notification_service::{EmailNotifier, ExpiryNotifier, LogNotifier},
        verification_service::VerificationService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub verification_service: Arc<VerificationService>,
    pub maintenance_service: Arc<MaintenanceService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn VerificationExt>, config: Config) -> Self {
        let notifier: Arc<dyn ExpiryNotifier> = match &config.resend_api_key {
            Some(api_key) => Arc::new(EmailNotifier::new(
                Mailer::new(api_key.clone(), config.from_email.clone()),
                config.app_url.clone(),
            )),
            None => Arc::new(LogNotifier),
        };

        let fee = VerificationFee {
            amount: config.verification_fee,
            currency: config.verification_fee_currency.clone(),
        };

        let verification_service = Arc::new(VerificationService::new(db_client.clone(), fee));
        let maintenance_service = Arc::new(MaintenanceService::new(db_client, Some(notifier)));

        Self {
            env: config,
            verification_service,
            maintenance_service,
        }
    }
}

/// `run-maintenance`: one sweep + reminder pass for cron, then exit.
async fn run_maintenance_once(app_state: Arc<AppState>) -> i32 {
    let report = app_state
        .maintenance_service
        .run_maintenance(chrono::Utc::now())
        .await;

    match serde_json::to_string_pretty(&report) {
        Ok(body) => println!("{}", body),
        Err(e) => tracing::error!("Failed to serialize maintenance report: {}", e),
    }

    tracing::info!(
        "Maintenance run: {} expired, {} reminders",
        report.expiry.expired.unwrap_or(0),
        report.reminders.matches().len()
    );

    if report.is_success() {
        0
    } else {
        1
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);
    if let Err(err) = db_client.run_migrations().await {
        tracing::error!("🔥 Failed to run migrations: {}", err);
        std::process::exit(1);
    }

    let app_state = Arc::new(AppState::new(Arc::new(db_client), config.clone()));

    if std::env::args().nth(1).as_deref() == Some("run-maintenance") {
        let code = run_maintenance_once(app_state).await;
        std::process::exit(code);
    }

    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY is not set; admin and maintenance routes are unprotected");
    }
    if config.resend_api_key.is_none() {
        tracing::info!("RESEND_API_KEY is not set; expiry reminders are only logged");
    }

    let allowed_origins: Vec<HeaderValue> = [config.app_url.as_str(), "http://localhost:3000"]
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let app = create_router(app_state.clone()).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
        std::process::exit(1);
    }
}
