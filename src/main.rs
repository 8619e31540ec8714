use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use janhit::config::Config;
use janhit::db::{create_pool, init_db, queries, AppState};
use janhit::email::ResendChannel;
use janhit::gateway::{HttpGateway, SignatureVerifier};
use janhit::handlers;
use janhit::models::{CreateComplaint, CreateRtiRequest};

#[derive(Parser, Debug)]
#[command(name = "janhit")]
#[command(about = "Payment and fulfillment backend for the Janhit civic platform")]
struct Cli {
    /// Seed the database with dev data (user, session, complaint, RTI draft)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev data for testing.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    let user = queries::create_user(&conn, "dev@janhit.local", "Dev Citizen")
        .expect("Failed to create dev user");
    let token =
        queries::create_session(&conn, &user.id, 30 * 86400).expect("Failed to create session");

    let complaint = queries::create_complaint(
        &conn,
        &user.id,
        &CreateComplaint {
            description: "Streetlights on MG Road have been out for three weeks.".to_string(),
            location: "MG Road, Ward 12".to_string(),
        },
    )
    .expect("Failed to create dev complaint");

    let rti = queries::create_rti_request(
        &conn,
        &user.id,
        &CreateRtiRequest {
            subject: "Road repair expenditure 2024-25".to_string(),
            department: "Public Works Department".to_string(),
            body_text: "To the Public Information Officer,\n\nKindly provide certified copies of \
                        all sanction orders and utilization certificates for road repair works \
                        carried out in Ward 12 during the financial year 2024-25."
                .to_string(),
        },
    )
    .expect("Failed to create dev RTI request");

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED");
    tracing::info!("User: {} ({})", user.email, user.id);
    tracing::info!("Session token: {}", token);
    tracing::info!("Complaint: {}", complaint.id);
    tracing::info!("RTI draft: {}", rti.id);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "janhit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(HttpGateway::new(
            &config.gateway_api_url,
            &config.gateway_key_id,
            &config.gateway_key_secret,
        )),
        verifier: SignatureVerifier::new(
            &config.gateway_key_secret,
            &config.gateway_webhook_secret,
        ),
        notifier: Arc::new(ResendChannel::new(
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        base_url: config.base_url.clone(),
        gateway_key_id: config.gateway_key_id.clone(),
        department_email: config.department_email.clone(),
        pricing: config.pricing,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set JANHIT_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Janhit server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
