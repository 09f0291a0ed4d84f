use actix_web::{App, HttpServer, middleware::Logger, web};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swissinvoice::{
  adapters::http::{InvoiceRouteDependencies, configure_invoice_routes, configure_reference_routes},
  domain::invoice::{InvoiceService, InvoiceServiceDependencies},
  infrastructure::{
    config::Config,
    notifications::notification_sink,
    persistence::postgres::{
      PostgresCustomerRepository, PostgresInvoiceLineItemRepository, PostgresInvoiceRepository,
      PostgresPaymentRepository, PostgresTimeEntryRepository,
    },
  },
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // Initialize tracing subscriber for logging
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "swissinvoice=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting SwissInvoice");

  let config = Config::load().map_err(|e| {
    tracing::error!("Failed to load configuration: {}", e);
    std::io::Error::new(
      std::io::ErrorKind::InvalidInput,
      format!("Invalid configuration: {}", e),
    )
  })?;
  tracing::info!("Configuration loaded successfully");

  let settings = config.invoicing.to_settings().map_err(|e| {
    tracing::error!("Invalid invoicing settings: {}", e);
    std::io::Error::new(
      std::io::ErrorKind::InvalidInput,
      format!("Invalid invoicing settings: {}", e),
    )
  })?;

  // Set up database connection pool with timeout
  tracing::info!("Connecting to database");

  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    std::io::Error::new(
      std::io::ErrorKind::TimedOut,
      format!(
        "Database connection timed out after {} seconds",
        config.database.connect_timeout_seconds
      ),
    )
  })?
  .map_err(|e| {
    tracing::error!("Failed to connect to database: {}", e);
    match e {
      sqlx::Error::Io(_) => std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Could not connect to database. Is PostgreSQL running?",
      ),
      _ => std::io::Error::other(format!("Database error: {}", e)),
    }
  })?;

  tracing::info!("Database connection pool created");

  // Run database migrations
  tracing::info!("Running database migrations");
  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .map_err(|e| {
      tracing::error!("Failed to run database migrations: {}", e);
      std::io::Error::other(format!("Migration error: {}", e))
    })?;
  tracing::info!("Database migrations completed");

  let notifier = notification_sink(&config.notifications)
    .map_err(|e| std::io::Error::other(e.to_string()))?;

  // Initialize invoice service
  let invoice_service = Arc::new(InvoiceService::new(
    InvoiceServiceDependencies {
      invoice_repo: Arc::new(PostgresInvoiceRepository::new(db_pool.clone())),
      line_item_repo: Arc::new(PostgresInvoiceLineItemRepository::new(db_pool.clone())),
      payment_repo: Arc::new(PostgresPaymentRepository::new(db_pool.clone())),
      customer_repo: Arc::new(PostgresCustomerRepository::new(db_pool.clone())),
      time_entry_repo: Arc::new(PostgresTimeEntryRepository::new(db_pool.clone())),
      notifier,
    },
    settings,
  ));

  let invoice_routes = InvoiceRouteDependencies::new(invoice_service);

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    App::new()
      .wrap(Logger::default())
      .service(
        web::scope("/api/v1/companies/{company_id}/invoices")
          .configure(|cfg| configure_invoice_routes(cfg, invoice_routes.clone())),
      )
      .service(web::scope("/api/v1").configure(configure_reference_routes))
      // Health check endpoint
      .route("/health", web::get().to(health_check))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await
}

/// Health check endpoint
async fn health_check() -> &'static str {
  "OK"
}
