use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use hydropak_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::invoice_pdf::PdfStorage,
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Test harness: the full router backed by an in-memory SQLite database,
/// auth bypass on, invoice PDFs written to a tempdir.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _pdf_dir: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

fn test_config(pdf_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_key_for_testing_purposes_only".to_string(),
        jwt_expiration: 3600,
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "development".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: true,
        auth_disabled: true,
        cors_allowed_origins: None,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_acquire_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        default_tax_rate: 0.08,
        event_channel_capacity: 64,
        pdf_s3_bucket: None,
        pdf_s3_prefix: "invoices".to_string(),
        pdf_url_ttl_secs: 3600,
        pdf_local_dir: pdf_dir.display().to_string(),
        pdf_public_base: "/static/invoices".to_string(),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let pdf_dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(pdf_dir.path());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            AuthConfig::new(
                cfg.jwt_secret.clone(),
                Duration::from_secs(cfg.jwt_expiration),
                true,
            ),
            db_arc.clone(),
        ));

        let pdf_storage = PdfStorage::from_config(&cfg)
            .await
            .expect("pdf storage init");

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            pdf_storage,
            &cfg,
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/health", axum::routing::get(hydropak_api::health_check))
            .nest("/api", hydropak_api::api_routes())
            .nest(
                "/api/auth",
                hydropak_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _pdf_dir: pdf_dir,
            _event_task: event_task,
        }
    }

    /// Issue a request against the in-process router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    pub async fn read_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse json")
    }
}
