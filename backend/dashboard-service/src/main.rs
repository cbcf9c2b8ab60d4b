use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use dashboard_service::handlers::{self, feed::AppFeedStore, pint_of_week::AppPintProtocol};
use dashboard_service::middleware::{JwtAuthMiddleware, JwtValidator, TimingMiddleware};
use dashboard_service::services::auth_gate::AuthGate;
use dashboard_service::services::feed::{FeedAggregator, FeedStore, PgFeedSource};
use dashboard_service::services::graphic::GraphicRenderer;
use dashboard_service::services::history::{HistoryStore, RedisBackend};
use dashboard_service::services::leaderboard::LeaderboardService;
use dashboard_service::services::pint_of_week::{
    GeminiWinnerChooser, PgCandidateSource, PintOfTheWeekProtocol,
};
use dashboard_service::services::social::SocialAngleService;
use gemini_client::GeminiClient;
use redis::aio::ConnectionManager;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: sqlx::Pool<sqlx::Postgres>,
    redis_manager: Arc<Mutex<ConnectionManager>>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_redis(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.redis_manager.lock().await;
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(redis::RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            )))
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "dashboard-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "dashboard-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    checks.insert(
        "postgresql".to_string(),
        match pg_result {
            Ok(_) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms: pg_latency,
            },
            Err(e) => {
                ready = false;
                ComponentCheck {
                    status: ComponentStatus::Unhealthy,
                    message: format!("PostgreSQL connection failed: {}", e),
                    latency_ms: pg_latency,
                }
            }
        },
    );

    let start = Instant::now();
    let redis_result = state.check_redis().await;
    let redis_latency = Some(start.elapsed().as_millis() as u64);
    checks.insert(
        "redis".to_string(),
        match redis_result {
            Ok(_) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "Redis ping successful".to_string(),
                latency_ms: redis_latency,
            },
            Err(e) => {
                ready = false;
                ComponentCheck {
                    status: ComponentStatus::Unhealthy,
                    message: format!("Redis ping failed: {}", e),
                    latency_ms: redis_latency,
                }
            }
        },
    );

    let response = ReadinessResponse {
        ready,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match dashboard_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting dashboard-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Database pool with a bounded acquire timeout
    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;

    tracing::info!("Connected to database, migrations applied");

    // Redis connection for the result history and readiness checks
    let redis_client = redis::Client::open(config.cache.url.clone()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Invalid Redis URL: {e}"),
        )
    })?;
    let redis_manager = ConnectionManager::new(redis_client).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize Redis connection: {e}"),
        )
    })?;

    // Gemini client shared by all AI flows
    let gemini = Arc::new(GeminiClient::new(
        config.gemini.api_key.clone(),
        config.gemini.model.clone(),
        config.gemini.image_model.clone(),
    ));
    if !gemini.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; AI requests will fail until configured");
    }

    // Services
    let auth_gate = web::Data::new(AuthGate::new(db_pool.clone()));
    let feed_store: web::Data<AppFeedStore> = web::Data::new(FeedStore::new(FeedAggregator::new(
        PgFeedSource::new(db_pool.clone()),
        config.feed.page_size,
    )));
    let social_service = web::Data::new(SocialAngleService::new(gemini.clone()));
    let leaderboard_service =
        web::Data::new(LeaderboardService::new(db_pool.clone(), gemini.clone()));
    let pint_protocol: web::Data<AppPintProtocol> = web::Data::new(PintOfTheWeekProtocol::new(
        PgCandidateSource::new(db_pool.clone()),
        GeminiWinnerChooser::new(gemini.clone()),
        GraphicRenderer::new(gemini.clone()),
    ));
    let history_store = web::Data::new(HistoryStore::new(RedisBackend::new(
        redis_manager.clone(),
        config.cache.history_key.clone(),
    )));
    let storage_config = web::Data::new(config.storage.clone());

    let jwt_validator = Arc::new(JwtValidator::new(&config.auth.jwt_secret));

    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        redis_manager: Arc::new(Mutex::new(redis_manager)),
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TimingMiddleware)
            .app_data(health_state.clone())
            .app_data(auth_gate.clone())
            .app_data(feed_store.clone())
            .app_data(social_service.clone())
            .app_data(leaderboard_service.clone())
            .app_data(pint_protocol.clone())
            .app_data(history_store.clone())
            .app_data(storage_config.clone())
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(jwt_validator.clone()))
                    .route("/me", web::get().to(handlers::session::me))
                    .route("/feed", web::get().to(handlers::feed::get_feed))
                    .route("/feed/refresh", web::post().to(handlers::feed::refresh_feed))
                    .route("/feed/more", web::post().to(handlers::feed::load_more))
                    .route(
                        "/social-angle",
                        web::post().to(handlers::social::social_angle),
                    )
                    .route(
                        "/pint-of-the-week/run",
                        web::post().to(handlers::pint_of_week::run),
                    )
                    .route(
                        "/pint-of-the-week/history",
                        web::get().to(handlers::pint_of_week::list_history),
                    )
                    .route(
                        "/pint-of-the-week/history",
                        web::post().to(handlers::pint_of_week::save_history),
                    )
                    .route(
                        "/leaderboard/post",
                        web::post().to(handlers::leaderboard::generate_post),
                    ),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
