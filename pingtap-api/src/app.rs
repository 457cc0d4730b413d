/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use pingtap_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::from_config(pool, config)?;
///
/// let app = build_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use pingtap_shared::auth::middleware::authenticate;
use pingtap_shared::notify::{whatsapp::WhatsAppClient, Notifier};
use pingtap_shared::payments::gateway::{PaymentGateway, RazorpayClient};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            gateway,
            notifier,
        }
    }

    /// Builds the gateway and WhatsApp clients from configuration
    pub fn from_config(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let gateway = RazorpayClient::new(config.payments.gateway_config())?;
        let notifier = WhatsAppClient::new(config.whatsapp.client_config())?;

        Ok(Self::new(db, config, Arc::new(gateway), Arc::new(notifier)))
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                 GET    public
/// /v1/auth/{register,login,refresh}       POST   public
/// /v1/auth/me                             GET PUT
/// /v1/plans                               GET public, POST admin
/// /v1/plans/:id/active                    PUT    admin
/// /v1/coverage                            GET    public
/// /v1/webhooks/razorpay                   POST   public, signed
/// /v1/webhooks/whatsapp                   GET POST public
/// /v1/subscriptions                       GET admin, POST
/// /v1/subscriptions/{mine,usage}          GET
/// /v1/subscriptions/:id/extend            POST   admin
/// /v1/payments                            GET    admin
/// /v1/payments/{orders,checkout,verify}   POST
/// /v1/payments/mine                       GET
/// /v1/payments/:id/invoice                GET
/// /v1/installations                       GET admin, POST
/// /v1/installations/{slots,mine,jobs}     GET
/// /v1/installations/:id/assign            POST   admin
/// /v1/installations/:id/status            PUT    admin or assigned technician
/// /v1/technicians                         GET    admin
/// /v1/profiles/:id/role                   PUT    admin
/// /v1/tickets                             GET admin, POST
/// /v1/tickets/mine                        GET
/// /v1/tickets/:id                         GET
/// /v1/tickets/:id/messages                POST
/// /v1/tickets/:id/status                  PUT    admin
/// /v1/admin/dashboard                     GET    admin
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/plans", get(routes::plans::list_active_plans))
        .route("/coverage", get(routes::coverage::check_coverage))
        .route("/webhooks/razorpay", post(routes::webhooks::razorpay_webhook))
        .route(
            "/webhooks/whatsapp",
            get(routes::webhooks::whatsapp_verify).post(routes::webhooks::whatsapp_receive),
        );

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me).put(routes::auth::update_me))
        .route("/plans", post(routes::plans::create_plan))
        .route("/plans/:id/active", put(routes::plans::set_plan_active))
        .route(
            "/subscriptions",
            get(routes::subscriptions::list_subscriptions)
                .post(routes::subscriptions::create_subscription),
        )
        .route("/subscriptions/mine", get(routes::subscriptions::my_subscriptions))
        .route("/subscriptions/usage", get(routes::subscriptions::usage))
        .route(
            "/subscriptions/:id/extend",
            post(routes::subscriptions::extend_subscription),
        )
        .route("/payments", get(routes::payments::list_payments))
        .route("/payments/orders", post(routes::payments::create_order))
        .route("/payments/checkout", post(routes::payments::checkout))
        .route("/payments/verify", post(routes::payments::verify_payment))
        .route("/payments/mine", get(routes::payments::my_payments))
        .route("/payments/:id/invoice", get(routes::payments::invoice))
        .route(
            "/installations",
            get(routes::installations::list_installations)
                .post(routes::installations::schedule_installation),
        )
        .route("/installations/slots", get(routes::installations::available_slots))
        .route("/installations/mine", get(routes::installations::my_installations))
        .route("/installations/jobs", get(routes::installations::my_jobs))
        .route(
            "/installations/:id/assign",
            post(routes::installations::assign_technician),
        )
        .route(
            "/installations/:id/status",
            put(routes::installations::update_job_status),
        )
        .route("/technicians", get(routes::installations::list_technicians))
        .route("/profiles/:id/role", put(routes::profiles::set_profile_role))
        .route(
            "/tickets",
            get(routes::tickets::list_tickets).post(routes::tickets::create_ticket),
        )
        .route("/tickets/mine", get(routes::tickets::my_tickets))
        .route("/tickets/:id", get(routes::tickets::get_ticket))
        .route("/tickets/:id/messages", post(routes::tickets::send_message))
        .route("/tickets/:id/status", put(routes::tickets::update_ticket_status))
        .route("/admin/dashboard", get(routes::tickets::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Validates the bearer token and stores the `AuthContext` extension
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = authenticate(header_value, state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
