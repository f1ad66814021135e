use crate::{
    config::Config,
    handlers::*,
    middleware::{rate_limit, RateLimiter},
    models::CheckoutDefaults,
    services::*,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

const VERIFICATION_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub checkout: Arc<CheckoutService>,
    pub callbacks: Arc<CallbackService>,
    pub status: Arc<StatusService>,
    pub cache: Arc<CacheService>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the HTTP-backed clients described by `config`.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let cache = Arc::new(CacheService::new(&config.redis_url, VERIFICATION_CACHE_TTL).await?);
        let records: Arc<dyn TransactionRecords> =
            Arc::new(HttpRecordStore::new(&config.record_store_url, config.http_timeout)?);
        let network: Arc<dyn PaymentNetwork> = Arc::new(DroppClient::new(
            &config.dropp_api_url,
            config.http_timeout,
            config.status_poll_interval,
        )?);
        let chain: Arc<dyn ChainVerifier> =
            Arc::new(MirrorNodeClient::new(&config.mirror_node_url, config.http_timeout)?);

        Ok(Self::with_services(config, records, network, chain, cache))
    }

    pub fn with_services(
        config: Config,
        records: Arc<dyn TransactionRecords>,
        network: Arc<dyn PaymentNetwork>,
        chain: Arc<dyn ChainVerifier>,
        cache: Arc<CacheService>,
    ) -> Self {
        let verification = Arc::new(VerificationService::new(chain, cache.clone()));

        let defaults = CheckoutDefaults {
            merchant_account: config.merchant_id.clone(),
            callback_url: config.default_callback_url(),
        };
        let checkout = CheckoutService::new(records.clone(), network.clone(), defaults);

        let mut callbacks = CallbackService::new(
            records.clone(),
            network.clone(),
            config.merchant_signing_key.clone(),
        );
        if config.verify_on_callback {
            callbacks = callbacks.with_verification(verification.clone());
        }

        let status = StatusService::new(
            network,
            records,
            verification,
            config.merchant_id.clone(),
            config.merchant_signing_key.clone(),
        );

        Self {
            checkout: Arc::new(checkout),
            callbacks: Arc::new(callbacks),
            status: Arc::new(status),
            cache,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        state.config.rate_limit_max_requests,
        state.config.rate_limit_window,
    ));

    let mut payments = Router::new()
        .route("/checkout", post(create_checkout))
        .route("/post-callback", post(post_callback).get(get_callback))
        .route("/callback", get(get_callback))
        .route("/status/:checkout_id", get(get_status))
        .route("/verify-hedera", post(verify_hedera))
        .route("/verify-hedera/:transaction_id", get(verify_hedera_by_id))
        .route("/transactions/:merchant_id", get(list_transactions));

    if !state.config.is_production() {
        payments = payments
            .route("/debug/decode-transfer", post(decode_transfer))
            .route("/debug/:uuid", get(debug_status));
    }

    let payments = payments.layer(axum_middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/payments", payments)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
