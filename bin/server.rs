// Vahan Registration Dashboard - JSON API Server
// Serves precomputed dashboard views over HTTP

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use vahan_dashboard::{
    build_dashboard, load_data, CacheKey, DashboardFilters, DashboardView, DataPaths, GroupTotal,
    KpiCard, LoadCache, MakerGrowthRow, SourceMode,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    paths: DataPaths,
    cache: Arc<LoadCache>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(message),
        }
    }
}

/// Filter controls accepted as query parameters, e.g.
/// `/api/kpis?ev=1&from=2020&to=2023`.
#[derive(Debug, Default, Deserialize)]
struct FilterParams {
    ev: Option<u8>,
    from: Option<i32>,
    to: Option<i32>,
}

impl FilterParams {
    fn to_filters(&self) -> DashboardFilters {
        DashboardFilters {
            ev_only: self.ev.unwrap_or(0) != 0,
            year_range: match (self.from, self.to) {
                (Some(from), Some(to)) => Some((from, to)),
                _ => None,
            },
            ..Default::default()
        }
    }
}

/// Run one full dashboard pass for the given filter state.
fn dashboard_pass(state: &AppState, filters: &DashboardFilters) -> anyhow::Result<DashboardView> {
    let ev_only = filters.ev_only;
    let yearly = state.cache.get_or_load(
        CacheKey {
            mode: SourceMode::Yearly,
            ev_only,
        },
        || load_data(&state.paths, SourceMode::Yearly, ev_only),
    )?;
    let monthly = state.cache.get_or_load(
        CacheKey {
            mode: SourceMode::Monthly,
            ev_only,
        },
        || load_data(&state.paths, SourceMode::Monthly, ev_only),
    )?;
    Ok(build_dashboard(&yearly, &monthly, filters))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Full dashboard view for the given filters
async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    match dashboard_pass(&state, &params.to_filters()) {
        Ok(view) => (StatusCode::OK, Json(ApiResponse::ok(view))).into_response(),
        Err(e) => {
            tracing::error!("Error building dashboard: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(DashboardView::Empty, format!("{e:#}"))),
            )
                .into_response()
        }
    }
}

/// GET /api/kpis - KPI cards only
async fn get_kpis(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    match dashboard_pass(&state, &params.to_filters()) {
        Ok(DashboardView::Ready(data)) => {
            (StatusCode::OK, Json(ApiResponse::ok(data.kpis))).into_response()
        }
        Ok(DashboardView::Empty) => {
            (StatusCode::OK, Json(ApiResponse::ok(Vec::<KpiCard>::new()))).into_response()
        }
        Err(e) => {
            tracing::error!("Error building KPIs: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(Vec::<KpiCard>::new(), format!("{e:#}"))),
            )
                .into_response()
        }
    }
}

/// GET /api/trends - Monthly registrations by vehicle category
async fn get_trends(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    match dashboard_pass(&state, &params.to_filters()) {
        Ok(DashboardView::Ready(data)) => {
            (StatusCode::OK, Json(ApiResponse::ok(data.monthly_trend))).into_response()
        }
        Ok(DashboardView::Empty) => (
            StatusCode::OK,
            Json(ApiResponse::ok(Vec::<GroupTotal>::new())),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error building trends: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(Vec::<GroupTotal>::new(), format!("{e:#}"))),
            )
                .into_response()
        }
    }
}

/// GET /api/makers - YoY growth table by manufacturer
async fn get_makers(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    match dashboard_pass(&state, &params.to_filters()) {
        Ok(DashboardView::Ready(data)) => {
            (StatusCode::OK, Json(ApiResponse::ok(data.maker_growth))).into_response()
        }
        Ok(DashboardView::Empty) => (
            StatusCode::OK,
            Json(ApiResponse::ok(Vec::<MakerGrowthRow>::new())),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error building maker table: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(
                    Vec::<MakerGrowthRow>::new(),
                    format!("{e:#}"),
                )),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Vahan Registration Dashboard - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut paths = DataPaths::default();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--yearly" => {
                if let Some(path) = iter.next() {
                    paths.yearly = path.into();
                }
            }
            "--monthly" => {
                if let Some(path) = iter.next() {
                    paths.monthly = path.into();
                }
            }
            other => {
                eprintln!("❌ Unknown argument: {other}");
                eprintln!("Usage: vahan-server [--yearly PATH] [--monthly PATH]");
                std::process::exit(1);
            }
        }
    }

    if !paths.yearly.exists() {
        eprintln!("❌ Yearly source not found at {:?}", paths.yearly);
        eprintln!("   Pass --yearly PATH to point at the yearly CSV export.");
        std::process::exit(1);
    }
    println!("✓ Yearly source:  {:?}", paths.yearly);
    println!("✓ Monthly source: {:?}", paths.monthly);

    // Create shared state
    let state = AppState {
        paths,
        cache: Arc::new(LoadCache::with_default_ttl()),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/kpis", get(get_kpis))
        .route("/trends", get(get_trends))
        .route("/makers", get(get_makers))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Dashboard: http://localhost:3000/api/dashboard");
    println!("   KPIs:      http://localhost:3000/api/kpis");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
