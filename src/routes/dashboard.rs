use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CombinedChartPoint, DisplayOptions, MarketData, PeriodFilter};
use crate::render::{render_dashboard, render_svg, Dashboard};
use crate::services::dashboard_service::DashboardStatus;
use crate::services::period_filter::today_utc;
use crate::services::view_cache::ChartView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_status))
        .route("/symbol", post(select_symbol))
        .route("/reload", post(reload))
        .route("/data", get(get_data))
        .route("/chart", get(get_chart))
        .route("/chart.svg", get(get_chart_svg))
}

#[derive(Debug, Deserialize)]
pub struct SelectSymbolRequest {
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

/// Chart toggles; anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub period: Option<String>,
    pub sma5: Option<bool>,
    pub sma25: Option<bool>,
    pub sma50: Option<bool>,
    pub sma75: Option<bool>,
    #[serde(alias = "bb")]
    pub bollinger: Option<bool>,
    pub rsi: Option<bool>,
    pub macd: Option<bool>,
}

impl ChartQuery {
    fn options(&self) -> DisplayOptions {
        let defaults = DisplayOptions::default();
        DisplayOptions {
            sma5: self.sma5.unwrap_or(defaults.sma5),
            sma25: self.sma25.unwrap_or(defaults.sma25),
            sma50: self.sma50.unwrap_or(defaults.sma50),
            sma75: self.sma75.unwrap_or(defaults.sma75),
            bollinger: self.bollinger.unwrap_or(defaults.bollinger),
            rsi: self.rsi.unwrap_or(defaults.rsi),
            macd: self.macd.unwrap_or(defaults.macd),
        }
    }
}

#[derive(Serialize)]
struct ViewResponse<'a> {
    period: PeriodFilter,
    cutoff: Option<NaiveDate>,
    #[serde(flatten)]
    data: &'a MarketData,
    combined: &'a [CombinedChartPoint],
}

fn parse_period(raw: Option<&str>) -> Result<PeriodFilter, AppError> {
    match raw {
        Some(raw) => Ok(raw.parse::<PeriodFilter>()?),
        None => Ok(PeriodFilter::default()),
    }
}

fn current_view(state: &AppState, period: Option<&str>) -> Result<std::sync::Arc<ChartView>, AppError> {
    let period = parse_period(period)?;
    state.session.view(period, today_utc())
}

pub async fn get_status(State(state): State<AppState>) -> Json<DashboardStatus> {
    info!("GET /api/dashboard - Dashboard status");
    Json(state.session.status())
}

pub async fn select_symbol(
    State(state): State<AppState>,
    Json(request): Json<SelectSymbolRequest>,
) -> Result<(StatusCode, Json<DashboardStatus>), AppError> {
    info!("POST /api/dashboard/symbol - Selecting {}", request.symbol);
    state.session.select_symbol(&request.symbol).map_err(|e| {
        error!("Rejected symbol selection {}: {}", request.symbol, e);
        e
    })?;
    Ok((StatusCode::ACCEPTED, Json(state.session.status())))
}

pub async fn reload(State(state): State<AppState>) -> Result<(StatusCode, Json<DashboardStatus>), AppError> {
    info!("POST /api/dashboard/reload - Reloading current symbol");
    state.session.reload()?;
    Ok((StatusCode::ACCEPTED, Json(state.session.status())))
}

pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    info!("GET /api/dashboard/data - period {:?}", query.period);
    let view = current_view(&state, query.period.as_deref())?;
    let body = ViewResponse {
        period: view.period,
        cutoff: view.cutoff,
        data: &view.data,
        combined: &view.combined,
    };
    Ok(Json(body).into_response())
}

fn build_chart(state: &AppState, query: &ChartQuery) -> Result<Dashboard, AppError> {
    let view = current_view(state, query.period.as_deref())?;
    Ok(render_dashboard(&view, &query.options(), &state.layout))
}

pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Dashboard>, AppError> {
    info!("GET /api/dashboard/chart - {:?}", query);
    Ok(Json(build_chart(&state, &query)?))
}

pub async fn get_chart_svg(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, AppError> {
    info!("GET /api/dashboard/chart.svg - {:?}", query);
    let dashboard = build_chart(&state, &query)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], render_svg(&dashboard)))
}
