//! Public API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<WebState>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::{GameConfig, UploadsConfig};
use crate::engine::{SettlementEngine, WagerService};
use crate::storage::Store;
use crate::types::{
    Candidate, CatalogSummary, Department, LeaderboardEntry, MarketError, Position, UserProfile,
};
use crate::uploads::PhotoStore;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct WebState {
    pub store: Store,
    pub wagers: WagerService,
    pub settlement: SettlementEngine,
    pub photos: Arc<dyn PhotoStore>,
    pub admin_token: SecretString,
    pub leaderboard_limit: i64,
    pub default_odds: Decimal,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl WebState {
    pub fn new(
        store: Store,
        photos: Arc<dyn PhotoStore>,
        admin_token: SecretString,
        uploads: &UploadsConfig,
        game: &GameConfig,
    ) -> Self {
        Self {
            wagers: WagerService::new(store.clone()),
            settlement: SettlementEngine::new(store.clone()),
            store,
            photos,
            admin_token,
            leaderboard_limit: game.leaderboard_limit,
            default_odds: game.default_odds,
            uploads_dir: PathBuf::from(&uploads.dir),
            max_upload_bytes: uploads.max_bytes,
        }
    }
}

pub type AppState = Arc<WebState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl MarketError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::MarketClosed | MarketError::UsernameTaken => StatusCode::CONFLICT,
            MarketError::InvalidAmount
            | MarketError::InsufficientFunds { .. }
            | MarketError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MarketError::PayoutOverflow => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::Unauthorized => StatusCode::UNAUTHORIZED,
            MarketError::Storage(_) | MarketError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_internal() {
            error!(error = %self, "Request failed");
            "Internal error, nothing was changed".to_string()
        } else {
            self.to_string()
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, MarketError>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentOverview {
    #[serde(flatten)]
    pub department: Department,
    pub positions: Vec<Position>,
    pub total_employees: i64,
    pub positions_to_cut: i64,
}

impl DepartmentOverview {
    fn new(department: Department, positions: Vec<Position>) -> Self {
        let total_employees = positions.iter().map(|p| p.total_employees).sum();
        let positions_to_cut = positions.iter().map(|p| p.positions_to_cut).sum();
        Self {
            department,
            positions,
            total_employees,
            positions_to_cut,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionDetail {
    #[serde(flatten)]
    pub position: Position,
    pub remaining: i64,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentDetail {
    #[serde(flatten)]
    pub department: Department,
    pub positions: Vec<PositionDetail>,
    pub total_employees: i64,
    pub positions_to_cut: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub position: Position,
    pub department: Department,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub coins: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: i64,
    pub coins: i64,
}

#[derive(Debug, Deserialize)]
pub struct BetRequest {
    pub user_id: i64,
    pub candidate_id: i64,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct BetResponse {
    pub success: bool,
    pub message: String,
    pub bet_id: i64,
    pub remaining_coins: i64,
    pub odds_at_bet: Decimal,
    pub potential_win: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<CatalogSummary> {
    Ok(Json(state.store.catalog_summary().await?))
}

/// Every department with its positions, in id order.
pub(crate) async fn department_overviews(
    store: &Store,
) -> Result<Vec<DepartmentOverview>, MarketError> {
    let mut by_department: HashMap<i64, Vec<Position>> = HashMap::new();
    for position in store.positions().await? {
        by_department
            .entry(position.department_id)
            .or_default()
            .push(position);
    }
    Ok(store
        .departments()
        .await?
        .into_iter()
        .map(|dept| {
            let positions = by_department.remove(&dept.id).unwrap_or_default();
            DepartmentOverview::new(dept, positions)
        })
        .collect())
}

/// GET /api/departments
pub async fn get_departments(State(state): State<AppState>) -> ApiResult<Vec<DepartmentOverview>> {
    Ok(Json(department_overviews(&state.store).await?))
}

/// GET /api/departments/:id
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<DepartmentDetail> {
    let department = state
        .store
        .department(id)
        .await?
        .ok_or_else(|| MarketError::not_found("department", id))?;

    let mut by_position: HashMap<i64, Vec<Candidate>> = HashMap::new();
    for candidate in state.store.candidates_in_department(id).await? {
        by_position
            .entry(candidate.position_id)
            .or_default()
            .push(candidate);
    }

    let positions: Vec<PositionDetail> = state
        .store
        .positions_in_department(id)
        .await?
        .into_iter()
        .map(|position| PositionDetail {
            remaining: position.remaining(),
            candidates: by_position.remove(&position.id).unwrap_or_default(),
            position,
        })
        .collect();

    Ok(Json(DepartmentDetail {
        total_employees: positions.iter().map(|p| p.position.total_employees).sum(),
        positions_to_cut: positions.iter().map(|p| p.position.positions_to_cut).sum(),
        department,
        positions,
    }))
}

/// GET /api/candidates/:id
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<CandidateView> {
    let candidate = state
        .store
        .candidate(id)
        .await?
        .ok_or_else(|| MarketError::not_found("candidate", id))?;
    let position = state
        .store
        .position(candidate.position_id)
        .await?
        .ok_or_else(|| MarketError::not_found("position", candidate.position_id))?;
    let department = state
        .store
        .department(position.department_id)
        .await?
        .ok_or_else(|| MarketError::not_found("department", position.department_id))?;
    Ok(Json(CandidateView {
        candidate,
        position,
        department,
    }))
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), MarketError> {
    let user = state.wagers.register_user(&body.username).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user_id: user.id,
            coins: user.coins,
        }),
    ))
}

/// GET /api/users/:id
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserView> {
    let user = state
        .store
        .user(id)
        .await?
        .ok_or_else(|| MarketError::not_found("user", id))?;
    Ok(Json(UserView {
        id: user.id,
        username: user.username,
        coins: user.coins,
    }))
}

/// GET /api/users/:id/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<UserProfile> {
    Ok(Json(state.store.user_profile(id).await?))
}

/// POST /api/bet
pub async fn place_bet(
    State(state): State<AppState>,
    Json(body): Json<BetRequest>,
) -> ApiResult<BetResponse> {
    let receipt = state
        .wagers
        .place_bet(body.user_id, body.candidate_id, body.amount)
        .await
        .inspect_err(|e| {
            if !e.is_internal() {
                warn!(user_id = body.user_id, candidate_id = body.candidate_id, error = %e, "Bet rejected");
            }
        })?;
    Ok(Json(BetResponse {
        success: true,
        message: format!("Bet placed on {}!", receipt.candidate_name),
        bet_id: receipt.bet_id,
        remaining_coins: receipt.new_balance,
        odds_at_bet: receipt.odds_at_bet,
        potential_win: receipt.potential_payout,
    }))
}

/// GET /api/leaderboard?limit=N
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let limit = query.limit.unwrap_or(state.leaderboard_limit);
    Ok(Json(state.store.leaderboard(limit).await?))
}
