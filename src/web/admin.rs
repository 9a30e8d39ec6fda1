//! Admin API route handlers.
//!
//! Every handler takes an [`AdminContext`], which only the bearer-token
//! extractor below can produce for a web request.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Multipart, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

use super::routes::{department_overviews, ApiResult, AppState, DepartmentOverview};
use crate::auth::{token_from_headers, AdminContext};
use crate::engine::SettlementReport;
use crate::types::{
    Candidate, CandidateUpdate, CatalogSummary, Department, MarketError, NewCandidate,
    NewDepartment, NewPosition, Position,
};

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = MarketError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = token_from_headers(&parts.headers).unwrap_or_default();
        AdminContext::authenticate(presented, &state.admin_token).inspect_err(|_| {
            warn!(method = %parts.method, path = %parts.uri.path(), "Admin request rejected");
        })
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub actor: String,
    pub summary: CatalogSummary,
    pub departments: Vec<DepartmentOverview>,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct CutsRequest {
    pub positions_to_cut: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayoffRequest {
    /// Target state. Omitted means flip the current one.
    #[serde(default)]
    pub laid_off: Option<bool>,
}

impl LayoffRequest {
    /// A bare POST, with no body at all, is a toggle.
    pub fn parse(body: &[u8]) -> Result<Self, MarketError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| MarketError::InvalidInput(e.to_string()))
    }
}

/// Client file name and contents of an uploaded photo.
pub type PhotoUpload = (String, Vec<u8>);

/// Text fields and optional photo from a candidate form.
#[derive(Debug, Default)]
pub struct CandidateForm {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub odds: Option<Decimal>,
    pub position_id: Option<i64>,
    pub photo: Option<PhotoUpload>,
}

impl CandidateForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, MarketError> {
        let mut form = CandidateForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| MarketError::InvalidInput(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photo" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| MarketError::InvalidInput(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.photo = Some((file_name, bytes.to_vec()));
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| MarketError::InvalidInput(e.to_string()))?;
            match name.as_str() {
                "name" => form.name = Some(text),
                "bio" => form.bio = Some(text),
                "odds" if !text.trim().is_empty() => {
                    form.odds = Some(Decimal::from_str(text.trim()).map_err(|_| {
                        MarketError::InvalidInput(format!("odds is not a number: {text}"))
                    })?)
                }
                "position_id" if !text.trim().is_empty() => {
                    form.position_id = Some(text.trim().parse().map_err(|_| {
                        MarketError::InvalidInput(format!("position_id is not an id: {text}"))
                    })?)
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn into_new(
        self,
        default_odds: Decimal,
    ) -> Result<(NewCandidate, Option<PhotoUpload>), MarketError> {
        let position_id = self
            .position_id
            .ok_or_else(|| MarketError::InvalidInput("position_id is required".into()))?;
        let new = NewCandidate {
            position_id,
            name: self.name.unwrap_or_default(),
            bio: self.bio,
            odds: self.odds.unwrap_or(default_odds),
            photo: None,
        };
        Ok((new, self.photo))
    }

    fn into_update(self) -> (CandidateUpdate, Option<PhotoUpload>) {
        let update = CandidateUpdate {
            name: self.name,
            bio: self.bio,
            odds: self.odds,
            position_id: self.position_id,
            photo: None,
        };
        (update, self.photo)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// GET /api/admin/dashboard
pub async fn get_dashboard(
    admin: AdminContext,
    State(state): State<AppState>,
) -> ApiResult<AdminDashboard> {
    Ok(Json(AdminDashboard {
        actor: admin.actor().to_string(),
        summary: state.store.catalog_summary().await?,
        departments: department_overviews(&state.store).await?,
        candidates: state.store.candidates().await?,
    }))
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

/// POST /api/admin/departments
pub async fn create_department(
    _admin: AdminContext,
    State(state): State<AppState>,
    Json(body): Json<NewDepartment>,
) -> Result<(StatusCode, Json<Department>), MarketError> {
    let dept = state.store.create_department(&body).await?;
    Ok((StatusCode::CREATED, Json(dept)))
}

/// PUT /api/admin/departments/:id
pub async fn update_department(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewDepartment>,
) -> ApiResult<Department> {
    Ok(Json(state.store.update_department(id, &body).await?))
}

/// DELETE /api/admin/departments/:id
pub async fn delete_department(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    state.store.delete_department(id).await?;
    info!(admin = %admin, department_id = id, "Department removed by admin");
    Ok(Ack::ok("Department deleted"))
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// POST /api/admin/positions
pub async fn create_position(
    _admin: AdminContext,
    State(state): State<AppState>,
    Json(body): Json<NewPosition>,
) -> Result<(StatusCode, Json<Position>), MarketError> {
    let pos = state.store.create_position(&body).await?;
    Ok((StatusCode::CREATED, Json(pos)))
}

/// PUT /api/admin/positions/:id
pub async fn update_position(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewPosition>,
) -> ApiResult<Position> {
    Ok(Json(state.store.update_position(id, &body).await?))
}

/// POST /api/admin/positions/:id/cuts
pub async fn update_cuts(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CutsRequest>,
) -> ApiResult<Position> {
    Ok(Json(state.store.set_positions_to_cut(id, body.positions_to_cut).await?))
}

/// DELETE /api/admin/positions/:id
pub async fn delete_position(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    state.store.delete_position(id).await?;
    info!(admin = %admin, position_id = id, "Position removed by admin");
    Ok(Ack::ok("Position deleted"))
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// POST /api/admin/candidates (multipart)
pub async fn create_candidate(
    _admin: AdminContext,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Candidate>), MarketError> {
    let (mut new, photo) = CandidateForm::read(multipart).await?.into_new(state.default_odds)?;
    new.validate()?;
    if let Some((file_name, bytes)) = photo {
        new.photo = Some(state.photos.store(&file_name, &bytes).await?);
    }
    let candidate = state.store.create_candidate(&new).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// PUT /api/admin/candidates/:id (multipart, missing fields unchanged)
pub async fn update_candidate(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Candidate> {
    let (mut update, photo) = CandidateForm::read(multipart).await?.into_update();
    update.validate()?;
    if state.store.candidate(id).await?.is_none() {
        return Err(MarketError::not_found("candidate", id));
    }
    if let Some((file_name, bytes)) = photo {
        update.photo = Some(state.photos.store(&file_name, &bytes).await?);
    }
    Ok(Json(state.store.update_candidate(id, &update).await?))
}

/// DELETE /api/admin/candidates/:id
pub async fn delete_candidate(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    state.store.delete_candidate(id).await?;
    info!(admin = %admin, candidate_id = id, "Candidate removed by admin");
    Ok(Ack::ok("Candidate removed from the pool"))
}

/// POST /api/admin/candidates/:id/layoff
pub async fn set_layoff(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<SettlementReport> {
    let request = LayoffRequest::parse(&body)?;
    let laid_off = match request.laid_off {
        Some(flag) => flag,
        None => {
            let current = state
                .store
                .candidate(id)
                .await?
                .ok_or_else(|| MarketError::not_found("candidate", id))?;
            !current.is_laid_off
        }
    };
    Ok(Json(state.settlement.set_laid_off(&admin, id, laid_off).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_form_into_new_defaults() {
        let form = CandidateForm {
            name: Some("Jane".into()),
            position_id: Some(3),
            ..Default::default()
        };
        let (new, photo) = form.into_new(dec!(2.0)).unwrap();
        assert_eq!(new.position_id, 3);
        assert_eq!(new.odds, dec!(2.0));
        assert!(new.photo.is_none());
        assert!(photo.is_none());
    }

    #[test]
    fn test_form_requires_position() {
        let form = CandidateForm {
            name: Some("Jane".into()),
            ..Default::default()
        };
        assert!(matches!(
            form.into_new(dec!(2.0)),
            Err(MarketError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_form_into_update_keeps_missing_fields_unset() {
        let form = CandidateForm {
            odds: Some(dec!(4.5)),
            ..Default::default()
        };
        let (update, _) = form.into_update();
        assert_eq!(update.odds, Some(dec!(4.5)));
        assert!(update.name.is_none());
        assert!(update.bio.is_none());
        assert!(update.position_id.is_none());
    }

    #[test]
    fn test_layoff_request_body() {
        assert_eq!(LayoffRequest::parse(b"").unwrap().laid_off, None);
        assert_eq!(LayoffRequest::parse(b" \n").unwrap().laid_off, None);
        assert_eq!(LayoffRequest::parse(b"{}").unwrap().laid_off, None);
        assert_eq!(
            LayoffRequest::parse(br#"{"laid_off": false}"#).unwrap().laid_off,
            Some(false)
        );
        assert!(matches!(
            LayoffRequest::parse(br#"{"laid_off": "yes"}"#),
            Err(MarketError::InvalidInput(_))
        ));
    }
}
