use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::cookie::CookieSession;
use super::gate::{require_role, PageGate, Viewer};
use super::pages::{Nav, PageView, ADMIN_SECTIONS, USER_SECTIONS};
use super::AppState;
use crate::api::models::{
    ConsumptionRecord, Meter, NewConsumption, NewMeter, UserInfo, UserSummary,
};
use crate::error::AppError;
use crate::session::{ADMIN_DASHBOARD_PATH, USER_DASHBOARD_PATH};
use crate::validation::{validate_fields, ConsumptionForm, MeterForm};

#[derive(Debug, Serialize)]
pub struct Notice {
    pub message: &'static str,
}

/// Profile edit: the full record plus the names of the fields the viewer
/// touched. Only those fields are validated.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub user: UserInfo,
    #[serde(default)]
    pub modified: Vec<String>,
}

/// Pages and sections available to standard users (role 1) and admins.
pub fn user_routes(cookie_secure: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(user_dashboard))
        .route("/profile", get(get_profile).post(update_profile))
        .route("/consumption", get(list_consumption).post(add_consumption))
        .route("/meters", get(list_meters))
        .route_layer(middleware::from_fn_with_state(
            PageGate::user(cookie_secure),
            require_role,
        ))
}

/// Administrator pages (role 99).
pub fn admin_routes(cookie_secure: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(admin_dashboard))
        .route("/profile", get(get_profile).post(update_profile))
        .route("/consumption", get(list_consumption).post(add_consumption))
        .route("/consumption/update", post(update_consumption))
        .route("/meters", get(list_meters).post(add_meter))
        .route("/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(
            PageGate::admin(cookie_secure),
            require_role,
        ))
}

async fn user_dashboard(session: CookieSession) -> Json<PageView> {
    let nav = Nav::for_viewer(&session, USER_DASHBOARD_PATH);
    Json(PageView::new("userDashboard", "Dashboard", nav).with_sections(USER_SECTIONS))
}

async fn admin_dashboard(session: CookieSession) -> Json<PageView> {
    let nav = Nav::for_viewer(&session, ADMIN_DASHBOARD_PATH);
    Json(PageView::new("adminDashboard", "Admin Dashboard", nav).with_sections(ADMIN_SECTIONS))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<UserInfo>, AppError> {
    let user = state.api.get_user(&viewer.token).await?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserInfo>, AppError> {
    let user = &update.user;
    validate_fields(
        update
            .modified
            .iter()
            .map(|field| (field.as_str(), user.field(field).unwrap_or(""))),
    )
    .into_result()?;

    let updated = state.api.update_user(&viewer.token, user).await?;
    tracing::info!(
        user_id = viewer.claims.user_id,
        fields = update.modified.len(),
        "Profile updated"
    );
    Ok(Json(updated))
}

async fn list_consumption(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<ConsumptionRecord>>, AppError> {
    Ok(Json(state.api.get_consumption(&viewer.token).await?))
}

async fn add_consumption(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(form): Json<ConsumptionForm>,
) -> Result<Json<Notice>, AppError> {
    form.validate()?;

    state
        .api
        .add_consumption(
            &viewer.token,
            &NewConsumption {
                meter_id: form.meter_id,
                consumption_kwh: form.consumption_kwh,
            },
        )
        .await?;

    tracing::info!(meter_id = form.meter_id, "Consumption reading submitted");
    Ok(Json(Notice {
        message: "Data submitted successfully",
    }))
}

async fn update_consumption(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(record): Json<ConsumptionRecord>,
) -> Result<Json<ConsumptionRecord>, AppError> {
    let updated = state.api.update_consumption(&viewer.token, &record).await?;
    tracing::info!(record_id = record.id, "Consumption record updated");
    Ok(Json(updated))
}

async fn list_meters(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<Meter>>, AppError> {
    Ok(Json(state.api.get_meters(&viewer.token).await?))
}

async fn add_meter(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(form): Json<MeterForm>,
) -> Result<Json<Notice>, AppError> {
    form.validate()?;

    state
        .api
        .add_meter(
            &viewer.token,
            &NewMeter {
                meter_id: form.meter_id.trim().to_string(),
                owner_id: form.owner_id,
            },
        )
        .await?;

    tracing::info!(owner_id = form.owner_id, "Meter added");
    Ok(Json(Notice {
        message: "Meter added successfully",
    }))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(state.api.get_all_users(&viewer.token).await?))
}
