use crate::api::settings::team_settings;
use crate::auth::auth::AuthUser;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_request_type::LeaveSettings;
use crate::utils::i18n::{DEFAULT_LANGUAGE, translator};
use crate::utils::leave_request_types::{
    display_name, is_valid_selectable_type, list_enabled_types, requires_approval,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// id of an enabled leave request type of the caller's team
    #[schema(example = "leaveform.option1")]
    pub leave_type: String,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "user_id": 1000,
            "start_date": "2026-01-01",
            "end_date": "2026-01-03",
            "leave_type": "leaveform.option1",
            "leave_type_name": "Urlop wypoczynkowy",
            "status": "pending",
            "created_at": "2026-01-01T00:00:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by user ID
    pub user_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = "en")]
    /// Language of `leave_type_name` (`pl` by default)
    pub lang: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 3)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveLanguage {
    /// Language of `leave_type_name` (`pl` by default)
    pub lang: Option<String>,
}

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

/// Page window of a list query; `None` when the page cannot be addressed.
#[derive(Debug, PartialEq)]
struct Pagination {
    page: u32,
    per_page: u32,
    offset: u64,
}

impl Pagination {
    fn from_filter(filter: &LeaveFilter) -> Option<Self> {
        let per_page = u32::try_from(
            filter
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        )
        .ok()?;
        let page = u32::try_from(filter.page.unwrap_or(1).max(1)).ok()?;
        let offset = u64::from(page - 1).checked_mul(u64::from(per_page))?;

        Some(Self {
            page,
            per_page,
            offset,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    /// user who applied
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// stored type id
    #[schema(example = "leaveform.option1")]
    pub leave_type: String,
    /// resolved name, also for types disabled since
    #[schema(example = "Urlop wypoczynkowy")]
    pub leave_type_name: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveResponse {
    fn new(row: LeaveRequest, settings: &LeaveSettings, language: &str) -> Self {
        let translate = translator(language);
        let leave_type_name = display_name(settings, &row.leave_type, Some(&translate), language);

        Self {
            id: row.id,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type: row.leave_type,
            leave_type_name,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Checks a submission against the team's settings and picks its initial status.
fn check_submission(
    settings: &LeaveSettings,
    payload: &CreateLeave,
) -> Result<LeaveStatus, String> {
    if payload.start_date > payload.end_date {
        return Err("start_date cannot be after end_date".to_string());
    }

    if !is_valid_selectable_type(settings, &payload.leave_type) {
        let allowed: Vec<&str> = list_enabled_types(settings)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        return Err(format!(
            "Invalid leave type. Allowed: {}",
            allowed.join(", ")
        ));
    }

    Ok(LeaveStatus::initial(requires_approval(
        settings,
        &payload.leave_type,
    )))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted; approved at once when the type needs no approval",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 12,
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad dates, or type unknown or disabled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let team_id = auth.require_team()?;
    let settings = team_settings(pool.get_ref(), team_id).await?;

    let status = match check_submission(&settings, &payload) {
        Ok(status) => status,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, team_id, start_date, end_date, leave_type, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(team_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.leave_type)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(
        user_id = auth.user_id,
        team_id,
        leave_type = %payload.leave_type,
        %status,
        "Leave request submitted"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "id": result.last_insert_id(),
        "status": status
    })))
}

/// Moves a pending request of the team to `target`.
async fn decide(
    pool: &MySqlPool,
    team_id: u64,
    leave_id: u64,
    target: LeaveStatus,
) -> actix_web::Result<HttpResponse> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ?
        AND team_id = ?
        AND status = ?
        "#,
    )
    .bind(target.as_ref())
    .bind(leave_id)
    .bind(team_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, %target, "Leave decision failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {target}")
    })))
}

/* =========================
Approve leave (Supervisor/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;
    let team_id = auth.require_team()?;

    decide(pool.get_ref(), team_id, path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave (Supervisor/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;
    let team_id = auth.require_team()?;

    decide(pool.get_ref(), team_id, path.into_inner(), LeaveStatus::Rejected).await
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch"),
        LeaveLanguage
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<LeaveLanguage>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;
    let team_id = auth.require_team()?;

    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, team_id, start_date, end_date, leave_type, status, created_at
        FROM leave_requests
        WHERE id = ?
        AND team_id = ?
        "#,
    )
    .bind(leave_id)
    .bind(team_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(row) = leave else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        })));
    };

    let settings = team_settings(pool.get_ref(), team_id).await?;
    let language = query.lang.as_deref().unwrap_or(DEFAULT_LANGUAGE);

    Ok(HttpResponse::Ok().json(LeaveResponse::new(row, &settings, language)))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;
    let team_id = auth.require_team()?;

    // -------------------------
    // Pagination
    // -------------------------
    let Some(pagination) = Pagination::from_filter(&query) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("page must be between 1 and {}", u32::MAX)
        })));
    };

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE team_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(team_id)];

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        if LeaveStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Invalid status. Allowed: pending, approved, rejected"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, team_id, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, user_id, team_id, start_date, end_date, leave_type, status, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q
        .bind(pagination.per_page)
        .bind(pagination.offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, team_id, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let settings = team_settings(pool.get_ref(), team_id).await?;
    let language = query.lang.as_deref().unwrap_or(DEFAULT_LANGUAGE);

    let response = LeaveListResponse {
        data: rows
            .into_iter()
            .map(|row| LeaveResponse::new(row, &settings, language))
            .collect(),
        page: pagination.page,
        per_page: pagination.per_page,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
