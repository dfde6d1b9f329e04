use crate::auth::auth::AuthUser;
use crate::model::leave_request_type::{LeaveRequestType, LeaveSettings, StoredLeaveTypes};
use crate::utils::i18n::{DEFAULT_LANGUAGE, translator};
use crate::utils::leave_request_types::{
    SettingsError, display_name, list_enabled_types, new_custom_type_id,
    validate_leave_request_types,
};
use crate::utils::settings_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaveRequestType {
    #[schema(example = "Praca zdalna")]
    pub name: String,
    #[schema(example = "Remote work", nullable = true)]
    pub name_en: Option<String>,
    /// defaults to enabled
    #[schema(example = true)]
    pub is_enabled: Option<bool>,
    #[schema(example = false, nullable = true)]
    pub require_approval: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetEnabled {
    #[schema(example = false)]
    pub is_enabled: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LanguageQuery {
    /// `en` or `pl` (default)
    pub lang: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveTypeNameResponse {
    #[schema(example = "leaveform.option1")]
    pub id: String,
    #[schema(example = "Urlop wypoczynkowy")]
    pub name: String,
}

/// Team settings through the cache; storage failures become a 500.
pub(crate) async fn team_settings(
    pool: &MySqlPool,
    team_id: u64,
) -> actix_web::Result<Arc<LeaveSettings>> {
    settings_cache::get(pool, team_id).await.map_err(|e| {
        tracing::error!(error = %e, team_id, "Failed to load team settings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/// Runs `edit` against the team's stored list under the settings row lock.
async fn edit_types<T>(
    pool: &MySqlPool,
    team_id: u64,
    edit: impl FnOnce(&mut StoredLeaveTypes) -> actix_web::Result<T>,
) -> actix_web::Result<T> {
    let outcome = settings_cache::update(pool, team_id, edit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, team_id, "Failed to store team settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })??;

    tracing::info!(team_id, "Leave request types updated");
    Ok(outcome)
}

fn encoding_error(e: serde_json::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Failed to encode leave request type");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

fn replace_all(stored: &mut StoredLeaveTypes, types: &[LeaveRequestType]) -> actix_web::Result<()> {
    validate_leave_request_types(types)?;
    *stored = StoredLeaveTypes::from_types(types).map_err(encoding_error)?;
    Ok(())
}

fn append_type(stored: &mut StoredLeaveTypes, created: &LeaveRequestType) -> actix_web::Result<()> {
    stored.push(created).map_err(encoding_error)?;
    validate_leave_request_types(&stored.types())?;
    Ok(())
}

fn toggle_type(
    stored: &mut StoredLeaveTypes,
    type_id: &str,
    enabled: bool,
) -> actix_web::Result<LeaveRequestType> {
    stored
        .set_enabled(type_id, enabled)
        .ok_or_else(|| SettingsError::NotFound(type_id.to_string()).into())
}

/// Enabled leave request types, in configured order
#[utoipa::path(
    get,
    path = "/api/v1/settings/leave-request-types",
    responses(
        (status = 200, description = "Types selectable for new requests", body = [LeaveRequestType]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn list_selectable_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let team_id = auth.require_team()?;
    let settings = team_settings(pool.get_ref(), team_id).await?;

    Ok(HttpResponse::Ok().json(list_enabled_types(&settings)))
}

/// Every configured type, disabled ones included (admin)
#[utoipa::path(
    get,
    path = "/api/v1/settings/leave-request-types/all",
    responses(
        (status = 200, description = "All configured types", body = [LeaveRequestType]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn list_all_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let team_id = auth.require_team()?;
    let settings = team_settings(pool.get_ref(), team_id).await?;

    Ok(HttpResponse::Ok().json(&settings.leave_request_types))
}

/// Replace the team's leave request types (admin)
#[utoipa::path(
    put,
    path = "/api/v1/settings/leave-request-types",
    request_body(
        content = [LeaveRequestType],
        description = "Full list of types; ids must be unique",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Types saved", body = [LeaveRequestType]),
        (status = 400, description = "Empty or duplicate id, or empty name", body = Object, example = json!({
            "message": "Duplicate leave request type id 'leaveform.option1'"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn replace_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<LeaveRequestType>>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let team_id = auth.require_team()?;

    let types = payload.into_inner();
    edit_types(pool.get_ref(), team_id, |stored| replace_all(stored, &types)).await?;

    Ok(HttpResponse::Ok().json(types))
}

/// Add a custom leave request type with a generated id (admin)
#[utoipa::path(
    post,
    path = "/api/v1/settings/leave-request-types",
    request_body(
        content = NewLeaveRequestType,
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Type created", body = LeaveRequestType),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn add_custom_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewLeaveRequestType>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let team_id = auth.require_team()?;

    let payload = payload.into_inner();
    let created = LeaveRequestType {
        id: new_custom_type_id(),
        name: payload.name.trim().to_string(),
        name_en: payload
            .name_en
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        is_enabled: payload.is_enabled.unwrap_or(true),
        require_approval: payload.require_approval,
    };

    edit_types(pool.get_ref(), team_id, |stored| append_type(stored, &created)).await?;

    Ok(HttpResponse::Created().json(created))
}

/// Enable or disable a type; requests already using it are untouched (admin)
#[utoipa::path(
    put,
    path = "/api/v1/settings/leave-request-types/{type_id}/enabled",
    params(
        ("type_id" = String, Path, description = "Leave request type id")
    ),
    request_body(
        content = SetEnabled,
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Type updated", body = LeaveRequestType),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn set_type_enabled(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<SetEnabled>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let team_id = auth.require_team()?;
    let type_id = path.into_inner();

    let enabled = payload.is_enabled;
    let updated = edit_types(pool.get_ref(), team_id, |stored| {
        toggle_type(stored, &type_id, enabled)
    })
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Display name of a type id, also for disabled or unknown ids
#[utoipa::path(
    get,
    path = "/api/v1/leave-request-types/{type_id}/name",
    params(
        ("type_id" = String, Path, description = "Leave request type id"),
        LanguageQuery
    ),
    responses(
        (status = 200, description = "Resolved display name", body = LeaveTypeNameResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn leave_type_name(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<LanguageQuery>,
) -> actix_web::Result<impl Responder> {
    let team_id = auth.require_team()?;
    let settings = team_settings(pool.get_ref(), team_id).await?;

    let type_id = path.into_inner();
    let language = query.lang.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    let translate = translator(language);
    let name = display_name(&settings, &type_id, Some(&translate), language);

    Ok(HttpResponse::Ok().json(LeaveTypeNameResponse { id: type_id, name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const STORED: &str = r#"[
        {"id":"leaveform.option1","name":"Urlop wypoczynkowy","isEnabled":true},
        {"id":"legacy-1","isEnabled":"true"},
        {"id":"custom-a","name":"Zdalna","isEnabled":true,"requireApproval":false}
    ]"#;

    fn custom(name: &str) -> LeaveRequestType {
        LeaveRequestType {
            id: new_custom_type_id(),
            name: name.to_string(),
            name_en: None,
            is_enabled: true,
            require_approval: None,
        }
    }

    fn written(stored: &StoredLeaveTypes) -> Vec<Value> {
        match serde_json::from_str(&stored.to_stored()).unwrap() {
            Value::Array(entries) => entries,
            other => panic!("not an array: {other}"),
        }
    }

    #[test]
    fn adding_a_type_keeps_unreadable_entries() {
        let mut stored = StoredLeaveTypes::from_stored(STORED);
        let created = custom("Szkolenie");

        append_type(&mut stored, &created).unwrap();

        let entries = written(&stored);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1], json!({"id":"legacy-1","isEnabled":"true"}));
        assert_eq!(entries[3]["id"], created.id);
    }

    #[test]
    fn toggling_a_type_keeps_unreadable_entries() {
        let mut stored = StoredLeaveTypes::from_stored(STORED);

        let updated = toggle_type(&mut stored, "custom-a", false).unwrap();
        assert!(!updated.is_enabled);
        assert_eq!(updated.require_approval, Some(false));

        let entries = written(&stored);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], json!({"id":"legacy-1","isEnabled":"true"}));
        assert_eq!(entries[2]["isEnabled"], false);
    }

    #[test]
    fn toggling_an_unknown_or_unreadable_type_is_not_found() {
        let mut stored = StoredLeaveTypes::from_stored(STORED);

        for id in ["missing", "legacy-1"] {
            let err = toggle_type(&mut stored, id, true).unwrap_err();
            assert_eq!(
                err.as_response_error().status_code(),
                actix_web::http::StatusCode::NOT_FOUND
            );
        }
        assert_eq!(stored, StoredLeaveTypes::from_stored(STORED));
    }

    #[test]
    fn invalid_additions_are_rejected() {
        let mut stored = StoredLeaveTypes::from_stored(STORED);
        let err = append_type(&mut stored, &custom("  ")).unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn replacing_writes_exactly_the_new_list() {
        let mut stored = StoredLeaveTypes::from_stored(STORED);
        let only = custom("Opieka");

        replace_all(&mut stored, std::slice::from_ref(&only)).unwrap();
        assert_eq!(stored.types(), [only]);
        assert_eq!(written(&stored).len(), 1);
    }
}
