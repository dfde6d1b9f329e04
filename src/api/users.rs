use crate::auth::auth::AuthUser;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MembershipUpdate {
    /// 1 = Admin, 2 = Supervisor, 3 = Employee
    #[schema(example = 2)]
    pub role_id: u8,
}

#[derive(Serialize, ToSchema)]
pub struct MembershipResponse {
    #[schema(example = 12)]
    pub user_id: u64,
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(example = 4)]
    pub team_id: u64,
}

/// Assign a user to the admin's team with the given role (admin)
///
/// Only users without a team or already in the admin's team can be changed.
/// The new role and team are carried by tokens issued from the next login or
/// refresh.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/membership",
    params(
        ("user_id" = u64, Path, description = "User id")
    ),
    request_body(
        content = MembershipUpdate,
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Membership updated", body = MembershipResponse),
        (status = 400, description = "Unknown role", body = Object, example = json!({
            "message": "Invalid role id 9"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such user outside other teams")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn set_membership(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<MembershipUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let team_id = auth.require_team()?;
    let user_id = path.into_inner();

    let Some(role) = Role::from_id(payload.role_id) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Invalid role id {}", payload.role_id)
        })));
    };

    let result = sqlx::query(
        r#"
        UPDATE users
        SET role_id = ?, team_id = ?
        WHERE id = ?
        AND (team_id IS NULL OR team_id = ?)
        "#,
    )
    .bind(role as u8)
    .bind(team_id)
    .bind(user_id)
    .bind(team_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id, "Failed to update membership");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // sqlx connects with CLIENT_FOUND_ROWS, so an unchanged row still counts
    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": format!("User {user_id} not found")
        })));
    }

    tracing::info!(
        user_id,
        team_id,
        role_id = role as u8,
        by = auth.user_id,
        "Membership updated"
    );

    Ok(HttpResponse::Ok().json(MembershipResponse {
        user_id,
        role_id: role as u8,
        team_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token};
    use crate::config::Config;
    use actix_web::{App, http::StatusCode, test};

    fn token(role: Role, team_id: Option<u64>) -> String {
        generate_access_token(
            &TokenSubject {
                user_id: 5,
                username: "ola".into(),
                role: role as u8,
                team_id,
            },
            "test-secret",
            60,
        )
        .unwrap()
    }

    async fn put_membership(bearer: &str, body: serde_json::Value) -> StatusCode {
        // never connected: every case here is decided before a query
        let pool = MySqlPool::connect_lazy("mysql://planopia@127.0.0.1:1/planopia").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests("test-secret")))
                .app_data(web::Data::new(pool))
                .route("/users/{user_id}/membership", web::put().to(set_membership)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/users/9/membership")
            .insert_header(("Authorization", format!("Bearer {bearer}")))
            .set_json(body)
            .to_request();
        test::call_service(&app, req).await.status()
    }

    #[actix_web::test]
    async fn only_admins_assign_roles() {
        for role in [Role::Employee, Role::Supervisor] {
            let status = put_membership(&token(role, Some(4)), json!({ "role_id": 1 })).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[actix_web::test]
    async fn admin_needs_a_team_and_a_known_role() {
        let status = put_membership(&token(Role::Admin, None), json!({ "role_id": 2 })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let status = put_membership(&token(Role::Admin, Some(4)), json!({ "role_id": 9 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
