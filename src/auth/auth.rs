use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::{model::role::Role, models::TokenType};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    http::header::{self, HeaderMap},
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user belongs to a team
    pub team_id: Option<u64>,
}

/// Token of an `Authorization: Bearer <token>` header, or why there is none.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;

    value
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must start with Bearer")
}

impl AuthUser {
    /// Validates a bearer access token against the configured secret.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, &'static str> {
        let claims = verify_token(token, secret).map_err(|_| "Invalid token")?;

        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            team_id: claims.team_id,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let user = match req.app_data::<Data<Config>>() {
            Some(config) => bearer_token(req.headers())
                .and_then(|token| AuthUser::from_token(token, &config.jwt_secret))
                .map_err(ErrorUnauthorized),
            None => Err(ErrorInternalServerError("Config missing")),
        };
        ready(user)
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_supervisor_or_admin(&self) -> actix_web::Result<()> {
        if self.role.can_approve() {
            Ok(())
        } else {
            Err(ErrorForbidden("Supervisor/Admin only"))
        }
    }

    /// Team whose settings and requests this user works with.
    pub fn require_team(&self) -> actix_web::Result<u64> {
        self.team_id.ok_or_else(|| ErrorForbidden("No team assigned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    fn config() -> Config {
        Config::for_tests("test-secret")
    }

    fn subject(role: u8, team_id: Option<u64>) -> TokenSubject {
        TokenSubject {
            user_id: 1,
            username: "marta".into(),
            role,
            team_id,
        }
    }

    #[actix_web::test]
    async fn extracts_user_from_access_token() {
        let token = generate_access_token(&subject(2, Some(5)), "test-secret", 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(config()))
            .to_http_request();

        let user = AuthUser::from_request(&req, &mut Payload::None).await.unwrap();
        assert_eq!(user.role, Role::Supervisor);
        assert_eq!(user.require_team().unwrap(), 5);
        assert!(user.require_supervisor_or_admin().is_ok());
        assert!(user.require_admin().is_err());
    }

    #[actix_web::test]
    async fn rejects_missing_and_refresh_tokens() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .to_http_request();
        assert!(AuthUser::from_request(&req, &mut Payload::None).await.is_err());

        let (refresh, _) = generate_refresh_token(&subject(1, None), "test-secret", 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .app_data(Data::new(config()))
            .to_http_request();
        assert!(AuthUser::from_request(&req, &mut Payload::None).await.is_err());
    }

    #[test]
    fn bearer_header_problems_are_named() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(req.headers()), Err("Missing Authorization header"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert_eq!(
            bearer_token(req.headers()),
            Err("Authorization header must start with Bearer")
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc"))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), Ok("abc"));
    }

    #[test]
    fn employees_without_team_are_forbidden() {
        let user = AuthUser {
            user_id: 3,
            username: "jan".into(),
            role: Role::Employee,
            team_id: None,
        };
        assert!(user.require_team().is_err());
        assert!(user.require_supervisor_or_admin().is_err());
    }
}
