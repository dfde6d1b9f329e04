use crate::auth::auth::{AuthUser, bearer_token};
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    error::ErrorInternalServerError,
    web::Data,
};
use serde_json::json;

/// Guards the API scope: the bearer access token is checked once and the
/// resulting [`AuthUser`] is left in the request extensions for handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("App config missing"))?;

    let user = bearer_token(req.headers())
        .and_then(|token| AuthUser::from_token(token, &config.jwt_secret));

    match user {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(reason) => {
            tracing::debug!(reason, path = req.path(), "Rejected request");
            let resp = HttpResponse::Unauthorized().json(json!({ "error": reason }));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
