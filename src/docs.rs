use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::api::settings::{LeaveTypeNameResponse, NewLeaveRequestType, SetEnabled};
use crate::api::users::{MembershipResponse, MembershipUpdate};
use crate::model::leave_request::LeaveStatus;
use crate::model::leave_request_type::{LeaveRequestType, LeaveSettings};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the `bearer_auth` scheme the paths refer to.
pub struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Planopia API",
        version = "1.0.0",
        description = r#"
## Planopia: time tracking and leave management

### Key Features
- **Leave request types**
  - Per-team catalogue of leave categories, each enabled or disabled and with or without approval
  - Display names in Polish and English; requests tagged with disabled or removed types still show a name
- **Leave requests**
  - Submit against an enabled type; types without approval are granted at once
  - Supervisors approve or reject pending requests of their team

### Security
Endpoints under the API prefix require a **JWT Bearer** access token.
Settings changes and role assignment are restricted to **Admin**; decisions on requests to **Supervisor** or **Admin**.
Self-registered accounts start as team-less **Employee** users.
"#,
    ),
    paths(
        crate::api::settings::list_selectable_types,
        crate::api::settings::list_all_types,
        crate::api::settings::replace_types,
        crate::api::settings::add_custom_type,
        crate::api::settings::set_type_enabled,
        crate::api::settings::leave_type_name,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::users::set_membership
    ),
    components(
        schemas(
            LeaveRequestType,
            LeaveSettings,
            NewLeaveRequestType,
            SetEnabled,
            LeaveTypeNameResponse,
            LeaveStatus,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            MembershipUpdate,
            MembershipResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Settings", description = "Leave request type settings"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Users", description = "Team membership and roles"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_leave_type_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/settings/leave-request-types"));
        assert!(doc.paths.paths.contains_key("/api/v1/leave/{leave_id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/v1/users/{user_id}/membership"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
