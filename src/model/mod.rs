pub mod leave_request;
pub mod leave_request_type;
pub mod role;
pub mod user;
