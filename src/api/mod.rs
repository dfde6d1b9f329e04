pub mod leave_request;
pub mod settings;
pub mod users;
