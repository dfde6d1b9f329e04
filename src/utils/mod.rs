pub mod i18n;
pub mod leave_request_types;
pub mod password_validator;
pub mod settings_cache;
