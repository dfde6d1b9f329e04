use crate::model::leave_request_type::{LeaveRequestType, LeaveSettings};
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// Placeholder shown when a request carries no type at all.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Type selectable for a new submission: present and enabled.
pub fn resolve_enabled_type<'a>(
    settings: &'a LeaveSettings,
    type_key: &str,
) -> Option<&'a LeaveRequestType> {
    settings
        .leave_request_types
        .iter()
        .find(|t| t.id == type_key && t.is_enabled)
}

pub fn is_valid_selectable_type(settings: &LeaveSettings, type_key: &str) -> bool {
    resolve_enabled_type(settings, type_key).is_some()
}

/// Types that cannot be resolved always require approval.
pub fn requires_approval(settings: &LeaveSettings, type_key: &str) -> bool {
    resolve_enabled_type(settings, type_key)
        .map(LeaveRequestType::requires_approval)
        .unwrap_or(true)
}

/// Enabled types in configured order, for selection lists.
pub fn list_enabled_types(settings: &LeaveSettings) -> Vec<&LeaveRequestType> {
    settings
        .leave_request_types
        .iter()
        .filter(|t| t.is_enabled)
        .collect()
}

/// Lookup ignoring `isEnabled`; display of historical requests only.
pub fn resolve_any_type<'a>(
    settings: &'a LeaveSettings,
    type_id: &str,
) -> Option<&'a LeaveRequestType> {
    settings.leave_request_types.iter().find(|t| t.id == type_id)
}

/// Human readable name for a type id.
///
/// A configured type wins (English name for `en` when set). Otherwise the id
/// is tried as a translation key, and the raw id is the last resort.
pub fn display_name(
    settings: &LeaveSettings,
    type_id: &str,
    translate: Option<&dyn Fn(&str) -> String>,
    language: &str,
) -> String {
    if type_id.is_empty() {
        return UNKNOWN_TYPE.to_string();
    }

    if let Some(t) = resolve_any_type(settings, type_id) {
        return match t.english_name() {
            Some(name_en) if language == "en" => name_en.to_string(),
            _ => t.name.clone(),
        };
    }

    if let Some(translate) = translate {
        let translated = translate(type_id);
        if translated != type_id {
            return translated;
        }
    }

    type_id.to_string()
}

#[derive(Debug, Display, PartialEq)]
pub enum SettingsError {
    #[display(fmt = "Leave request type id must not be empty")]
    EmptyId,
    #[display(fmt = "Leave request type '{}' must have a name", _0)]
    EmptyName(String),
    #[display(fmt = "Duplicate leave request type id '{}'", _0)]
    DuplicateId(String),
    #[display(fmt = "Leave request type '{}' not found", _0)]
    NotFound(String),
}

impl std::error::Error for SettingsError {}

impl ResponseError for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SettingsError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

/// Checked before every settings write so ids stay unique per team.
pub fn validate_leave_request_types(types: &[LeaveRequestType]) -> Result<(), SettingsError> {
    let mut seen = HashSet::with_capacity(types.len());

    for t in types {
        if t.id.trim().is_empty() {
            return Err(SettingsError::EmptyId);
        }
        if t.name.trim().is_empty() {
            return Err(SettingsError::EmptyName(t.id.clone()));
        }
        if !seen.insert(t.id.as_str()) {
            return Err(SettingsError::DuplicateId(t.id.clone()));
        }
    }

    Ok(())
}

pub fn new_custom_type_id() -> String {
    format!("custom-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave_type(id: &str, enabled: bool, require_approval: Option<bool>) -> LeaveRequestType {
        LeaveRequestType {
            id: id.to_string(),
            name: format!("{id} pl"),
            name_en: Some(format!("{id} en")),
            is_enabled: enabled,
            require_approval,
        }
    }

    fn remote_settings() -> LeaveSettings {
        LeaveSettings::new(vec![LeaveRequestType {
            id: "custom-1".into(),
            name: "Zdalna".into(),
            name_en: Some("Remote".into()),
            is_enabled: true,
            require_approval: Some(false),
        }])
    }

    fn polish(key: &str) -> String {
        match key {
            "leaveform.option1" => "Urlop wypoczynkowy".to_string(),
            other => other.to_string(),
        }
    }

    #[test]
    fn empty_settings_degrade_without_failing() {
        let settings = LeaveSettings::default();

        assert!(resolve_enabled_type(&settings, "leaveform.option1").is_none());
        assert!(!is_valid_selectable_type(&settings, "leaveform.option1"));
        assert!(requires_approval(&settings, "leaveform.option1"));
        assert!(list_enabled_types(&settings).is_empty());
        assert!(resolve_any_type(&settings, "leaveform.option1").is_none());
        assert_eq!(
            display_name(&settings, "leaveform.option1", None, "pl"),
            "leaveform.option1"
        );
    }

    #[test]
    fn disabled_type_is_not_selectable_but_still_resolves() {
        let mut settings = LeaveSettings::new(vec![leave_type("sick", true, None)]);
        assert!(is_valid_selectable_type(&settings, "sick"));

        settings.leave_request_types[0].is_enabled = false;
        assert!(!is_valid_selectable_type(&settings, "sick"));
        assert_eq!(resolve_any_type(&settings, "sick").map(|t| t.id.as_str()), Some("sick"));
        assert_eq!(display_name(&settings, "sick", None, "en"), "sick en");
    }

    #[test]
    fn approval_follows_enabled_type_and_defaults_to_required() {
        let settings = LeaveSettings::new(vec![
            leave_type("free", true, Some(false)),
            leave_type("strict", true, Some(true)),
            leave_type("unset", true, None),
            leave_type("off", false, Some(false)),
        ]);

        assert!(!requires_approval(&settings, "free"));
        assert!(requires_approval(&settings, "strict"));
        assert!(requires_approval(&settings, "unset"));
        // disabled types are looked up as absent
        assert!(requires_approval(&settings, "off"));
        assert!(requires_approval(&settings, "missing"));
    }

    #[test]
    fn enabled_list_keeps_configured_order() {
        let settings = LeaveSettings::new(vec![
            leave_type("c", true, None),
            leave_type("a", false, None),
            leave_type("b", true, None),
        ]);

        let ids: Vec<_> = list_enabled_types(&settings)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["c", "b"]);
    }

    #[test]
    fn display_name_prefers_language_specific_name() {
        let settings = remote_settings();
        assert_eq!(display_name(&settings, "custom-1", None, "en"), "Remote");
        assert_eq!(display_name(&settings, "custom-1", None, "pl"), "Zdalna");

        let no_english = LeaveSettings::new(vec![LeaveRequestType {
            name_en: None,
            ..leave_type("x", true, None)
        }]);
        assert_eq!(display_name(&no_english, "x", None, "en"), "x pl");
    }

    #[test]
    fn display_name_falls_back_to_translation_then_raw_id() {
        let settings = remote_settings();
        let identity = |key: &str| key.to_string();

        assert_eq!(
            display_name(&settings, "leaveform.option1", Some(&polish), "pl"),
            "Urlop wypoczynkowy"
        );
        assert_eq!(
            display_name(&settings, "leaveform.option1", Some(&identity), "pl"),
            "leaveform.option1"
        );
        assert_eq!(display_name(&settings, "", Some(&polish), "pl"), UNKNOWN_TYPE);
    }

    #[test]
    fn remote_example_needs_no_approval() {
        let settings = remote_settings();
        assert!(!requires_approval(&settings, "custom-1"));
        assert_eq!(display_name(&settings, "custom-1", None, "en"), "Remote");
    }

    #[test]
    fn first_match_wins_on_reads() {
        let settings = LeaveSettings::new(vec![
            leave_type("dup", false, None),
            leave_type("dup", true, Some(false)),
        ]);
        assert!(resolve_any_type(&settings, "dup").is_some_and(|t| !t.is_enabled));
        // the enabled-only scan skips the disabled copy
        assert!(is_valid_selectable_type(&settings, "dup"));
    }

    #[test]
    fn validation_rejects_duplicates_and_blanks() {
        assert_eq!(
            validate_leave_request_types(&[leave_type("a", true, None), leave_type("a", false, None)]),
            Err(SettingsError::DuplicateId("a".into()))
        );
        assert_eq!(
            validate_leave_request_types(&[leave_type(" ", true, None)]),
            Err(SettingsError::EmptyId)
        );

        let mut unnamed = leave_type("b", true, None);
        unnamed.name = String::new();
        assert_eq!(
            validate_leave_request_types(&[unnamed]),
            Err(SettingsError::EmptyName("b".into()))
        );

        assert!(validate_leave_request_types(&[
            leave_type("a", true, None),
            leave_type("b", true, None)
        ])
        .is_ok());
    }

    #[test]
    fn custom_ids_are_unique() {
        let id = new_custom_type_id();
        assert!(id.starts_with("custom-"));
        assert_ne!(id, new_custom_type_id());
    }
}
