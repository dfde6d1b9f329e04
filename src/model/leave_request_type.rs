use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A leave category a team can enable, disable and configure for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "custom-1",
    "name": "Zdalna",
    "nameEn": "Remote",
    "isEnabled": true,
    "requireApproval": false
}))]
pub struct LeaveRequestType {
    /// built-in key (e.g. `leaveform.option1`) or a generated `custom-*` id
    #[schema(example = "leaveform.option1")]
    pub id: String,

    #[schema(example = "Urlop wypoczynkowy")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Vacation leave", nullable = true)]
    pub name_en: Option<String>,

    #[serde(default)]
    #[schema(example = true)]
    pub is_enabled: bool,

    /// Unset means approval is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = true, nullable = true)]
    pub require_approval: Option<bool>,
}

impl LeaveRequestType {
    pub fn requires_approval(&self) -> bool {
        self.require_approval.unwrap_or(true)
    }

    /// Secondary-language name, ignoring blank values.
    pub fn english_name(&self) -> Option<&str> {
        self.name_en.as_deref().filter(|n| !n.is_empty())
    }
}

/// Per-team settings snapshot the leave type lookups run against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSettings {
    #[serde(default, deserialize_with = "lenient_types")]
    pub leave_request_types: Vec<LeaveRequestType>,
}

impl LeaveSettings {
    pub fn new(leave_request_types: Vec<LeaveRequestType>) -> Self {
        Self { leave_request_types }
    }

    /// Builds settings from the stored `leave_request_types` column.
    /// Anything that is not a JSON array means no types are configured.
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::new(types_from_value(value)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored leave request types are not valid JSON");
                Self::default()
            }
        }
    }
}

/// A team's type list exactly as stored. Entries that do not read as a type
/// record are kept as they are, so edits never lose them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredLeaveTypes {
    entries: Vec<Value>,
}

impl StoredLeaveTypes {
    /// Same reading rules as [`LeaveSettings::from_stored`]: anything but a
    /// JSON array starts an empty list.
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => Self { entries },
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored leave request types are not valid JSON");
                Self::default()
            }
        }
    }

    pub fn from_types(types: &[LeaveRequestType]) -> serde_json::Result<Self> {
        let entries = types
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<_>>()?;
        Ok(Self { entries })
    }

    /// The readable entries, in stored order.
    pub fn types(&self) -> Vec<LeaveRequestType> {
        types_from_value(Value::Array(self.entries.clone()))
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn push(&mut self, leave_type: &LeaveRequestType) -> serde_json::Result<()> {
        self.entries.push(serde_json::to_value(leave_type)?);
        Ok(())
    }

    /// Sets `isEnabled` on the first readable entry with `id`, leaving its
    /// other fields untouched. `None` when no such entry exists.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Option<LeaveRequestType> {
        self.entries.iter_mut().find_map(|entry| {
            let mut parsed = serde_json::from_value::<LeaveRequestType>(entry.clone()).ok()?;
            if parsed.id != id {
                return None;
            }
            entry
                .as_object_mut()?
                .insert("isEnabled".to_string(), Value::Bool(enabled));
            parsed.is_enabled = enabled;
            Some(parsed)
        })
    }

    pub fn to_stored(&self) -> String {
        Value::Array(self.entries.clone()).to_string()
    }
}

fn lenient_types<'de, D>(deserializer: D) -> Result<Vec<LeaveRequestType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(types_from_value(value))
}

/// Non-array values yield no types; array entries that are not
/// type records are skipped.
pub fn types_from_value(value: Value) -> Vec<LeaveRequestType> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_non_array_types_mean_none_configured() {
        let missing: LeaveSettings = serde_json::from_value(json!({})).unwrap();
        assert!(missing.leave_request_types.is_empty());

        let null: LeaveSettings =
            serde_json::from_value(json!({ "leaveRequestTypes": null })).unwrap();
        assert!(null.leave_request_types.is_empty());

        let object: LeaveSettings =
            serde_json::from_value(json!({ "leaveRequestTypes": { "id": "x" } })).unwrap();
        assert!(object.leave_request_types.is_empty());

        assert!(LeaveSettings::from_stored("not json").leave_request_types.is_empty());
        assert!(LeaveSettings::from_stored("\"text\"").leave_request_types.is_empty());
    }

    #[test]
    fn broken_entries_are_skipped_and_defaults_applied() {
        let settings = LeaveSettings::from_stored(
            r#"[{"id":"a","name":"A"},{"name":"no id"},42,{"id":"b","name":"B","isEnabled":true}]"#,
        );

        let ids: Vec<_> = settings
            .leave_request_types
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);

        let a = &settings.leave_request_types[0];
        assert!(!a.is_enabled);
        assert_eq!(a.require_approval, None);
        assert!(a.requires_approval());
    }

    #[test]
    fn stored_list_keeps_unreadable_entries_on_edit() {
        let mut stored = StoredLeaveTypes::from_stored(
            r#"[{"id":"legacy","isEnabled":"yes"},{"id":"a","name":"A","isEnabled":false,"note":"kept"}]"#,
        );
        assert_eq!(stored.types().len(), 1);

        let toggled = stored.set_enabled("a", true).unwrap();
        assert!(toggled.is_enabled);
        assert!(stored.set_enabled("legacy", true).is_none());

        let written: Value = serde_json::from_str(&stored.to_stored()).unwrap();
        assert_eq!(
            written,
            json!([
                {"id":"legacy","isEnabled":"yes"},
                {"id":"a","name":"A","isEnabled":true,"note":"kept"}
            ])
        );
    }

    #[test]
    fn stored_list_from_non_array_is_empty() {
        assert!(StoredLeaveTypes::from_stored("{}").entries().is_empty());
        assert!(StoredLeaveTypes::from_stored("oops").entries().is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let t = LeaveRequestType {
            id: "custom-1".into(),
            name: "Zdalna".into(),
            name_en: Some("Remote".into()),
            is_enabled: true,
            require_approval: Some(false),
        };
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["nameEn"], "Remote");
        assert_eq!(value["isEnabled"], true);
        assert_eq!(value["requireApproval"], false);
    }

    #[test]
    fn blank_english_name_is_ignored() {
        let t = LeaveRequestType {
            id: "x".into(),
            name: "Nazwa".into(),
            name_en: Some(String::new()),
            is_enabled: true,
            require_approval: None,
        };
        assert_eq!(t.english_name(), None);
    }
}
