use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_LANGUAGE: &str = "pl";

/// Labels for the built-in leave type keys: key => (pl, en).
static LEAVE_TYPE_LABELS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            ("leaveform.option1", ("Urlop wypoczynkowy", "Vacation leave")),
            ("leaveform.option2", ("Urlop na żądanie", "On-demand leave")),
            ("leaveform.option3", ("Zwolnienie lekarskie", "Sick leave")),
            ("leaveform.option4", ("Urlop okolicznościowy", "Special leave")),
            ("leaveform.option5", ("Urlop bezpłatny", "Unpaid leave")),
            ("leaveform.option6", ("Opieka nad dzieckiem", "Childcare leave")),
        ])
    });

/// Looks `key` up for `language`; unknown keys come back unchanged.
pub fn translate(language: &str, key: &str) -> String {
    match LEAVE_TYPE_LABELS.get(key) {
        Some((_, en)) if language == "en" => en.to_string(),
        Some((pl, _)) => pl.to_string(),
        None => key.to_string(),
    }
}

/// Translation function bound to one language.
pub fn translator(language: &str) -> impl Fn(&str) -> String + '_ {
    move |key: &str| translate(language, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_translate_per_language() {
        assert_eq!(translate("pl", "leaveform.option1"), "Urlop wypoczynkowy");
        assert_eq!(translate("en", "leaveform.option1"), "Vacation leave");
        // anything other than en uses the primary language
        assert_eq!(translate("de", "leaveform.option3"), "Zwolnienie lekarskie");
    }

    #[test]
    fn unknown_keys_pass_through() {
        let t = translator("en");
        assert_eq!(t("custom-abc"), "custom-abc");
    }
}
