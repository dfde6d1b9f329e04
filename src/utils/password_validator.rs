use once_cell::sync::Lazy;
use regex::Regex;

/// Whole password: 8+ characters from letters, digits and `@$!%*?&#`.
static ALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&#]{8,}$").expect("valid password pattern"));

/// Character classes that must each appear at least once.
static REQUIRED_CLASSES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [r"[a-z]", r"[A-Z]", r"[0-9]", r"[@$!%*?&#]"]
        .map(|pattern| Regex::new(pattern).expect("valid password pattern"))
});

/// Password strength rule applied on registration.
///
/// At least 8 characters with a lowercase letter, an uppercase letter, a digit
/// and one of `@$!%*?&#`. No other characters are accepted.
pub fn is_valid_password(password: &str) -> bool {
    ALLOWED.is_match(password) && REQUIRED_CLASSES.iter().all(|re| re.is_match(password))
}
