//! Field-level validation helpers shared by the request payloads in `models`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern compiles"));
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-]").expect("pattern compiles"));
static REPEATED_HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("pattern compiles"));

/// One entry of the `errors` array in a 400 envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Flattens `validator` output into the envelope's field errors.
///
/// Every failing field is reported (no short-circuit). Output is sorted by field
/// name so responses are stable across runs.
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(move |err| FieldError::new(field.clone(), describe(err)))
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    let value = err.params.get("value");
    let is_blank = value
        .and_then(|v| v.as_str())
        .is_some_and(|s| s.trim().is_empty());

    match err.code.as_ref() {
        _ if is_blank => "This field is required".to_string(),
        "email" => "Invalid email format".to_string(),
        "length" => {
            let len = value
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);
            let min = err.params.get("min").and_then(|v| v.as_u64());
            let max = err.params.get("max").and_then(|v| v.as_u64());
            match (len, min, max) {
                (Some(len), Some(min), _) if len < min => {
                    format!("Value is too short (minimum {min} characters)")
                }
                (_, _, Some(max)) => format!("Value is too long (maximum {max} characters)"),
                (_, Some(min), None) => format!("Value is too short (minimum {min} characters)"),
                _ => "Invalid length".to_string(),
            }
        }
        _ => "Invalid value".to_string(),
    }
}

/// validate_slug
///
/// Lowercase letters, digits and single hyphens between them.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            "Invalid slug format (use lowercase letters, numbers, and hyphens)".into(),
        ))
    }
}

/// validate_phone
///
/// Accepts 10 to 15 digits, optionally written with `+`, spaces, hyphens or parentheses.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    if allowed && (10..=15).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::new("phone")
            .with_message("Phone number must contain 10 to 15 digits".into()))
    }
}

/// Derives a URL-friendly slug from a title: `"Studio Shoot!"` becomes `"studio-shoot"`.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.trim().to_lowercase().replace(char::is_whitespace, "-");
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let collapsed = REPEATED_HYPHENS.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}
