//! Input validation for user routes.
//!
//! Both entry points return a [`ValidationFailure`] listing every field-level
//! problem instead of failing on the first one.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::models::{UserChanges, UserRole};

/// ASCII digits only; `\d` would also accept other Unicode digits.
static USER_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("user id pattern is valid"));

/// Order in which update fields are reported.
const UPDATE_FIELDS: [&str; 4] = ["name", "email", "password", "role"];

/// One problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field; `None` for object-level failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    fn new(field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Input rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub details: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn single(field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            details: vec![FieldError::new(field, message)],
        }
    }

    fn from_errors(errors: &ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| FieldError {
                    field: Some(field.clone()),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();

        sort_details(&mut details);

        Self { details }
    }
}

fn sort_details(details: &mut [FieldError]) {
    details.sort_by_key(|d| {
        d.field
            .as_deref()
            .and_then(|f| UPDATE_FIELDS.iter().position(|known| *known == f))
            .unwrap_or(UPDATE_FIELDS.len())
    });
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.details.iter().map(|d| d.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Parse a user id route parameter.
///
/// Accepts only a string of digits whose value is a positive `i64`.
pub fn parse_user_id(raw: &str) -> Result<i64, ValidationFailure> {
    let invalid = || ValidationFailure::single(Some("id"), "User ID must be a valid number");

    if !USER_ID_PATTERN.is_match(raw) {
        return Err(invalid());
    }

    let id: i64 = raw.parse().map_err(|_| invalid())?;
    if id <= 0 {
        return Err(ValidationFailure::single(
            Some("id"),
            "User ID must be a positive number",
        ));
    }

    Ok(id)
}

/// Body of an update request, as received.
///
/// Unknown keys are ignored. A key sent as `null` is kept apart from a
/// missing key and rejected. Call [`UpdateUserRequest::into_changes`] to
/// normalize and validate.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(from = "RawUpdate")]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email cannot exceed 255 characters")
    )]
    pub email: Option<String>,

    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,

    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,

    /// Keys present with a `null` value.
    null_fields: Vec<&'static str>,
}

/// Wire shape: outer `None` is a missing key, `Some(None)` an explicit null.
#[derive(Deserialize)]
struct RawUpdate {
    #[serde(default, deserialize_with = "present")]
    name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    password: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    role: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<RawUpdate> for UpdateUserRequest {
    fn from(raw: RawUpdate) -> Self {
        let mut null_fields = Vec::new();
        let mut take = |field: &'static str, value: Option<Option<String>>| match value {
            Some(None) => {
                null_fields.push(field);
                None
            }
            other => other.flatten(),
        };

        let name = take("name", raw.name);
        let email = take("email", raw.email);
        let password = take("password", raw.password);
        let role = take("role", raw.role);

        Self {
            name,
            email,
            password,
            role,
            null_fields,
        }
    }
}

impl UpdateUserRequest {
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        password: Option<String>,
        role: Option<String>,
    ) -> Self {
        Self {
            name,
            email,
            password,
            role,
            null_fields: Vec::new(),
        }
    }

    /// Trim the name; trim and lower-case the email.
    fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| e.trim().to_lowercase()),
            ..self
        }
    }

    /// Normalize and validate into a set of changes.
    ///
    /// Field errors are reported before the "at least one field" check.
    pub fn into_changes(self) -> Result<UserChanges, ValidationFailure> {
        let request = self.normalized();

        let mut details = match request.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => ValidationFailure::from_errors(&errors).details,
        };
        details.extend(
            request
                .null_fields
                .iter()
                .map(|&field| FieldError::new(Some(field), null_message(field))),
        );
        if !details.is_empty() {
            sort_details(&mut details);
            return Err(ValidationFailure { details });
        }

        let role = request
            .role
            .as_deref()
            .map(str::parse::<UserRole>)
            .transpose()
            .map_err(|_| ValidationFailure::single(Some("role"), ROLE_MESSAGE))?;

        let changes = UserChanges {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        };

        if changes.is_empty() {
            return Err(ValidationFailure::single(
                None,
                "At least one field must be provided for update",
            ));
        }

        Ok(changes)
    }
}

fn null_message(field: &str) -> &'static str {
    match field {
        "name" => "Name must be a string",
        "email" => "Email must be a string",
        "password" => "Password must be a string",
        _ => ROLE_MESSAGE,
    }
}

const ROLE_MESSAGE: &str = r#"Role must be either "user" or "admin""#;

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    match name.chars().count() {
        0 => Err(rule("name_empty", "Name cannot be empty")),
        n if n > 255 => Err(rule("name_too_long", "Name cannot exceed 255 characters")),
        _ => Ok(()),
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    match password.chars().count() {
        n if n < 6 => Err(rule(
            "password_too_short",
            "Password must be at least 6 characters",
        )),
        n if n > 128 => Err(rule(
            "password_too_long",
            "Password cannot exceed 128 characters",
        )),
        _ => Ok(()),
    }
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    role.parse::<UserRole>()
        .map(|_| ())
        .map_err(|_| rule("role", ROLE_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> UpdateUserRequest {
        serde_json::from_value(value).unwrap()
    }

    fn messages(failure: &ValidationFailure) -> Vec<&str> {
        failure.details.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_parse_user_id_valid() {
        assert_eq!(parse_user_id("1").unwrap(), 1);
        assert_eq!(parse_user_id("42").unwrap(), 42);
        assert_eq!(parse_user_id("007").unwrap(), 7);
    }

    #[test]
    fn test_parse_user_id_not_a_number() {
        for raw in ["abc", "", "-1", "1.5", " 1", "1e3", "١٢"] {
            let err = parse_user_id(raw).unwrap_err();
            assert_eq!(messages(&err), vec!["User ID must be a valid number"], "{raw:?}");
            assert_eq!(err.details[0].field.as_deref(), Some("id"));
        }
    }

    #[test]
    fn test_parse_user_id_not_positive() {
        let err = parse_user_id("0").unwrap_err();
        assert_eq!(messages(&err), vec!["User ID must be a positive number"]);
        assert!(parse_user_id("0000").is_err());
    }

    #[test]
    fn test_parse_user_id_overflow() {
        let err = parse_user_id("99999999999999999999999").unwrap_err();
        assert_eq!(messages(&err), vec!["User ID must be a valid number"]);
    }

    #[test]
    fn test_update_empty_object() {
        let err = request(json!({})).into_changes().unwrap_err();
        assert_eq!(
            messages(&err),
            vec!["At least one field must be provided for update"]
        );
        assert!(err.details[0].field.is_none());
    }

    #[test]
    fn test_update_unknown_keys_only() {
        let err = request(json!({"nickname": "x"})).into_changes().unwrap_err();
        assert_eq!(
            messages(&err),
            vec!["At least one field must be provided for update"]
        );
    }

    #[test]
    fn test_update_normalizes_email_and_name() {
        let changes = request(json!({
            "name": "  Alice  ",
            "email": "  Alice@Example.COM ",
        }))
        .into_changes()
        .unwrap();

        assert_eq!(changes.name.as_deref(), Some("Alice"));
        assert_eq!(changes.email.as_deref(), Some("alice@example.com"));
        assert!(changes.password.is_none());
        assert!(changes.role.is_none());
    }

    #[test]
    fn test_update_password_not_trimmed() {
        let changes = request(json!({"password": "  abcd  "}))
            .into_changes()
            .unwrap();
        assert_eq!(changes.password.as_deref(), Some("  abcd  "));
    }

    #[test]
    fn test_update_role_values() {
        let changes = request(json!({"role": "admin"})).into_changes().unwrap();
        assert_eq!(changes.role, Some(UserRole::Admin));

        let err = request(json!({"role": "superuser"})).into_changes().unwrap_err();
        assert_eq!(messages(&err), vec![ROLE_MESSAGE]);
        assert_eq!(err.details[0].field.as_deref(), Some("role"));
    }

    #[test]
    fn test_update_field_errors() {
        let err = request(json!({
            "name": "   ",
            "email": "not-an-email",
            "password": "123",
        }))
        .into_changes()
        .unwrap_err();

        assert_eq!(
            messages(&err),
            vec![
                "Name cannot be empty",
                "Invalid email format",
                "Password must be at least 6 characters",
            ]
        );
    }

    #[test]
    fn test_update_length_limits() {
        let long_name = "n".repeat(256);
        let err = request(json!({"name": long_name})).into_changes().unwrap_err();
        assert_eq!(messages(&err), vec!["Name cannot exceed 255 characters"]);

        let long_password = "p".repeat(129);
        let err = request(json!({"password": long_password}))
            .into_changes()
            .unwrap_err();
        assert_eq!(messages(&err), vec!["Password cannot exceed 128 characters"]);

        let ok = request(json!({"name": "n".repeat(255), "password": "p".repeat(128)}))
            .into_changes();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_update_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        let err = request(json!({"email": email})).into_changes().unwrap_err();
        assert!(messages(&err).contains(&"Email cannot exceed 255 characters"));
    }

    #[test]
    fn test_update_explicit_null_role() {
        let err = request(json!({"name": "A2", "role": null}))
            .into_changes()
            .unwrap_err();
        assert_eq!(messages(&err), vec![ROLE_MESSAGE]);
        assert_eq!(err.details[0].field.as_deref(), Some("role"));
    }

    #[test]
    fn test_update_explicit_null_name() {
        let err = request(json!({"name": null})).into_changes().unwrap_err();
        assert_eq!(messages(&err), vec!["Name must be a string"]);
        assert_eq!(err.details[0].field.as_deref(), Some("name"));
    }

    #[test]
    fn test_update_nulls_sorted_with_field_errors() {
        let err = request(json!({"role": null, "email": "bad", "name": null}))
            .into_changes()
            .unwrap_err();
        let fields: Vec<_> = err.details.iter().map(|d| d.field.as_deref()).collect();
        assert_eq!(fields, vec![Some("name"), Some("email"), Some("role")]);
    }

    #[test]
    fn test_validation_failure_display() {
        let failure = ValidationFailure {
            details: vec![
                FieldError::new(Some("name"), "Name cannot be empty"),
                FieldError::new(Some("role"), "bad role"),
            ],
        };
        assert_eq!(failure.to_string(), "Name cannot be empty, bad role");
    }
}
