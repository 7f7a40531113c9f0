//! Universal token schema and normalization.
//!
//! Every integration's refresh response converges to one provider-agnostic
//! token shape. Provider-specific extra fields are preserved verbatim; only
//! the distinguished fields are validated.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{schema_error, Error, SchemaIssue};

/// Distinguished field names of the universal token shape.
const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const EXPIRES_IN: &str = "expires_in";
const EXPIRY_DATE: &str = "expiry_date";
const TOKEN_TYPE: &str = "token_type";
const SCOPE: &str = "scope";

/// Legacy camelCase spellings accepted for backward compatibility, mapped to
/// their canonical snake_case names.
const LEGACY_ALIASES: [(&str, &str); 4] = [
    ("accessToken", ACCESS_TOKEN),
    ("refreshToken", REFRESH_TOKEN),
    ("expiresIn", EXPIRES_IN),
    ("expiryDate", EXPIRY_DATE),
];

/// A provider token in the universal shape.
///
/// Wraps the raw provider fields without dropping any of them. The
/// distinguished fields (`access_token`, `refresh_token`, `expires_in`,
/// `expiry_date`) get typed accessors; everything else passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenObject(Map<String, Value>);

impl TokenObject {
    /// Create an empty token object.
    pub fn new() -> Self {
        Self::default()
    }

    /// The access token, if present.
    pub fn access_token(&self) -> Option<&str> {
        self.0.get(ACCESS_TOKEN).and_then(Value::as_str)
    }

    /// The refresh token, if present.
    pub fn refresh_token(&self) -> Option<&str> {
        self.0.get(REFRESH_TOKEN).and_then(Value::as_str)
    }

    /// Relative lifetime in seconds, if present.
    pub fn expires_in_secs(&self) -> Option<f64> {
        self.0.get(EXPIRES_IN).and_then(Value::as_f64)
    }

    /// Absolute expiry instant in milliseconds since the epoch, if present.
    pub fn expiry_date_ms(&self) -> Option<i64> {
        self.0.get(EXPIRY_DATE).and_then(Value::as_i64)
    }

    /// Set the absolute expiry instant in milliseconds since the epoch.
    pub fn set_expiry_date_ms(&mut self, ms: i64) {
        self.0.insert(EXPIRY_DATE.to_string(), Value::from(ms));
    }

    /// All fields, distinguished and provider-specific alike.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the token object and return its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TokenObject {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Validate and coerce a raw provider token response into the universal shape.
///
/// - Legacy camelCase field names are canonicalized to snake_case.
/// - Every distinguished field is type-checked when present; all failures are
///   collected and reported together. Unknown fields are never touched.
/// - If `expiry_date` is absent and `expires_in` is a number, `expiry_date`
///   is derived as `round(now_ms + expires_in * 1000)`.
///
/// Idempotent: normalizing an already-normalized token is a no-op.
///
/// # Errors
///
/// `SchemaErrorKind::Validation` listing every field that failed.
pub fn normalize(raw: &Value) -> Result<TokenObject, Error> {
    let object = match raw.as_object() {
        Some(object) => object,
        None => {
            return Err(schema_error(vec![SchemaIssue::new(
                "$",
                "expected a JSON object",
            )]))
        }
    };

    let mut fields = object.clone();

    // Canonicalize legacy spellings, keeping the canonical key when both exist.
    for (legacy, canonical) in LEGACY_ALIASES {
        if fields.contains_key(legacy) && !fields.contains_key(canonical) {
            let value = fields.remove(legacy).unwrap_or(Value::Null);
            fields.insert(canonical.to_string(), value);
        }
    }

    let mut issues = Vec::new();
    for field in [ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_TYPE, SCOPE] {
        if let Some(value) = fields.get(field) {
            if !value.is_string() {
                issues.push(SchemaIssue::new(field, "expected a string"));
            }
        }
    }
    for field in [EXPIRES_IN, EXPIRY_DATE] {
        if let Some(value) = fields.get(field) {
            if !value.is_number() {
                issues.push(SchemaIssue::new(field, "expected a number"));
            }
        }
    }

    if !issues.is_empty() {
        return Err(schema_error(issues));
    }

    // Derive the absolute expiry from the relative lifetime when absent.
    if !fields.contains_key(EXPIRY_DATE) {
        if let Some(expires_in) = fields.get(EXPIRES_IN).and_then(Value::as_f64) {
            let now_ms = Utc::now().timestamp_millis();
            let expiry = (now_ms as f64 + expires_in * 1000.0).round() as i64;
            fields.insert(EXPIRY_DATE.to_string(), Value::from(expiry));
        }
    }

    Ok(TokenObject(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derives_expiry_date_from_expires_in() {
        let before = Utc::now().timestamp_millis();
        let token = normalize(&json!({"access_token": "a1", "expires_in": 3600})).unwrap();
        let after = Utc::now().timestamp_millis();

        let expiry = token.expiry_date_ms().unwrap();
        assert!(expiry >= before + 3_600_000);
        assert!(expiry <= after + 3_600_000);
        // The relative field itself is preserved.
        assert_eq!(token.expires_in_secs(), Some(3600.0));
    }

    #[test]
    fn test_existing_expiry_date_is_kept() {
        let token =
            normalize(&json!({"access_token": "a1", "expires_in": 3600, "expiry_date": 1234}))
                .unwrap();
        assert_eq!(token.expiry_date_ms(), Some(1234));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize(&json!({"access_token": "a1", "expires_in": 3600})).unwrap();
        let twice = normalize(&Value::Object(once.fields().clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_legacy_field_names_are_canonicalized() {
        let token = normalize(&json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "expiryDate": 999,
        }))
        .unwrap();

        assert_eq!(token.access_token(), Some("a1"));
        assert_eq!(token.refresh_token(), Some("r1"));
        assert_eq!(token.expiry_date_ms(), Some(999));
        assert!(!token.fields().contains_key("accessToken"));
    }

    #[test]
    fn test_canonical_name_wins_over_legacy() {
        let token = normalize(&json!({
            "access_token": "canonical",
            "accessToken": "legacy",
        }))
        .unwrap();

        assert_eq!(token.access_token(), Some("canonical"));
        // The legacy spelling survives as an opaque provider field.
        assert_eq!(token.fields()["accessToken"], json!("legacy"));
    }

    #[test]
    fn test_collects_every_failing_field() {
        use crate::error::{ErrorKind, SchemaErrorKind};

        let err = normalize(&json!({
            "access_token": 1233231231231_i64,
            "expiry_date": "not-a-number",
        }))
        .unwrap_err();

        match err.error_kind {
            ErrorKind::Schema(SchemaErrorKind::Validation { issues }) => {
                assert_eq!(issues.len(), 2);
                let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
                assert!(fields.contains(&"access_token"));
                assert!(fields.contains(&"expiry_date"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_non_object_input_rejected() {
        assert!(normalize(&json!(null)).is_err());
        assert!(normalize(&json!("token")).is_err());
        assert!(normalize(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_unknown_provider_fields_preserved_verbatim() {
        let token = normalize(&json!({
            "access_token": "a1",
            "instance_url": "https://example.my.salesforce.com",
            "_1": true,
        }))
        .unwrap();

        assert_eq!(
            token.fields()["instance_url"],
            json!("https://example.my.salesforce.com")
        );
        assert_eq!(token.fields()["_1"], json!(true));
    }

    #[test]
    fn test_empty_object_is_valid() {
        // A 204 from the sync service contributes an empty object; it must
        // normalize cleanly into a token with no fields.
        let token = normalize(&json!({})).unwrap();
        assert!(token.fields().is_empty());
        assert_eq!(token.expiry_date_ms(), None);
    }
}
