//! Pure helpers shared by every operation: identifier normalization,
//! endpoint construction and request-object cleaning.

use serde_json::{Map, Value};

use crate::services::ServiceError;

fn validate_name(value: &str, label: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} is required", label)));
    }
    Ok(trimmed.to_lowercase())
}

/// Trims and lower-cases an organization name; blank input is rejected.
pub fn validate_organization_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, "Organization name")
}

/// Trims and lower-cases a database name; blank input is rejected.
pub fn validate_database_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, "Database name")
}

/// Trims and lower-cases a branch name; blank input is rejected.
pub fn validate_branch_name(name: &str) -> Result<String, ServiceError> {
    validate_name(name, "Branch name")
}

/// Joins path segments into `/a/b/c`, skipping empty segments.
pub fn build_endpoint<S: AsRef<str>>(segments: &[S]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Drops `null` and empty-string values. `0`, `false`, arrays and nested
/// objects are kept because the API treats them as meaningful.
pub fn clean_object(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn organization_name_is_trimmed_and_lowercased() {
        assert_eq!(validate_organization_name("  MyOrg  ").unwrap(), "myorg");
        assert_eq!(validate_organization_name("myorg").unwrap(), "myorg");
        assert_eq!(
            validate_organization_name("MyOrganization").unwrap(),
            "myorganization"
        );
    }

    #[test]
    fn database_name_keeps_hyphens() {
        assert_eq!(validate_database_name("  MyDatabase  ").unwrap(), "mydatabase");
        assert_eq!(validate_database_name("my-database").unwrap(), "my-database");
        assert_eq!(validate_database_name("MyDB").unwrap(), "mydb");
    }

    #[test]
    fn branch_name_keeps_hyphens_and_underscores() {
        assert_eq!(
            validate_branch_name("  Feature-Branch  ").unwrap(),
            "feature-branch"
        );
        assert_eq!(
            validate_branch_name("feature_branch-name").unwrap(),
            "feature_branch-name"
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = validate_organization_name("").unwrap_err();
        assert_eq!(err.to_string(), "Organization name is required");

        let err = validate_database_name("   ").unwrap_err();
        assert_eq!(err.to_string(), "Database name is required");

        let err = validate_branch_name("\t\n").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Branch name is required");
    }

    #[test]
    fn build_endpoint_joins_segments() {
        assert_eq!(
            build_endpoint(&["organizations", "myorg", "databases"]),
            "/organizations/myorg/databases"
        );
        assert_eq!(build_endpoint(&["regions"]), "/regions");
        assert_eq!(
            build_endpoint(&[
                "organizations",
                "myorg",
                "databases",
                "mydb",
                "branches",
                "main",
            ]),
            "/organizations/myorg/databases/mydb/branches/main"
        );
    }

    #[test]
    fn build_endpoint_skips_empty_segments() {
        assert_eq!(build_endpoint(&["organizations", "", "members"]), "/organizations/members");
        let owned = vec!["user".to_string()];
        assert_eq!(build_endpoint(&owned), "/user");
    }

    #[test]
    fn clean_object_drops_null_and_empty_strings() {
        let cleaned = clean_object(&object(json!({"a": 1, "b": null, "c": ""})));
        assert_eq!(Value::Object(cleaned), json!({"a": 1}));
    }

    #[test]
    fn clean_object_keeps_zero_and_false() {
        let cleaned = clean_object(&object(json!({"a": 0, "b": false, "c": "x"})));
        assert_eq!(Value::Object(cleaned), json!({"a": 0, "b": false, "c": "x"}));
    }

    #[test]
    fn clean_object_keeps_nested_values() {
        let cleaned = clean_object(&object(json!({"a": 1, "nested": {"x": 1}, "list": []})));
        assert_eq!(
            Value::Object(cleaned),
            json!({"a": 1, "nested": {"x": 1}, "list": []})
        );
        assert!(clean_object(&Map::new()).is_empty());
    }
}
