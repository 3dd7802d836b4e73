//! Attribute validators.
//!
//! Each validator receives the attribute path (for error messages) and the
//! value. They are referenced from the resource schemas.

use crate::core::constants::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use crate::error::ValidationError;

/// Signature shared by all attribute validators.
pub type Validator = fn(&str, &str) -> Result<(), ValidationError>;

fn invalid(attribute: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Invalid {
        attribute: attribute.to_string(),
        reason: reason.into(),
    }
}

/// Validate a control plane object name.
///
/// Names must:
/// - Be 1 to 64 characters long
/// - Contain only lowercase letters, digits, and hyphens
/// - Start with a letter and not end with a hyphen
pub fn validate_name(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty {
            attribute: attribute.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(invalid(
            attribute,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }

    if !value.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid(attribute, "must start with a lowercase letter"));
    }

    if value.ends_with('-') {
        return Err(invalid(attribute, "cannot end with a hyphen"));
    }

    for (i, ch) in value.chars().enumerate() {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-') {
            return Err(invalid(
                attribute,
                format!(
                    "invalid character '{}' at position {}. Only a-z, 0-9, and hyphen are allowed",
                    ch,
                    i + 1
                ),
            ));
        }
    }

    Ok(())
}

/// Validate a description length.
pub fn validate_description(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(invalid(
            attribute,
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(())
}

/// Validate a tag key.
///
/// Keys cannot be empty, contain whitespace, or exceed 128 characters.
pub fn validate_tag_key(attribute: &str, key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(invalid(attribute, "tag keys cannot be empty"));
    }
    if key.len() > 128 {
        return Err(invalid(
            attribute,
            format!("tag key '{}' exceeds 128 characters", key),
        ));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(invalid(
            attribute,
            format!("tag key '{}' cannot contain whitespace", key),
        ));
    }
    Ok(())
}

/// Validate an encoding (`plain` or `base64`).
pub fn validate_encoding(attribute: &str, value: &str) -> Result<(), ValidationError> {
    match value {
        "plain" | "base64" => Ok(()),
        other => Err(invalid(
            attribute,
            format!("encoding must be 'plain' or 'base64', got '{}'", other),
        )),
    }
}

/// Validate an AWS access key id.
///
/// Accepts long-term (`AKIA`) and temporary (`ASIA`) keys: the prefix
/// followed by 16 uppercase letters or digits.
pub fn validate_aws_access_key(attribute: &str, value: &str) -> Result<(), ValidationError> {
    let rest = value
        .strip_prefix("AKIA")
        .or_else(|| value.strip_prefix("ASIA"))
        .ok_or_else(|| invalid(attribute, "must start with AKIA or ASIA"))?;

    if rest.len() != 16
        || !rest
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(invalid(
            attribute,
            "must be followed by 16 uppercase letters or digits",
        ));
    }

    Ok(())
}

/// Validate an AWS IAM role ARN.
///
/// Empty values are accepted since the attribute defaults to `""`.
/// Otherwise the format is `arn:<partition>:iam::<account>:role/<name>`.
pub fn validate_aws_role_arn(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    let parts: Vec<&str> = value.splitn(6, ':').collect();
    if parts.len() != 6 || parts[0] != "arn" {
        return Err(invalid(attribute, "must be an ARN (arn:aws:iam::<account>:role/<name>)"));
    }

    if !matches!(parts[1], "aws" | "aws-cn" | "aws-us-gov") {
        return Err(invalid(
            attribute,
            format!("unknown partition '{}'", parts[1]),
        ));
    }

    if parts[2] != "iam" || !parts[3].is_empty() {
        return Err(invalid(attribute, "must be an IAM ARN"));
    }

    if parts[4].is_empty() || !parts[4].chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(attribute, "account id must be numeric"));
    }

    match parts[5].strip_prefix("role/") {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(invalid(attribute, "must reference a role (role/<name>)")),
    }
}

/// Validate that a value is not empty.
pub fn validate_not_empty(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty {
            attribute: attribute.to_string(),
        });
    }
    Ok(())
}
