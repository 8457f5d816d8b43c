use crate::utils::error::{NormalizerError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(NormalizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(NormalizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NormalizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(NormalizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 規則樣式不可為空，也不可前後帶空白（邊界比對會失效）
pub fn validate_rule_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(NormalizerError::RuleError {
            pattern: pattern.to_string(),
            message: "pattern cannot be empty".to_string(),
        });
    }
    if pattern.trim() != pattern {
        return Err(NormalizerError::RuleError {
            pattern: pattern.to_string(),
            message: "pattern cannot start or end with whitespace".to_string(),
        });
    }
    Ok(())
}
