use crate::utils::error::{ForgeError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ForgeError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Extensions are matched as plain suffixes, so they must carry the leading dot.
pub fn validate_extension(field_name: &str, extension: &str) -> Result<()> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: extension.to_string(),
            reason: "Extension must start with '.' followed by at least one character".to_string(),
        });
    }

    if extension.contains('/') || extension.contains('\\') {
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: extension.to_string(),
            reason: "Extension cannot contain path separators".to_string(),
        });
    }

    Ok(())
}

/// The output name is a suffix swap, so equal extensions would overwrite the input.
pub fn validate_extension_pair(field_name: &str, input: &str, output: &str) -> Result<()> {
    if input == output {
        return Err(ForgeError::ConfigValidationError {
            field: field_name.to_string(),
            message: "Output extension must differ from the input extension".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ForgeError::InvalidConfigValueError {
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
        return Err(ForgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("url", "https://cdn.jsdelivr.net/gh/x/y@release/gfw.txt").is_ok());
        assert!(validate_url("url", "http://example.com").is_ok());
        assert!(validate_url("url", "").is_err());
        assert!(validate_url("url", "invalid-url").is_err());
        assert!(validate_url("url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension("compile.input_extension", ".json").is_ok());
        assert!(validate_extension("compile.output_extension", ".srs").is_ok());
        assert!(validate_extension("compile.input_extension", "json").is_err());
        assert!(validate_extension("compile.input_extension", ".").is_err());
        assert!(validate_extension("compile.input_extension", "./x").is_err());
    }

    #[test]
    fn test_validate_extension_pair() {
        assert!(validate_extension_pair("output_extension", ".json", ".srs").is_ok());
        let err = validate_extension_pair("output_extension", ".json", ".json").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("concurrent_requests", 5, 1, 64).is_ok());
        assert!(validate_range("concurrent_requests", 0, 1, 64).is_err());
        assert!(validate_range("concurrent_requests", 65, 1, 64).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_dir", "sing-box").is_ok());
        assert!(validate_path("output_dir", "").is_err());
        assert!(validate_path("output_dir", "a\0b").is_err());
    }
}
