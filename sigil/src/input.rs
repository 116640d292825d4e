//! `input`
//!
//! Reads job description files into an untyped table for [`crate::validate`].

use std::path::Path;

use serde_json::Value;

use crate::validate::ValidationError;

/// Formats a job description can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// TOML, the default.
    Toml,
    /// JSON.
    Json,
}

impl InputFormat {
    /// Picks a format from a file name. Anything not ending in `.json` is read as TOML.
    ///
    /// # Arguments
    /// * `path`: The job description file.
    ///
    /// # Returns
    /// The format to parse the file with.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Toml,
        }
    }
}

/// Parses a job description.
///
/// # Arguments
/// * `text`: The contents of the file.
/// * `format`: The format it is written in.
///
/// # Returns
/// The job description as a table.
///
/// # Errors
/// [`ValidationError::MalformedInput`] if the text does not parse, or is not a table.
pub fn parse_job(text: &str, format: InputFormat) -> Result<Value, ValidationError> {
    let value: Value = match format {
        InputFormat::Toml => toml::from_str(text)
            .map_err(|err| ValidationError::MalformedInput(err.message().to_string()))?,
        InputFormat::Json => serde_json::from_str(text)
            .map_err(|err| ValidationError::MalformedInput(err.to_string()))?,
    };

    if value.is_object() {
        Ok(value)
    } else {
        Err(ValidationError::MalformedInput(
            "expected a table of fields".to_string(),
        ))
    }
}
