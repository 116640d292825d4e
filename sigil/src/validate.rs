//! `validate`
//!
//! Checks an untyped job description against the [`crate::schema`] tables and turns it into a
//! [`JobSpec`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    job::{ColorEntry, ColorMap, Dither, JobSpec, Mode, Optimize, TooManyColors},
    schema::{ColorField, Field, JobField, NumberKind, Rule, Token},
};

/// Reasons a job description can be rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was not given.
    #[error("missing required field `{0}`")]
    MissingField(String),
    /// The value of a field is not one of the values it accepts.
    #[error("`{field}` must be one of {allowed}")]
    InvalidEnumValue {
        /// The offending field.
        field: String,
        /// The accepted values, comma separated.
        allowed: String,
    },
    /// A numeric field is outside its bounds.
    #[error("`{field}` must be between {min} and {max}")]
    OutOfRange {
        /// The offending field.
        field: String,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// A field that no table knows about.
    #[error("unknown field `{0}`")]
    UnknownField(String),
    /// The value of a field is of the wrong kind altogether.
    #[error("`{field}` must be {expected}")]
    WrongType {
        /// The offending field.
        field: String,
        /// What was expected, for example "a whole number".
        expected: &'static str,
    },
    /// The colour map has more entries than the machine has slots.
    #[error(transparent)]
    TooManyColors(#[from] TooManyColors),
    /// A colour map key is not a slot number.
    #[error("colour key `{0}` must be a whole number from 1 to 16, used once")]
    InvalidColorKey(String),
    /// A colour map value is not a table.
    #[error("colour `{0}` must be a table of settings")]
    InvalidColorValue(String),
    /// The job description is not a table of fields.
    #[error("job description is malformed: {0}")]
    MalformedInput(String),
}

/// A value that has passed the rule of its field.
#[derive(Debug)]
enum Checked {
    /// The code paired with the accepted token.
    Code(u16),
    /// A number within range.
    Number(f64),
    /// A fully checked colour map.
    Colors(ColorMap),
}

/// Validates a job description.
///
/// Defaults are filled in on a private copy, so validating the same value twice gives the same
/// result. When several fields are wrong only the first one found is reported.
///
/// # Arguments
/// * `raw`: The parsed job description.
///
/// # Returns
/// The typed job.
///
/// # Errors
/// A [`ValidationError`] naming the first problem found.
pub fn validate(raw: &Value) -> Result<JobSpec, ValidationError> {
    let Value::Object(table) = raw else {
        return Err(ValidationError::MalformedInput(
            "expected a table of fields".to_string(),
        ));
    };

    let mut checked = check_fields::<JobField>(table, None)?;

    Ok(JobSpec {
        mode: take(&mut checked, JobField::Mode, code_as(Mode::from_code))?,
        dpi: take(&mut checked, JobField::Dpi, code_as(Some))?,
        width: take(&mut checked, JobField::Width, number)?,
        height: take(&mut checked, JobField::Height, number)?,
        raster_power: take(&mut checked, JobField::RasterPower, byte)?,
        raster_speed: take(&mut checked, JobField::RasterSpeed, byte)?,
        vector_power: take(&mut checked, JobField::VectorPower, byte)?,
        vector_speed: take(&mut checked, JobField::VectorSpeed, byte)?,
        frequency: take(&mut checked, JobField::Frequency, word)?,
        optimize: take(&mut checked, JobField::Optimize, code_as(Optimize::from_code))?,
        dither: take(&mut checked, JobField::Dither, code_as(Dither::from_code))?,
        colors: take(&mut checked, JobField::Colors, |value| match value {
            Checked::Colors(colors) => Some(colors),
            _ => None,
        })?,
    })
}

/// Checks every key of a table against the rules of `F`.
///
/// # Arguments
/// * `raw`: The table to check. It is not modified.
/// * `prefix`: Where the table sits in the job description, used in error messages.
///
/// # Returns
/// Every key of `F` with its checked value.
///
/// # Errors
/// The first [`ValidationError`] found.
fn check_fields<F: Field>(
    raw: &Map<String, Value>,
    prefix: Option<&str>,
) -> Result<BTreeMap<F, Checked>, ValidationError> {
    if let Some(missing) = F::ALL
        .iter()
        .find(|field| field.is_required() && !raw.contains_key(field.name()))
    {
        return Err(ValidationError::MissingField(qualify(
            prefix,
            missing.name(),
        )));
    }

    let mut working = raw.clone();
    for field in F::ALL {
        if let Some(default) = field.default_value() {
            working.entry(field.name()).or_insert(default);
        }
    }

    let mut checked = BTreeMap::new();
    for (key, value) in &working {
        let name = qualify(prefix, key);
        let Some(field) = F::from_name(key) else {
            return Err(ValidationError::UnknownField(name));
        };

        let value = match field.rule() {
            Rule::Choice(table) => Checked::Code(check_choice(name, table, value)?),
            Rule::Range { min, max, kind } => {
                Checked::Number(check_range(name, min, max, kind, value)?)
            }
            Rule::ColorMap => Checked::Colors(check_color_map(value)?),
        };
        checked.insert(field, value);
    }

    Ok(checked)
}

/// Looks a value up in a choice table.
///
/// # Returns
/// The code paired with the matching token.
fn check_choice(
    field: String,
    table: &[(Token, u16)],
    value: &Value,
) -> Result<u16, ValidationError> {
    table
        .iter()
        .find(|(token, _)| token.matches(value))
        .map(|(_, code)| *code)
        .ok_or_else(|| ValidationError::InvalidEnumValue {
            field,
            allowed: table
                .iter()
                .map(|(token, _)| token.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Checks a number against an inclusive range.
///
/// # Returns
/// The number, unchanged.
fn check_range(
    field: String,
    min: f64,
    max: f64,
    kind: NumberKind,
    value: &Value,
) -> Result<f64, ValidationError> {
    let Some(number) = value.as_f64() else {
        return Err(ValidationError::WrongType {
            field,
            expected: "a number",
        });
    };

    if kind == NumberKind::Integer && number.fract() != 0.0 {
        return Err(ValidationError::WrongType {
            field,
            expected: "a whole number",
        });
    }

    if (min..=max).contains(&number) {
        Ok(number)
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

/// Checks the colour map and every entry in it.
///
/// # Arguments
/// * `value`: The value of the `colors` field.
///
/// # Returns
/// The typed colour map.
fn check_color_map(value: &Value) -> Result<ColorMap, ValidationError> {
    let Value::Object(table) = value else {
        return Err(ValidationError::WrongType {
            field: JobField::Colors.name().to_string(),
            expected: "a table",
        });
    };

    if table.len() > ColorMap::MAX_ENTRIES {
        return Err(TooManyColors(table.len()).into());
    }

    let mut entries = BTreeMap::new();
    for (key, entry) in table {
        let slot = key
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|slot| (1..=16).contains(slot) && !entries.contains_key(slot))
            .ok_or_else(|| ValidationError::InvalidColorKey(key.clone()))?;

        let Value::Object(fields) = entry else {
            return Err(ValidationError::InvalidColorValue(key.clone()));
        };

        let prefix = format!("{}.{key}", JobField::Colors.name());
        let mut checked = check_fields::<ColorField>(fields, Some(&prefix))?;
        let entry = ColorEntry::new(
            take(&mut checked, ColorField::Color, color)?,
            take(&mut checked, ColorField::Power, byte)?,
            take(&mut checked, ColorField::Speed, byte)?,
            take(&mut checked, ColorField::Frequency, word)?,
            take(&mut checked, ColorField::Raster, switch)?,
            take(&mut checked, ColorField::Vector, switch)?,
            take(&mut checked, ColorField::Air, switch)?,
        );
        entries.insert(slot, entry);
    }

    Ok(ColorMap::from_entries(entries)?)
}

/// Removes a checked value and converts it to its typed form.
///
/// Every field is present once [`check_fields`] has succeeded, so a failure here means the
/// value did not come out of the rule the field declares.
fn take<F: Field, T>(
    checked: &mut BTreeMap<F, Checked>,
    field: F,
    convert: impl FnOnce(Checked) -> Option<T>,
) -> Result<T, ValidationError> {
    checked
        .remove(&field)
        .and_then(convert)
        .ok_or_else(|| ValidationError::MissingField(field.name().to_string()))
}

/// Converts a choice code with the given lookup.
fn code_as<T>(lookup: impl FnOnce(u16) -> Option<T>) -> impl FnOnce(Checked) -> Option<T> {
    move |value| match value {
        Checked::Code(code) => lookup(code),
        _ => None,
    }
}

/// A real number.
fn number(value: Checked) -> Option<f64> {
    match value {
        Checked::Number(number) => Some(number),
        _ => None,
    }
}

/// A whole number that has been range checked to fit in a byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte(value: Checked) -> Option<u8> {
    number(value).map(|number| number as u8)
}

/// A whole number that has been range checked to fit in a word.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn word(value: Checked) -> Option<u16> {
    number(value).map(|number| number as u16)
}

/// A whole number that has been range checked to fit in 24 bits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color(value: Checked) -> Option<u32> {
    number(value).map(|number| number as u32)
}

/// An on/off switch.
fn switch(value: Checked) -> Option<bool> {
    code_as(|code| Some(code != 0))(value)
}

/// Builds the name of a field for error messages.
fn qualify(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key.to_string(),
    }
}
