//! `sigil`
//!
//! Turns laser job descriptions, or designs whose stroke colours describe the cut, into the
//! control files the machine reads.

pub mod encode;
pub mod extract;
pub mod input;
pub mod job;
pub mod schema;
pub mod svg;
pub mod validate;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

pub use encode::{encode, FormatRevision, FILE_LENGTH};
pub use extract::{extract, ExtractError, Extraction};
pub use job::{ColorEntry, ColorMap, Dither, JobSpec, Mode, Optimize};
pub use validate::{validate, ValidationError};

/// Errors that can occur while converting a job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read an input file.
    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// Failed to write the control file.
    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// The job description was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The design could not be read.
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

impl Error {
    /// Whether the error came from the file system rather than the job itself.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Read { .. } | Error::Write { .. })
    }
}

/// Converts a parsed job description into a control file.
///
/// # Arguments
/// * `raw`: The job description.
/// * `revision`: The layout revision to produce.
///
/// # Returns
/// The control file.
///
/// # Errors
/// A [`ValidationError`] if the job is rejected. Nothing is encoded in that case.
pub fn convert_job(
    raw: &serde_json::Value,
    revision: FormatRevision,
) -> Result<Vec<u8>, ValidationError> {
    let job = validate(raw)?;
    Ok(encode(&job, revision))
}

/// Converts a design whose stroke colours describe the cut into a control file.
///
/// # Arguments
/// * `design`: The contents of the SVG file.
/// * `base`: The job to take every setting except size and colours from.
/// * `revision`: The layout revision to produce.
///
/// # Returns
/// The control file.
///
/// # Errors
/// An [`ExtractError`] if the design has no usable size or too many colours.
pub fn convert_svg(
    design: &str,
    base: JobSpec,
    revision: FormatRevision,
) -> Result<Vec<u8>, ExtractError> {
    let document = svg::parse_document(design)?;
    let extraction = extract(&document.elements, document.width, document.height)?;
    log::info!(
        "design is {:.3}in by {:.3}in",
        extraction.width_inches,
        extraction.height_inches
    );
    Ok(encode(&extraction.apply_to(base), revision))
}

/// Reads a job description file without checking it.
///
/// # Arguments
/// * `path`: The file, TOML unless it ends in `.json`.
///
/// # Returns
/// The job description as a table of fields.
///
/// # Errors
/// [`Error::Read`] if the file cannot be read, otherwise [`Error::Validation`] if it is not a
/// table of fields in UTF-8 text.
pub fn read_job(path: &Path) -> Result<serde_json::Value, Error> {
    let text = String::from_utf8(read(path)?)
        .map_err(|err| ValidationError::MalformedInput(err.to_string()))?;
    Ok(input::parse_job(&text, input::InputFormat::from_path(path))?)
}

/// Reads and validates a job description file.
///
/// # Arguments
/// * `path`: The file, TOML unless it ends in `.json`.
///
/// # Returns
/// The validated job.
///
/// # Errors
/// [`Error::Read`] if the file cannot be read, otherwise [`Error::Validation`].
pub fn load_job(path: &Path) -> Result<JobSpec, Error> {
    Ok(validate(&read_job(path)?)?)
}

/// Reads a design file.
///
/// # Errors
/// [`Error::Read`] if the file cannot be read, or [`ExtractError::NotText`] if it is not UTF-8.
pub fn read_design(path: &Path) -> Result<String, Error> {
    Ok(String::from_utf8(read(path)?).map_err(ExtractError::from)?)
}

/// Reads a whole file.
fn read(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a control file.
///
/// The bytes are written to a temporary file next to `path`, which then replaces `path`, so
/// a failed write never leaves a partial control file behind.
///
/// # Arguments
/// * `path`: Where to write the control file.
/// * `bytes`: The control file.
///
/// # Errors
/// [`Error::Write`] if the file cannot be written.
pub fn write_control_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;

    log::info!("wrote {} bytes to `{}`", bytes.len(), path.display());
    Ok(())
}
