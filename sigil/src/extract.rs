//! `extract`
//!
//! Recovers cut settings from the stroke colours of a design.
//!
//! Each stroke colour is read as a packed set of settings: red is the power, green is the speed
//! and blue is a twentieth of the frequency. Air assist is on when the red channel is in the
//! hundreds. Every colour becomes a vector cut.

use std::collections::{BTreeSet, HashMap};

use crate::{
    job::{ColorEntry, ColorMap, JobSpec, TooManyColors},
    schema::{Field, JobField, Rule},
};

/// Document units per inch. Inkscape used 90 before moving to the CSS value of 96.
pub const DOCUMENT_UNITS_PER_INCH: f64 = 90.0;

/// Frequency step per unit of the blue channel.
pub const FREQUENCY_PER_BLUE: u16 = 20;

/// Strokes at least this wide are not hairlines, and the machine will not cut them.
pub const HAIRLINE_WIDTH: f64 = 0.015;

/// Reasons extraction can fail.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The design is not well-formed XML.
    #[error("failed to parse design: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The design does not say how big it is.
    #[error("design has no `{0}` attribute")]
    MissingDimension(&'static str),
    /// The size of the design could not be understood.
    #[error("design `{name}` of `{value}` is not a length")]
    InvalidDimension {
        /// The attribute, `width` or `height`.
        name: &'static str,
        /// The value found.
        value: String,
    },
    /// The design does not fit on the bed.
    #[error("design `{name}` of {inches}in must be between {min} and {max} inches")]
    OutOfBounds {
        /// The dimension, `width` or `height`.
        name: &'static str,
        /// The size of the design in that dimension.
        inches: f64,
        /// Smallest accepted size.
        min: f64,
        /// Largest accepted size.
        max: f64,
    },
    /// The design file is not UTF-8 text.
    #[error("design is not UTF-8 text: {0}")]
    NotText(#[from] std::string::FromUtf8Error),
    /// The design uses more colours than the machine has slots.
    #[error(transparent)]
    TooManyColors(#[from] TooManyColors),
}

/// An element of a design, as far as extraction cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledElement {
    /// The `style` attribute.
    pub style: Option<String>,
    /// The `d` attribute.
    pub path_data: Option<String>,
}

/// A stroke that will not cut as drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadStroke {
    /// Value of `stroke-opacity`.
    pub opacity: f64,
    /// Value of `stroke-width`.
    pub width: f64,
}

/// What extraction found in a design.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Width of the design, inches.
    pub width_inches: f64,
    /// Height of the design, inches.
    pub height_inches: f64,
    /// One entry per usable stroke colour, gentlest first.
    pub colors: ColorMap,
    /// Strokes that are transparent or too wide, one per distinct opacity and width.
    pub bad_strokes: Vec<BadStroke>,
}

impl Extraction {
    /// Puts the size and colour map of the design onto a job.
    ///
    /// # Arguments
    /// * `job`: The job to update.
    ///
    /// # Returns
    /// The job, with `width`, `height` and `colors` replaced.
    #[must_use]
    pub fn apply_to(self, job: JobSpec) -> JobSpec {
        JobSpec {
            width: self.width_inches,
            height: self.height_inches,
            colors: self.colors,
            ..job
        }
    }
}

/// Scans the elements of a design for stroke colours.
///
/// Elements with malformed styles are skipped.
///
/// # Arguments
/// * `elements`: Every element of the design, in any order.
/// * `width_units`: Width of the design, document units.
/// * `height_units`: Height of the design, document units.
///
/// # Returns
/// The size of the design and the colour map its strokes describe.
///
/// # Errors
/// [`ExtractError::OutOfBounds`] if the design is larger than the bed, or
/// [`ExtractError::TooManyColors`] if more than 16 usable colours are found.
pub fn extract<'a>(
    elements: impl IntoIterator<Item = &'a StyledElement>,
    width_units: f64,
    height_units: f64,
) -> Result<Extraction, ExtractError> {
    let width_inches = to_inches(JobField::Width, width_units)?;
    let height_inches = to_inches(JobField::Height, height_units)?;

    let mut colours = BTreeSet::new();
    let mut bad_strokes = Vec::new();

    'elements: for element in elements {
        let (Some(style), Some(path_data)) = (&element.style, &element.path_data) else {
            continue 'elements;
        };
        if path_data.trim().is_empty() {
            continue 'elements;
        }

        let Some(properties) = parse_style(style) else {
            log::debug!("skipping element with malformed style `{style}`");
            continue 'elements;
        };

        if let Some(colour) = properties.get("stroke").and_then(|value| parse_colour(value)) {
            colours.insert(colour);
        }

        if let Some(stroke) = bad_stroke(&properties) {
            if !bad_strokes.contains(&stroke) {
                log::warn!(
                    "stroke with opacity {} and width {} will not cut, use an opaque hairline",
                    stroke.opacity,
                    stroke.width
                );
                bad_strokes.push(stroke);
            }
        }
    }

    let mut entries: Vec<ColorEntry> = colours.into_iter().filter_map(decode_colour).collect();
    if entries.len() > ColorMap::MAX_ENTRIES {
        return Err(TooManyColors(entries.len()).into());
    }
    entries.sort_by(|a, b| intensity(a).total_cmp(&intensity(b)));

    let colors = ColorMap::from_entries((1..).zip(entries))?;
    log::info!("found {} cut colour(s)", colors.len());

    Ok(Extraction {
        width_inches,
        height_inches,
        colors,
        bad_strokes,
    })
}

/// Converts a dimension of the design to inches, held to the range the job accepts for it.
///
/// # Arguments
/// * `field`: The job field the dimension becomes, [`JobField::Width`] or [`JobField::Height`].
/// * `units`: The dimension, document units.
///
/// # Errors
/// [`ExtractError::OutOfBounds`] if the result is outside the range of `field`.
fn to_inches(field: JobField, units: f64) -> Result<f64, ExtractError> {
    let inches = units / DOCUMENT_UNITS_PER_INCH;
    match field.rule() {
        Rule::Range { min, max, .. } if !(min..=max).contains(&inches) => {
            Err(ExtractError::OutOfBounds {
                name: field.name(),
                inches,
                min,
                max,
            })
        }
        _ => Ok(inches),
    }
}

/// Splits a `style` attribute into its properties.
///
/// # Arguments
/// * `style`: The attribute, such as `stroke:#ff0000;stroke-width:0.01`.
///
/// # Returns
/// The properties by name, or `None` if a declaration has no `:`.
fn parse_style(style: &str) -> Option<HashMap<&str, &str>> {
    style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            Some((name.trim(), value.trim()))
        })
        .collect()
}

/// Parses a `#rrggbb` stroke colour.
///
/// # Returns
/// The colour as `0xRRGGBB`, or `None` for anything that is not a hex colour of at most 24 bits.
fn parse_colour(value: &str) -> Option<u32> {
    let hex = value.strip_prefix('#')?;
    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|colour| *colour <= 0x00FF_FFFF)
}

/// Checks the stroke opacity and width of an element.
///
/// # Returns
/// The stroke if both are numbers and the stroke is not an opaque hairline.
#[allow(clippy::float_cmp)]
fn bad_stroke(properties: &HashMap<&str, &str>) -> Option<BadStroke> {
    let opacity = properties.get("stroke-opacity")?.parse::<f64>().ok()?;
    let width = properties.get("stroke-width")?.parse::<f64>().ok()?;

    (opacity != 1.0 || width >= HAIRLINE_WIDTH || width == 0.0)
        .then_some(BadStroke { opacity, width })
}

/// Reads the cut settings packed into a colour.
///
/// # Returns
/// The settings, or `None` if the colour has a speed of zero.
fn decode_colour(colour: u32) -> Option<ColorEntry> {
    let [_, red, green, blue] = colour.to_be_bytes();
    if green == 0 {
        log::debug!("ignoring colour #{colour:06x}, it has no speed");
        return None;
    }

    let frequency = u16::from(blue) * FREQUENCY_PER_BLUE;
    if red > 100 || !(10..=5000).contains(&frequency) {
        log::warn!(
            "colour #{colour:06x} gives power {red} and frequency {frequency}, outside what the machine accepts"
        );
    }

    // Only a red channel of 100 to 199 turns air assist on.
    let air = red / 100 == 1;
    Some(ColorEntry::new(colour, red, green, frequency, false, true, air))
}

/// How hard a colour cuts, used to order the passes.
fn intensity(entry: &ColorEntry) -> f64 {
    f64::from(entry.power()) * (1.0 / f64::from(entry.speed()))
}
