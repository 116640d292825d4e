//! `svg`
//!
//! Reads the parts of an SVG design that extraction needs.
//!
//! Styles are read as written rather than resolved, since the colour of each stroke is a code
//! for the cut settings and must not be altered by inheritance or colour management.

use crate::extract::{ExtractError, StyledElement, DOCUMENT_UNITS_PER_INCH};

/// Units a length may be given in, with their size in document units.
const UNITS: &[(&str, f64)] = &[
    ("px", 1.0),
    ("in", DOCUMENT_UNITS_PER_INCH),
    ("mm", DOCUMENT_UNITS_PER_INCH / 25.4),
    ("cm", DOCUMENT_UNITS_PER_INCH / 2.54),
    ("pt", DOCUMENT_UNITS_PER_INCH / 72.0),
    ("pc", DOCUMENT_UNITS_PER_INCH / 6.0),
];

/// A parsed design.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    /// Width of the design, document units.
    pub width: f64,
    /// Height of the design, document units.
    pub height: f64,
    /// Every element of the design, in document order.
    pub elements: Vec<StyledElement>,
}

/// Parses an SVG design.
///
/// # Arguments
/// * `text`: The contents of the SVG file.
///
/// # Returns
/// The size of the design and its elements.
///
/// # Errors
/// [`ExtractError::Xml`] if the file is not XML, or a dimension error if the root element does
/// not give its width and height as lengths.
pub fn parse_document(text: &str) -> Result<SvgDocument, ExtractError> {
    let document = roxmltree::Document::parse(text)?;
    let root = document.root_element();

    let width = dimension(root, "width")?;
    let height = dimension(root, "height")?;

    let elements = document
        .descendants()
        .filter(roxmltree::Node::is_element)
        .map(|node| StyledElement {
            style: node.attribute("style").map(str::to_string),
            path_data: node.attribute("d").map(str::to_string),
        })
        .collect();

    Ok(SvgDocument {
        width,
        height,
        elements,
    })
}

/// Reads a size attribute of the root element.
///
/// # Arguments
/// * `root`: The `svg` element.
/// * `name`: `width` or `height`.
///
/// # Returns
/// The size in document units.
fn dimension(root: roxmltree::Node<'_, '_>, name: &'static str) -> Result<f64, ExtractError> {
    let value = root
        .attribute(name)
        .ok_or(ExtractError::MissingDimension(name))?;

    parse_length(value).ok_or_else(|| ExtractError::InvalidDimension {
        name,
        value: value.to_string(),
    })
}

/// Parses a length such as `210mm` or `744.09`.
///
/// # Returns
/// The length in document units, or `None` if it is not a non-negative length in a known unit.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, scale) = UNITS
        .iter()
        .find_map(|(unit, scale)| value.strip_suffix(unit).map(|number| (number, *scale)))
        .unwrap_or((value, 1.0));

    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite() && *number >= 0.0)
        .map(|number| number * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("744.09"), Some(744.09), "unitless");
        assert_eq!(parse_length("90px"), Some(90.0), "px");
        assert_eq!(parse_length(" 2in "), Some(180.0), "in");
        assert_eq!(parse_length("72pt"), Some(90.0), "pt");
        assert_eq!(parse_length("1e2"), Some(100.0), "exponent");
        assert_eq!(parse_length("100%"), None, "percent");
        assert_eq!(parse_length("-5"), None, "negative");
        assert_eq!(parse_length("wide"), None, "text");
        assert!(
            (parse_length("25.4mm").unwrap() - 90.0).abs() < 1e-9,
            "mm"
        );
    }

    #[test]
    fn test_parse_document() {
        let document = parse_document(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="900" height="450">
                <g style="stroke:#ff0000">
                    <path d="M 0,0 L 10,10" style="stroke:#640a00;fill:none"/>
                    <rect width="10" height="10"/>
                </g>
            </svg>"##,
        )
        .unwrap();

        assert_eq!(document.width, 900.0);
        assert_eq!(document.height, 450.0);
        assert_eq!(
            document.elements,
            [
                StyledElement {
                    style: None,
                    path_data: None,
                },
                StyledElement {
                    style: Some("stroke:#ff0000".to_string()),
                    path_data: None,
                },
                StyledElement {
                    style: Some("stroke:#640a00;fill:none".to_string()),
                    path_data: Some("M 0,0 L 10,10".to_string()),
                },
                StyledElement::default(),
            ]
        );
    }

    #[test]
    fn test_dimensions_are_required() {
        let missing = parse_document(r#"<svg width="10"/>"#);
        assert!(
            matches!(missing, Err(ExtractError::MissingDimension("height"))),
            "no height"
        );

        let invalid = parse_document(r#"<svg width="10" height="auto"/>"#);
        assert!(
            matches!(invalid, Err(ExtractError::InvalidDimension { name: "height", .. })),
            "height of auto"
        );

        assert!(
            matches!(parse_document("<svg"), Err(ExtractError::Xml(_))),
            "not XML"
        );
    }
}
