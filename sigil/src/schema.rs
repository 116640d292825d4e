//! `schema`
//!
//! The rules that a job description is checked against.
//!
//! Every key a job (or a colour map entry) may carry is a variant of a closed enum, and each
//! variant answers for exactly one [`Rule`]. A key therefore can never be both a choice and a
//! range, and adding a key without giving it a rule will not compile.

use std::fmt;

use serde_json::Value;

/// A value that a [`Rule::Choice`] field will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A string, such as `"vector"`.
    Str(&'static str),
    /// A boolean, used as an alias for `"on"`/`"off"`.
    Bool(bool),
    /// An integer, such as a DPI.
    Int(i64),
}

impl Token {
    /// Checks whether a raw value is this token.
    ///
    /// # Arguments
    /// * `value`: The value from the job description.
    ///
    /// # Returns
    /// `true` if the value is exactly this token.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Token::Str(token), Value::String(value)) => token == value,
            (Token::Bool(token), Value::Bool(value)) => token == *value,
            (Token::Int(token), Value::Number(value)) => value.as_i64() == Some(token),
            _ => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(value) => write!(f, "\"{value}\""),
            Token::Bool(value) => write!(f, "{value}"),
            Token::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Whether a numeric field takes whole numbers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Whole numbers only.
    Integer,
    /// Any real number.
    Real,
}

/// How the value of a field is checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// The value must be one of the listed tokens and is replaced by the code paired with it.
    Choice(&'static [(Token, u16)]),
    /// The value must be a number in `min..=max`. It is kept as given.
    Range {
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
        /// Whether fractions are accepted.
        kind: NumberKind,
    },
    /// The value is the colour map, a table of [`ColorField`] tables.
    ColorMap,
}

/// A key of one of the job description tables.
pub trait Field: Copy + Ord + fmt::Debug + 'static {
    /// Every key of the table.
    const ALL: &'static [Self];

    /// The key as written in a job description.
    fn name(self) -> &'static str;

    /// The rule the value of this key must satisfy.
    fn rule(self) -> Rule;

    /// The value used when the key is absent, or `None` if the key is required.
    fn default_value(self) -> Option<Value>;

    /// Looks up a key by name.
    ///
    /// # Arguments
    /// * `name`: The key as written in a job description.
    ///
    /// # Returns
    /// The matching key, if any.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    /// Whether the key must be given.
    fn is_required(self) -> bool {
        self.default_value().is_none()
    }
}

/// Machine operating modes.
pub const MODES: &[(Token, u16)] = &[
    (Token::Str("vector"), 0),
    (Token::Str("raster"), 1),
    (Token::Str("combined"), 2),
];

/// Resolutions the machine can engrave at.
pub const DPIS: &[(Token, u16)] = &[
    (Token::Int(75), 75),
    (Token::Int(150), 150),
    (Token::Int(200), 200),
    (Token::Int(300), 300),
    (Token::Int(400), 400),
    (Token::Int(600), 600),
    (Token::Int(1200), 1200),
];

/// Path optimisation settings. Codes: 0 off, 1 on, 2 inside first.
pub const OPTIMIZE: &[(Token, u16)] = &[
    (Token::Str("on"), 1),
    (Token::Bool(true), 1),
    (Token::Str("off"), 0),
    (Token::Bool(false), 0),
    (Token::Str("inside"), 2),
];

/// Halftoning algorithms for raster engraving.
pub const DITHERS: &[(Token, u16)] = &[
    (Token::Str("standard"), 1),
    (Token::Str("floyd"), 2),
    (Token::Str("bright"), 3),
    (Token::Str("lowres"), 4),
    (Token::Str("jarvis"), 5),
    (Token::Str("stucki"), 6),
];

/// On/off switches of a colour map entry.
pub const SWITCH: &[(Token, u16)] = &[
    (Token::Bool(true), 1),
    (Token::Str("on"), 1),
    (Token::Bool(false), 0),
    (Token::Str("off"), 0),
];

/// Laser power, percent.
const POWER: Rule = Rule::Range {
    min: 0.0,
    max: 100.0,
    kind: NumberKind::Integer,
};

/// Head speed, percent.
const SPEED: Rule = Rule::Range {
    min: 1.0,
    max: 100.0,
    kind: NumberKind::Integer,
};

/// Pulse frequency for vector cutting.
const FREQUENCY: Rule = Rule::Range {
    min: 10.0,
    max: 5000.0,
    kind: NumberKind::Integer,
};

/// Keys of a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobField {
    /// `mode`
    Mode,
    /// `dpi`
    Dpi,
    /// `width`, inches.
    Width,
    /// `height`, inches.
    Height,
    /// `raster-power`
    RasterPower,
    /// `raster-speed`
    RasterSpeed,
    /// `vector-power`
    VectorPower,
    /// `vector-speed`
    VectorSpeed,
    /// `frequency`
    Frequency,
    /// `optimize`
    Optimize,
    /// `dither`
    Dither,
    /// `colors`
    Colors,
}

impl Field for JobField {
    const ALL: &'static [Self] = &[
        JobField::Mode,
        JobField::Dpi,
        JobField::Width,
        JobField::Height,
        JobField::RasterPower,
        JobField::RasterSpeed,
        JobField::VectorPower,
        JobField::VectorSpeed,
        JobField::Frequency,
        JobField::Optimize,
        JobField::Dither,
        JobField::Colors,
    ];

    fn name(self) -> &'static str {
        match self {
            JobField::Mode => "mode",
            JobField::Dpi => "dpi",
            JobField::Width => "width",
            JobField::Height => "height",
            JobField::RasterPower => "raster-power",
            JobField::RasterSpeed => "raster-speed",
            JobField::VectorPower => "vector-power",
            JobField::VectorSpeed => "vector-speed",
            JobField::Frequency => "frequency",
            JobField::Optimize => "optimize",
            JobField::Dither => "dither",
            JobField::Colors => "colors",
        }
    }

    fn rule(self) -> Rule {
        match self {
            JobField::Mode => Rule::Choice(MODES),
            JobField::Dpi => Rule::Choice(DPIS),
            JobField::Optimize => Rule::Choice(OPTIMIZE),
            JobField::Dither => Rule::Choice(DITHERS),
            JobField::Width => Rule::Range {
                min: 0.0,
                max: 36.0,
                kind: NumberKind::Real,
            },
            JobField::Height => Rule::Range {
                min: 0.0,
                max: 24.0,
                kind: NumberKind::Real,
            },
            JobField::RasterPower | JobField::VectorPower => POWER,
            JobField::RasterSpeed | JobField::VectorSpeed => SPEED,
            JobField::Frequency => FREQUENCY,
            JobField::Colors => Rule::ColorMap,
        }
    }

    fn default_value(self) -> Option<Value> {
        match self {
            JobField::Optimize => Some(Value::from("on")),
            JobField::Dither => Some(Value::from("jarvis")),
            JobField::Colors => Some(Value::Object(serde_json::Map::new())),
            _ => None,
        }
    }
}

/// Keys of a colour map entry. All of them are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorField {
    /// `color`, 24-bit RGB.
    Color,
    /// `power`
    Power,
    /// `speed`
    Speed,
    /// `frequency`
    Frequency,
    /// `raster`
    Raster,
    /// `vector`
    Vector,
    /// `air`, the air assist switch.
    Air,
}

impl Field for ColorField {
    const ALL: &'static [Self] = &[
        ColorField::Color,
        ColorField::Power,
        ColorField::Speed,
        ColorField::Frequency,
        ColorField::Raster,
        ColorField::Vector,
        ColorField::Air,
    ];

    fn name(self) -> &'static str {
        match self {
            ColorField::Color => "color",
            ColorField::Power => "power",
            ColorField::Speed => "speed",
            ColorField::Frequency => "frequency",
            ColorField::Raster => "raster",
            ColorField::Vector => "vector",
            ColorField::Air => "air",
        }
    }

    fn rule(self) -> Rule {
        match self {
            ColorField::Color => Rule::Range {
                min: 0.0,
                max: f64::from(0x00FF_FFFF),
                kind: NumberKind::Integer,
            },
            ColorField::Power => POWER,
            ColorField::Speed => SPEED,
            ColorField::Frequency => FREQUENCY,
            ColorField::Raster | ColorField::Vector | ColorField::Air => Rule::Choice(SWITCH),
        }
    }

    fn default_value(self) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_job_fields_are_required() {
        let required: Vec<_> = JobField::ALL
            .iter()
            .filter(|field| field.is_required())
            .map(|field| field.name())
            .collect();

        assert_eq!(
            required,
            [
                "mode",
                "dpi",
                "width",
                "height",
                "raster-power",
                "raster-speed",
                "vector-power",
                "vector-speed",
                "frequency"
            ]
        );
    }

    #[test]
    fn test_colour_fields_have_no_defaults() {
        assert!(
            ColorField::ALL.iter().all(|field| field.is_required()),
            "every colour entry key is required"
        );
    }

    #[test]
    fn test_names_round_trip() {
        for field in JobField::ALL {
            assert_eq!(JobField::from_name(field.name()), Some(*field));
        }
        for field in ColorField::ALL {
            assert_eq!(ColorField::from_name(field.name()), Some(*field));
        }
        assert_eq!(JobField::from_name("Mode"), None, "keys are case sensitive");
    }

    #[test]
    fn test_token_matches() {
        assert!(Token::Str("on").matches(&Value::from("on")), "string");
        assert!(Token::Bool(true).matches(&Value::from(true)), "bool");
        assert!(Token::Int(300).matches(&Value::from(300)), "int");
        assert!(!Token::Int(300).matches(&Value::from("300")), "string is not int");
        assert!(!Token::Str("true").matches(&Value::from(true)), "bool is not string");
        assert!(!Token::Int(1).matches(&Value::from(true)), "bool is not int");
    }
}
