//! `job`
//!
//! The validated description of a single cutting job.

use std::collections::BTreeMap;

use serde::Serialize;

/// Machine operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Cut along paths.
    Vector,
    /// Engrave a bitmap.
    Raster,
    /// Engrave, then cut.
    Combined,
}

impl Mode {
    /// Gets the mode from the code used in the control file.
    ///
    /// # Arguments
    /// * `code`: The mode code.
    ///
    /// # Returns
    /// The mode, if the code is known.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Mode::Vector),
            1 => Some(Mode::Raster),
            2 => Some(Mode::Combined),
            _ => None,
        }
    }

    /// Gets the code used for this mode in the control file.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Mode::Vector => 0,
            Mode::Raster => 1,
            Mode::Combined => 2,
        }
    }
}

/// Path ordering optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimize {
    /// Cut paths in the order they were drawn.
    Off,
    /// Let the machine reorder paths.
    On,
    /// Reorder paths, cutting inner shapes before the shapes around them.
    Inside,
}

impl Optimize {
    /// Gets the setting from its schema code.
    ///
    /// # Arguments
    /// * `code`: 0 for off, 1 for on, 2 for inside.
    ///
    /// # Returns
    /// The setting, if the code is known.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Optimize::Off),
            1 => Some(Optimize::On),
            2 => Some(Optimize::Inside),
            _ => None,
        }
    }
}

/// Halftoning algorithm for raster engraving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dither {
    /// Ordered dither.
    Standard,
    /// Floyd-Steinberg.
    Floyd,
    /// Ordered dither, lightened.
    Bright,
    /// Coarse ordered dither.
    Lowres,
    /// Jarvis, Judice and Ninke.
    Jarvis,
    /// Stucki.
    Stucki,
}

impl Dither {
    /// Gets the algorithm from the code used in the control file.
    ///
    /// # Arguments
    /// * `code`: The dither code, from 1.
    ///
    /// # Returns
    /// The algorithm, if the code is known.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Dither::Standard),
            2 => Some(Dither::Floyd),
            3 => Some(Dither::Bright),
            4 => Some(Dither::Lowres),
            5 => Some(Dither::Jarvis),
            6 => Some(Dither::Stucki),
            _ => None,
        }
    }

    /// Gets the code used for this algorithm in the control file.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Dither::Standard => 1,
            Dither::Floyd => 2,
            Dither::Bright => 3,
            Dither::Lowres => 4,
            Dither::Jarvis => 5,
            Dither::Stucki => 6,
        }
    }
}

/// The settings used to cut lines of a given colour.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct ColorEntry {
    /// Colour of lines to machine, as `0xRRGGBB`.
    color: u32,
    /// Laser power, percent.
    power: u8,
    /// Head speed, percent.
    speed: u8,
    /// Pulse frequency.
    frequency: u16,
    /// Whether lines of this colour are engraved.
    raster: bool,
    /// Whether lines of this colour are cut.
    vector: bool,
    /// Whether air assist is on for this colour.
    air: bool,
}

impl ColorEntry {
    /// Creates a new [`ColorEntry`].
    ///
    /// # Arguments
    /// * `color`: Colour as `0xRRGGBB`, anything above 24 bits is dropped.
    /// * `power`: Laser power.
    /// * `speed`: Head speed.
    /// * `frequency`: Pulse frequency.
    /// * `raster`: Whether to engrave.
    /// * `vector`: Whether to cut.
    /// * `air`: Whether to use air assist.
    ///
    /// # Returns
    /// A new [`ColorEntry`].
    #[must_use]
    pub fn new(
        color: u32,
        power: u8,
        speed: u8,
        frequency: u16,
        raster: bool,
        vector: bool,
        air: bool,
    ) -> Self {
        ColorEntry {
            color: color & 0x00FF_FFFF,
            power,
            speed,
            frequency,
            raster,
            vector,
            air,
        }
    }

    /// Gets the colour, as `0xRRGGBB`.
    #[must_use]
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Gets the colour split into its channels.
    ///
    /// # Returns
    /// `[red, green, blue]`.
    #[must_use]
    pub fn channels(&self) -> [u8; 3] {
        let [_, red, green, blue] = self.color.to_be_bytes();
        [red, green, blue]
    }

    /// Gets the laser power.
    #[must_use]
    pub fn power(&self) -> u8 {
        self.power
    }

    /// Gets the head speed.
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Gets the pulse frequency.
    #[must_use]
    pub fn frequency(&self) -> u16 {
        self.frequency
    }

    /// Whether lines of this colour are engraved.
    #[must_use]
    pub fn raster(&self) -> bool {
        self.raster
    }

    /// Whether lines of this colour are cut.
    #[must_use]
    pub fn vector(&self) -> bool {
        self.vector
    }

    /// Whether air assist is on.
    #[must_use]
    pub fn air(&self) -> bool {
        self.air
    }
}

/// More colour map entries were given than the machine has slots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("at most {max} colours can be used, found {0}", max = ColorMap::MAX_ENTRIES)]
pub struct TooManyColors(pub usize);

/// The colour cut map, keyed by slot number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorMap(BTreeMap<u8, ColorEntry>);

impl ColorMap {
    /// The number of colour slots the machine has.
    pub const MAX_ENTRIES: usize = 16;

    /// Builds a colour map.
    ///
    /// # Arguments
    /// * `entries`: Slot numbers and their settings. A repeated slot number replaces the earlier entry.
    ///
    /// # Returns
    /// The colour map.
    ///
    /// # Errors
    /// [`TooManyColors`] if there are more than [`ColorMap::MAX_ENTRIES`] distinct slots.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (u8, ColorEntry)>,
    ) -> Result<Self, TooManyColors> {
        let map: BTreeMap<_, _> = entries.into_iter().collect();
        if map.len() > Self::MAX_ENTRIES {
            return Err(TooManyColors(map.len()));
        }
        Ok(ColorMap(map))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the entry in a slot.
    #[must_use]
    pub fn get(&self, key: u8) -> Option<&ColorEntry> {
        self.0.get(&key)
    }

    /// Iterates over the entries in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &ColorEntry)> + '_ {
        self.0.iter().map(|(key, entry)| (*key, entry))
    }
}

/// A validated job, with every field present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobSpec {
    /// Operating mode.
    pub mode: Mode,
    /// Engraving resolution.
    pub dpi: u16,
    /// Width of the job, inches.
    pub width: f64,
    /// Height of the job, inches.
    pub height: f64,
    /// Laser power when engraving.
    pub raster_power: u8,
    /// Head speed when engraving.
    pub raster_speed: u8,
    /// Laser power when cutting.
    pub vector_power: u8,
    /// Head speed when cutting.
    pub vector_speed: u8,
    /// Pulse frequency when cutting.
    pub frequency: u16,
    /// Path ordering.
    pub optimize: Optimize,
    /// Halftoning algorithm.
    pub dither: Dither,
    /// Per-colour settings.
    pub colors: ColorMap,
}

impl JobSpec {
    /// The job used as the starting point when a design's stroke colours describe the cut.
    ///
    /// # Returns
    /// A zero-sized vector job with middling settings and no colours.
    #[must_use]
    pub fn for_extraction() -> Self {
        JobSpec {
            mode: Mode::Vector,
            dpi: 600,
            width: 0.0,
            height: 0.0,
            raster_power: 50,
            raster_speed: 50,
            vector_power: 50,
            vector_speed: 50,
            frequency: 5000,
            optimize: Optimize::On,
            dither: Dither::Jarvis,
            colors: ColorMap::default(),
        }
    }
}
