//! `encode`
//!
//! Lays a [`JobSpec`] out as the fixed-size control file that the machine reads.
//!
//! All multi-byte fields are little-endian. Anything not written explicitly is zero.

use std::fmt;

use crate::job::{ColorEntry, JobSpec, Optimize};

/// Length of every control file, in bytes.
pub const FILE_LENGTH: usize = 0x0b4c;

/// Where [`HEADER`] is written.
pub const HEADER_OFFSET: usize = 0x40;

/// Fixed block written at [`HEADER_OFFSET`] in every file. Height, width and DPI are written
/// over it afterwards.
///
/// These bytes stand in for the template the firmware expects and have not been checked
/// against a file the machine accepts. Replace them with a capture of one before cutting.
pub const HEADER: [u8; 0xC0] = [
    0x01, 0x00, 0x00, 0x00, 0x4c, 0x0b, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x60, 0x05, 0x00, 0x00, // 0x40
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, // 0x50
    0x1c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x60
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x70
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x80
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x90
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0xA0
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0xB0
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0xC0
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0xD0
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0xE0
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // 0xF0
];

/// Machine units per inch used for the job size.
pub const UNITS_PER_INCH: f64 = 254.0;

/// Field offsets from the start of the file.
pub mod offset {
    /// Job height, u16 machine units.
    pub const HEIGHT: usize = 0x50;
    /// Job width, u16 machine units.
    pub const WIDTH: usize = 0x52;
    /// Resolution, u16.
    pub const DPI: usize = 0x5A;
    /// Raster power, u16.
    pub const RASTER_POWER: usize = 0x100;
    /// Raster speed, u16.
    pub const RASTER_SPEED: usize = 0x104;
    /// Vector power, u16.
    pub const VECTOR_POWER: usize = 0x108;
    /// Vector speed, u16.
    pub const VECTOR_SPEED: usize = 0x10C;
    /// Operating mode, u8.
    pub const MODE: usize = 0x110;
    /// Set when the colour map is in use, u8.
    pub const COLOR_MAP_ENABLED: usize = 0x318;
    /// Number of colour map entries, u8.
    pub const COLOR_MAP_COUNT: usize = 0x320;
    /// Vector frequency, u16.
    pub const FREQUENCY: usize = 0x344;
    /// Dither algorithm, u8.
    pub const DITHER: usize = 0x350;
    /// Second optimisation flag, u8.
    pub const OPTIMIZE_B: usize = 0xB48;
    /// First colour map slot.
    pub const COLOR_TABLE: usize = 0x560;
    /// Length of a colour map slot.
    pub const COLOR_SLOT_LENGTH: usize = 0x1C;
}

/// Offsets within a colour map slot.
pub mod slot {
    /// Red channel, u8.
    pub const RED: usize = 0;
    /// Green channel, u8.
    pub const GREEN: usize = 1;
    /// Blue channel, u8.
    pub const BLUE: usize = 2;
    /// Power, u8.
    pub const POWER: usize = 3;
    /// Speed, u8.
    pub const SPEED: usize = 4;
    /// Frequency, u16.
    pub const FREQUENCY: usize = 8;
    /// Raster switch, u8.
    pub const RASTER: usize = 12;
    /// Vector switch, u8.
    pub const VECTOR: usize = 16;
    /// Air assist switch, u8.
    pub const AIR: usize = 20;
}

/// Revisions of the control file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FormatRevision {
    /// First optimisation flag at 0x338, job size rounded up.
    #[default]
    Current,
    /// First optimisation flag at 0x348, job size truncated.
    Legacy,
}

impl FormatRevision {
    /// Where this revision keeps the first optimisation flag.
    #[must_use]
    pub fn optimize_a_offset(self) -> usize {
        match self {
            FormatRevision::Current => 0x338,
            FormatRevision::Legacy => 0x348,
        }
    }

    /// Converts a length to machine units.
    ///
    /// # Arguments
    /// * `inches`: The length, which validation and extraction keep within 0 to 36 inches.
    ///
    /// # Returns
    /// The length in machine units, saturating at the ends of `u16`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn inches_to_units(self, inches: f64) -> u16 {
        let units = inches * UNITS_PER_INCH;
        match self {
            FormatRevision::Current => units.ceil() as u16,
            FormatRevision::Legacy => units.trunc() as u16,
        }
    }
}

impl fmt::Display for FormatRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatRevision::Current => write!(f, "current"),
            FormatRevision::Legacy => write!(f, "legacy"),
        }
    }
}

/// A zero-filled control file being written.
struct ControlFile {
    /// The file contents, always [`FILE_LENGTH`] long.
    bytes: Vec<u8>,
}

impl ControlFile {
    /// Creates a zero-filled file.
    fn new() -> Self {
        ControlFile {
            bytes: vec![0; FILE_LENGTH],
        }
    }

    /// Writes a byte.
    fn put_u8(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }

    /// Writes a little-endian word.
    fn put_u16(&mut self, offset: usize, value: u16) {
        self.put_bytes(offset, &value.to_le_bytes());
    }

    /// Writes a run of bytes.
    fn put_bytes(&mut self, offset: usize, value: &[u8]) {
        self.bytes[offset..offset + value.len()].copy_from_slice(value);
    }
}

/// Encodes a job as a control file.
///
/// # Arguments
/// * `job`: The job to encode.
/// * `revision`: Which layout revision to produce.
///
/// # Returns
/// Exactly [`FILE_LENGTH`] bytes.
#[must_use]
pub fn encode(job: &JobSpec, revision: FormatRevision) -> Vec<u8> {
    let mut file = ControlFile::new();

    file.put_bytes(HEADER_OFFSET, &HEADER);
    file.put_u16(offset::HEIGHT, revision.inches_to_units(job.height));
    file.put_u16(offset::WIDTH, revision.inches_to_units(job.width));
    file.put_u16(offset::DPI, job.dpi);

    file.put_u16(offset::RASTER_POWER, job.raster_power.into());
    file.put_u16(offset::RASTER_SPEED, job.raster_speed.into());
    file.put_u16(offset::VECTOR_POWER, job.vector_power.into());
    file.put_u16(offset::VECTOR_SPEED, job.vector_speed.into());
    file.put_u8(offset::MODE, job.mode.code());

    file.put_u8(offset::COLOR_MAP_ENABLED, u8::from(!job.colors.is_empty()));
    // ColorMap never holds more than 16 entries.
    file.put_u8(
        offset::COLOR_MAP_COUNT,
        u8::try_from(job.colors.len()).unwrap_or(u8::MAX),
    );

    let optimize_a = match job.optimize {
        Optimize::On | Optimize::Inside => 2,
        Optimize::Off => 0,
    };
    file.put_u8(revision.optimize_a_offset(), optimize_a);
    file.put_u16(offset::FREQUENCY, job.frequency);
    file.put_u8(offset::DITHER, job.dither.code());
    file.put_u8(offset::OPTIMIZE_B, u8::from(job.optimize == Optimize::On));

    for (index, (_, entry)) in job.colors.iter().enumerate() {
        put_color_slot(
            &mut file,
            offset::COLOR_TABLE + index * offset::COLOR_SLOT_LENGTH,
            entry,
        );
    }

    log::debug!(
        "encoded {} colour(s) using the {revision} layout",
        job.colors.len()
    );

    file.bytes
}

/// Writes one colour map slot.
///
/// # Arguments
/// * `file`: The file to write into.
/// * `start`: Offset of the slot.
/// * `entry`: The settings to write.
fn put_color_slot(file: &mut ControlFile, start: usize, entry: &ColorEntry) {
    let [red, green, blue] = entry.channels();
    file.put_u8(start + slot::RED, red);
    file.put_u8(start + slot::GREEN, green);
    file.put_u8(start + slot::BLUE, blue);
    file.put_u8(start + slot::POWER, entry.power());
    file.put_u8(start + slot::SPEED, entry.speed());
    file.put_u16(start + slot::FREQUENCY, entry.frequency());
    file.put_u8(start + slot::RASTER, entry.raster().into());
    file.put_u8(start + slot::VECTOR, entry.vector().into());
    file.put_u8(start + slot::AIR, entry.air().into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ColorMap, Dither, Mode};

    fn job() -> JobSpec {
        JobSpec {
            mode: Mode::Combined,
            dpi: 300,
            width: 12.0,
            height: 8.5,
            raster_power: 40,
            raster_speed: 60,
            vector_power: 80,
            vector_speed: 15,
            frequency: 500,
            optimize: Optimize::On,
            dither: Dither::Floyd,
            colors: ColorMap::default(),
        }
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_file_length_and_header() {
        let bytes = encode(&job(), FormatRevision::Current);
        assert_eq!(bytes.len(), 2892);

        let header = &bytes[HEADER_OFFSET..0x100];
        for (index, (written, expected)) in header.iter().zip(HEADER).enumerate() {
            let offset = HEADER_OFFSET + index;
            let is_field = (offset::HEIGHT..offset::WIDTH + 2).contains(&offset)
                || (offset::DPI..offset::DPI + 2).contains(&offset);
            if !is_field {
                assert_eq!(*written, expected, "header byte {offset:#x}");
            }
        }
        assert!(
            bytes[..HEADER_OFFSET].iter().all(|byte| *byte == 0),
            "nothing before the header"
        );
    }

    #[test]
    fn test_scalar_fields() {
        let bytes = encode(&job(), FormatRevision::Current);

        assert_eq!(u16_at(&bytes, offset::HEIGHT), 2159, "8.5in");
        assert_eq!(u16_at(&bytes, offset::WIDTH), 3048, "12in");
        assert_eq!(u16_at(&bytes, offset::DPI), 300);
        assert_eq!(u16_at(&bytes, offset::RASTER_POWER), 40);
        assert_eq!(u16_at(&bytes, offset::RASTER_SPEED), 60);
        assert_eq!(u16_at(&bytes, offset::VECTOR_POWER), 80);
        assert_eq!(u16_at(&bytes, offset::VECTOR_SPEED), 15);
        assert_eq!(bytes[offset::MODE], 2);
        assert_eq!(u16_at(&bytes, offset::FREQUENCY), 500);
        assert_eq!(bytes[offset::DITHER], 2);
        assert_eq!(bytes[offset::COLOR_MAP_ENABLED], 0);
        assert_eq!(bytes[offset::COLOR_MAP_COUNT], 0);
    }

    #[test]
    fn test_size_rounding() {
        let mut job = job();
        job.width = 0.1;
        job.height = 24.0;

        let current = encode(&job, FormatRevision::Current);
        assert_eq!(u16_at(&current, offset::WIDTH), 26, "0.1in rounds up");
        assert_eq!(u16_at(&current, offset::HEIGHT), 6096, "24in");

        let legacy = encode(&job, FormatRevision::Legacy);
        assert_eq!(u16_at(&legacy, offset::WIDTH), 25, "0.1in truncates");
        assert_eq!(u16_at(&legacy, offset::HEIGHT), 6096, "24in");
    }

    #[test]
    fn test_size_is_ceiling_across_range() {
        let mut job = job();
        for step in 0..=240 {
            let height = f64::from(step) / 10.0;
            let width = height * 1.5;
            job.height = height;
            job.width = width;

            let bytes = encode(&job, FormatRevision::Current);
            assert_eq!(
                f64::from(u16_at(&bytes, offset::HEIGHT)),
                (height * 254.0).ceil(),
                "height {height}"
            );
            assert_eq!(
                f64::from(u16_at(&bytes, offset::WIDTH)),
                (width * 254.0).ceil(),
                "width {width}"
            );
        }
    }

    #[test]
    fn test_optimize_flags() {
        for (optimize, flag_a, flag_b) in [
            (Optimize::On, 2, 1),
            (Optimize::Off, 0, 0),
            (Optimize::Inside, 2, 0),
        ] {
            let mut job = job();
            job.optimize = optimize;

            let bytes = encode(&job, FormatRevision::Current);
            assert_eq!(bytes[0x338], flag_a, "{optimize:?} flag A");
            assert_eq!(bytes[0x348], 0, "{optimize:?} legacy flag A unused");
            assert_eq!(bytes[offset::OPTIMIZE_B], flag_b, "{optimize:?} flag B");

            let bytes = encode(&job, FormatRevision::Legacy);
            assert_eq!(bytes[0x348], flag_a, "{optimize:?} legacy flag A");
            assert_eq!(bytes[0x338], 0, "{optimize:?} flag A unused");
        }
    }

    #[test]
    fn test_colour_slots() {
        let mut job = job();
        job.colors = ColorMap::from_entries([
            (7, ColorEntry::new(0x00_0102, 9, 8, 10, false, true, false)),
            (1, ColorEntry::new(0xFF_8040, 100, 50, 0x1234, true, false, true)),
        ])
        .unwrap();

        let bytes = encode(&job, FormatRevision::Current);
        assert_eq!(bytes[offset::COLOR_MAP_ENABLED], 1);
        assert_eq!(bytes[offset::COLOR_MAP_COUNT], 2);

        let first = &bytes[0x560..0x560 + 0x1C];
        assert_eq!(
            first,
            [
                0xFF, 0x80, 0x40, 100, 50, 0, 0, 0, 0x34, 0x12, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1,
                0, 0, 0, 0, 0, 0, 0
            ]
        );

        let second = &bytes[0x57C..0x57C + 0x1C];
        assert_eq!(&second[..5], [0x00, 0x01, 0x02, 9, 8]);
        assert_eq!(u16_at(second, slot::FREQUENCY), 10);
        assert_eq!(
            [second[slot::RASTER], second[slot::VECTOR], second[slot::AIR]],
            [0, 1, 0]
        );

        assert!(
            bytes[0x598..offset::OPTIMIZE_B].iter().all(|byte| *byte == 0),
            "unused slots are zero"
        );
    }
}
