//! `sigil`
//!
//! Converts a job description, or a colour-coded SVG design, into a laser control file.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use sigil::{
    convert_job, convert_svg, load_job, read_design, read_job, write_control_file,
    FormatRevision, JobSpec,
};

/// Exit status when the job or design is rejected.
const EXIT_DATA_ERROR: u8 = 65;
/// Exit status when a file cannot be read or written.
const EXIT_IO_ERROR: u8 = 74;

/// Converts a job description into a laser control file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Job description (TOML, or JSON if it ends in `.json`), or an SVG design with `--from-svg`.
    input: PathBuf,
    /// Where to write the control file.
    output: PathBuf,
    /// Read the input as an SVG design whose stroke colours give the cut settings.
    #[arg(long)]
    from_svg: bool,
    /// Job description to take the remaining settings from when using `--from-svg`.
    #[arg(long, requires = "from_svg")]
    base: Option<PathBuf>,
    /// Layout revision of the control file.
    #[arg(long, value_enum, default_value_t = FormatRevision::Current)]
    revision: FormatRevision,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if err.is_io() {
                ExitCode::from(EXIT_IO_ERROR)
            } else {
                ExitCode::from(EXIT_DATA_ERROR)
            }
        }
    }
}

/// Does the conversion described by the command line.
///
/// # Arguments
/// * `args`: The command line.
///
/// # Errors
/// Any [`sigil::Error`], before the output file is touched.
fn run(args: &Args) -> Result<(), sigil::Error> {
    let bytes = if args.from_svg {
        let base = match &args.base {
            Some(path) => load_job(path)?,
            None => JobSpec::for_extraction(),
        };
        convert_svg(&read_design(&args.input)?, base, args.revision)?
    } else {
        convert_job(&read_job(&args.input)?, args.revision)?
    };

    write_control_file(&args.output, &bytes)
}
