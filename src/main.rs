use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::PathBuf;
use std::process;

use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing::{debug, error, info, warn};

use gdm70x_lib::constants::DEFAULT_TTY;
use gdm70x_lib::{Config, Gdm70x, GdmError, Transport};
use gdm70x_rs::output::DEFAULT_VALUE_FORMAT;
use gdm70x_rs::xpm::DEFAULT_FILENAME_FORMAT;
use gdm70x_rs::{FilenameFormat, ValueFormat, logging, write_xpm};

/// Reads measurements and screen dumps from a Voltcraft GDM 70x multimeter.
///
/// Value templates accept %D1/%D2 (value), %M1/%M2 (multiplier), %U1/%U2
/// (unit), %T1/%T2 (AC/DC), %I (record number), %C (seconds since the
/// epoch), %S (seconds since start), %%, \n and \\.
///
/// File name templates accept %s %m %h %D %M %Y %y for the current time and
/// %N, a counter raised until the name is unused.
///
/// Logs go to stderr: warnings by default, -v for progress, -vv for frame
/// decoding, -vvv for raw bytes. RUST_LOG overrides the level.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial device the meter is connected to.
    #[arg(short, long, default_value = DEFAULT_TTY, conflicts_with = "replay")]
    device: String,
    /// Decode a captured byte stream instead of reading a device.
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Output template for value records.
    #[arg(short, long, default_value = DEFAULT_VALUE_FORMAT)]
    format: ValueFormat,
    /// File name template for received images.
    #[arg(short = 'F', long, default_value = DEFAULT_FILENAME_FORMAT)]
    filename_format: FilenameFormat,
    /// Receive screen dumps and store them as XPM files.
    #[arg(short = 'i', long)]
    enable_image: bool,
    /// Number of cycles to run, 0 runs until interrupted.
    #[arg(short, long, default_value_t = 0)]
    count: u64,
    /// Additional character accepted as decimal point.
    #[arg(long, default_value_t = '.')]
    decimal_separator: char,
    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose.tracing_level_filter(), cli.log_file.as_deref())
        .with_context(|| format!("Failed to create log file at: {:?}", cli.log_file))?;
    if let Some(path) = &cli.log_file {
        info!("Logging to file: {:?}", path);
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::default().with_decimal_separator(cli.decimal_separator);

    match cli.replay.clone() {
        Some(path) => {
            let capture =
                std::fs::read(&path).with_context(|| format!("Failed to read capture {:?}", path))?;
            info!(?path, bytes = capture.len(), "Replaying capture");
            measure(Gdm70x::new(Cursor::new(capture), config), &cli, true)
        }
        None => {
            let gdm = Gdm70x::open(&cli.device, config)
                .with_context(|| format!("Failed to open {}", cli.device))?;
            measure(gdm, &cli, false)
        }
    }
}

fn measure<T: Transport>(mut gdm: Gdm70x<T>, cli: &Cli, replay: bool) -> Result<()> {
    info!("Trying to sync with the meter");
    gdm.sync().context("Initial sync failed")?;

    let start = Utc::now();
    let format = cli.format.clone();
    let mut record = 0u64;
    gdm.set_value_callback(move |reading| {
        record += 1;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(format.render(reading, record, start).as_bytes())?;
        stdout.flush()?;
        Ok(())
    });

    if cli.enable_image {
        let filename_format = cli.filename_format.clone();
        gdm.set_image_callback(move |image| {
            let path = filename_format.next_free_path(&Local::now().naive_local(), |p| p.exists())?;
            info!(?path, "Writing image");
            write_xpm(image, BufWriter::new(File::create(&path)?))?;
            Ok(())
        })
        .context("Failed to enable image reception")?;
    }

    info!("Measuring");
    let drain = cli.count > 0;
    let mut cycles = 0u64;
    while !drain || cycles < cli.count {
        cycles += 1;
        match gdm.run_cycle(drain) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                if replay && gdm.bytes_pending()? == 0 {
                    debug!("End of capture");
                    break;
                }
                warn!("{}", e);
            }
            Err(GdmError::CallbackAborted(source)) => bail!("Output failed: {}", source),
            Err(e) => return Err(e.into()),
        }
    }

    info!(cycles, "Exiting");
    drop(gdm.close());
    Ok(())
}
