//! tgzkit CLI
//!
//! Pack directory trees into tar or tar.gz archives, extract them, and
//! gzip or gunzip single files.

mod utils;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tgzkit_archive::facade::{self, Settings};
use tgzkit_archive::{ArchiveFormat, TarFile};
use tgzkit_core::{GzipLevel, TarOptions, TgzError};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use utils::{format_size, print_entries, BarProgress};

#[derive(Parser)]
#[command(name = "tgzkit")]
#[command(author, version, about = "Tar and gzip archiver with progress reporting")]
#[command(long_about = "
tgzkit packs directory trees into UStar archives, optionally gzip-compressed,
and extracts them again.

Examples:
  tgzkit create backup.tar.gz project/
  tgzkit create backup.tar project/ --format tar
  tgzkit extract backup.tar.gz -o restored/
  tgzkit list backup.tar -l
  tgzkit gzip notes.txt
  tgzkit gunzip notes.txt.gz
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive from a file or directory
    #[command(alias = "c")]
    Create {
        /// Output archive file
        archive: PathBuf,

        /// File or directory to pack
        source: PathBuf,

        /// Archive format (auto-detected from the extension if not specified)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Gzip compression level (0-9)
        #[arg(short = 'l', long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Extract a tar or tar.gz archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Reject headers whose checksum does not match
        #[arg(long)]
        strict: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the entries of a tar or tar.gz archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show offsets, sizes and types
        #[arg(short, long)]
        long: bool,

        /// Reject headers whose checksum does not match
        #[arg(long)]
        strict: bool,
    },

    /// Compress a single file with gzip
    Gzip {
        /// File to compress
        file: PathBuf,

        /// Output file (defaults to FILE.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Decompress a single gzip file
    Gunzip {
        /// File to decompress
        file: PathBuf,

        /// Output file (defaults to FILE without its .gz extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Detect archive format
    Detect {
        /// File to detect
        file: PathBuf,
    },
}

/// Output archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain TAR archive
    Tar,
    /// Gzip-compressed TAR archive
    Tgz,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Self {
        match ArchiveFormat::from_extension(path) {
            ArchiveFormat::Gzip => Self::Tgz,
            _ => Self::Tar,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let result = match cli.command {
        Commands::Create {
            archive,
            source,
            format,
            level,
            quiet,
        } => cmd_create(&archive, &source, format, level, !quiet),
        Commands::Extract {
            archive,
            output,
            strict,
            quiet,
        } => cmd_extract(&archive, &output, strict, !quiet),
        Commands::List {
            archive,
            long,
            strict,
        } => cmd_list(&archive, long, strict),
        Commands::Gzip {
            file,
            output,
            level,
            quiet,
        } => cmd_gzip(&file, output, level, !quiet),
        Commands::Gunzip {
            file,
            output,
            quiet,
        } => cmd_gunzip(&file, output, !quiet),
        Commands::Detect { file } => cmd_detect(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_create(
    archive: &Path,
    source: &Path,
    format: Option<OutputFormat>,
    level: u8,
    show_progress: bool,
) -> Result<(), TgzError> {
    let format = format.unwrap_or_else(|| OutputFormat::from_path(archive));
    debug!(archive = %archive.display(), ?format, level, "creating archive");
    let settings = Settings::default().with_level(GzipLevel::new(level));
    let mut progress = BarProgress::new(show_progress);

    match format {
        OutputFormat::Tar => {
            progress.stage("packing");
            facade::tar_file_with(source, archive, &settings, &mut progress)?;
        }
        OutputFormat::Tgz => {
            progress.stage("packing and compressing");
            facade::tar_gzip_file_with(source, archive, &settings, &mut progress)?;
        }
    }
    progress.finish();

    let size = std::fs::metadata(archive)?.len();
    println!("Created {} ({})", archive.display(), format_size(size));
    Ok(())
}

fn cmd_extract(
    archive: &Path,
    output: &Path,
    strict: bool,
    show_progress: bool,
) -> Result<(), TgzError> {
    let settings =
        Settings::default().with_tar_options(TarOptions::new().with_strict_checksum(strict));
    let mut progress = BarProgress::new(show_progress);

    let format = ArchiveFormat::detect_path(archive)?;
    debug!(archive = %archive.display(), %format, "detected archive format");
    match format {
        ArchiveFormat::Gzip => {
            progress.stage("decompressing and extracting");
            facade::untar_gzip_file_with(archive, output, &settings, &mut progress)?;
        }
        ArchiveFormat::Tar | ArchiveFormat::Unknown => {
            // Old or minimal tar writers omit the ustar magic.
            progress.stage("extracting");
            facade::untar_file_with(archive, output, &settings, &mut progress)?;
        }
    }
    progress.finish();

    println!("Extracted {} to {}", archive.display(), output.display());
    Ok(())
}

fn cmd_list(archive: &Path, long: bool, strict: bool) -> Result<(), TgzError> {
    let options = TarOptions::new().with_strict_checksum(strict);

    let entries = match ArchiveFormat::detect_path(archive)? {
        ArchiveFormat::Gzip => {
            let staged = tempfile::Builder::new().suffix(".tar").tempfile()?;
            facade::ungzip_file(archive, staged.path())?;
            let entries = TarFile::new(staged.path()).with_options(options).list()?;
            staged.close()?;
            entries
        }
        ArchiveFormat::Tar | ArchiveFormat::Unknown => {
            TarFile::new(archive).with_options(options).list()?
        }
    };

    print_entries(&entries, long);
    Ok(())
}

fn cmd_gzip(
    file: &Path,
    output: Option<PathBuf>,
    level: u8,
    show_progress: bool,
) -> Result<(), TgzError> {
    let output = output.unwrap_or_else(|| {
        let mut name = file.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    });
    let settings = Settings::default().with_level(GzipLevel::new(level));
    let mut progress = BarProgress::new(show_progress);
    progress.stage("compressing");

    facade::gzip_file_with(file, &output, &settings, &mut progress)?;
    progress.finish();

    let before = std::fs::metadata(file)?.len();
    let after = std::fs::metadata(&output)?.len();
    println!(
        "{} -> {} ({} -> {})",
        file.display(),
        output.display(),
        format_size(before),
        format_size(after)
    );
    Ok(())
}

fn cmd_gunzip(file: &Path, output: Option<PathBuf>, show_progress: bool) -> Result<(), TgzError> {
    let output = output.unwrap_or_else(|| default_gunzip_output(file));
    let mut progress = BarProgress::new(show_progress);
    progress.stage("decompressing");

    facade::ungzip_file_with(file, &output, &Settings::default(), &mut progress)?;
    progress.finish();

    println!("{} -> {}", file.display(), output.display());
    Ok(())
}

/// `a.gz` becomes `a`, `a.tgz` becomes `a.tar`, anything else gets `.out`.
fn default_gunzip_output(file: &Path) -> PathBuf {
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => file.with_extension(""),
        Some(ext) if ext.eq_ignore_ascii_case("tgz") => file.with_extension("tar"),
        _ => {
            let mut name = file.as_os_str().to_owned();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

fn cmd_detect(file: &Path) -> Result<(), TgzError> {
    let mut reader = std::fs::File::open(file).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TgzError::source_not_found(file),
        _ => TgzError::Io(e),
    })?;
    let (format, magic) = ArchiveFormat::detect(&mut reader)?;

    println!("File: {}", file.display());
    println!("Format: {}", format);
    println!("Extension: .{}", format.extension());
    println!("MIME type: {}", format.mime_type());
    println!("Magic bytes: {:02X?}", &magic[..magic.len().min(16)]);
    Ok(())
}
