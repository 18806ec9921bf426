//! zrimg — raster image tool.
//!
//! Detect formats, probe headers without decoding, convert between
//! formats, and extract frames from multi-page containers, across all
//! zenraster-supported formats.

mod convert;
mod detect;
mod frames;
mod info;
mod inputs;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Arguments for the `detect` subcommand.
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `convert` subcommand.
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Input file.
    pub input: PathBuf,

    /// Output file. Its extension picks the target format unless
    /// --format is given.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target output format.
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// JPEG quality (1-100).
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// PNG compression level (0-9).
    #[arg(long)]
    pub png_level: Option<u8>,

    /// TIFF compression scheme.
    #[arg(long, value_enum)]
    pub tiff_compression: Option<TiffCompressionArg>,

    /// Description stored as the TIFF ImageDescription tag.
    #[arg(long)]
    pub description: Option<String>,

    /// Convert to grayscale.
    #[arg(long)]
    pub gray: bool,

    /// Drop the alpha channel.
    #[arg(long)]
    pub strip_alpha: bool,

    /// External converter binary for XCF input (default: xcf2png).
    #[arg(long)]
    pub xcf_tool: Option<String>,
}

/// Arguments for the `frames` subcommand.
#[derive(Parser, Debug)]
pub struct FramesArgs {
    /// Input file (TIFF or LSM for more than one frame).
    pub input: PathBuf,

    /// Output directory (default: next to the input).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output filename prefix (default: input stem).
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Target image format. Write-capable formats only.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Bmp,
    Jpeg,
    Png,
    Tiff,
    Webp,
}

impl FormatArg {
    pub fn to_image_format(self) -> zenraster::ImageFormat {
        match self {
            FormatArg::Bmp => zenraster::ImageFormat::Bmp,
            FormatArg::Jpeg => zenraster::ImageFormat::Jpeg,
            FormatArg::Png => zenraster::ImageFormat::Png,
            FormatArg::Tiff => zenraster::ImageFormat::Tiff,
            FormatArg::Webp => zenraster::ImageFormat::WebP,
        }
    }
}

/// TIFF compression scheme.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TiffCompressionArg {
    None,
    Lzw,
    Deflate,
    Packbits,
}

impl TiffCompressionArg {
    pub fn to_compression(self) -> zenraster::TiffCompression {
        match self {
            TiffCompressionArg::None => zenraster::TiffCompression::None,
            TiffCompressionArg::Lzw => zenraster::TiffCompression::Lzw,
            TiffCompressionArg::Deflate => zenraster::TiffCompression::Deflate,
            TiffCompressionArg::Packbits => zenraster::TiffCompression::Packbits,
        }
    }
}

impl ConvertArgs {
    /// Collect the codec knobs into a config for both read and write.
    pub fn codec_config(&self) -> zenraster::CodecConfig {
        let mut config = zenraster::CodecConfig::default().with_strip_alpha(self.strip_alpha);
        if let Some(quality) = self.quality {
            config = config.with_jpeg_quality(quality);
        }
        if let Some(level) = self.png_level {
            config = config.with_png_compression(level);
        }
        if let Some(compression) = self.tiff_compression {
            config = config.with_tiff_compression(compression.to_compression());
        }
        if let Some(ref description) = self.description {
            config = config.with_description(description);
        }
        if let Some(ref tool) = self.xcf_tool {
            config = config.with_xcf_tool(tool);
        }
        config
    }
}

/// Dispatch CLI arguments.
///
/// Uses a two-pass strategy: first try parsing as a known subcommand,
/// then fall back to treating everything as `info` arguments (bare
/// files default to inspection).
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    let first_arg = args.get(1).map(|s| s.as_str());
    match first_arg {
        Some("detect") => {
            let cmd = DetectArgs::parse_from(&args[1..]);
            detect::run(cmd)
        }
        Some("info") => {
            let cmd = InfoArgs::parse_from(&args[1..]);
            info::run(cmd)
        }
        Some("convert") => {
            let cmd = ConvertArgs::parse_from(&args[1..]);
            convert::run(cmd)
        }
        Some("frames") => {
            let cmd = FramesArgs::parse_from(&args[1..]);
            frames::run(cmd)
        }
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some("--version" | "-V") => {
            println!("zrimg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(_) => {
            // Bare files / flags → treat as `info` args
            let cmd = InfoArgs::parse_from(
                std::iter::once("info".to_string()).chain(args[1..].iter().cloned()),
            );
            info::run(cmd)
        }
    }
}

fn print_help() {
    eprintln!(
        "\
zrimg {} — raster image tool

USAGE:
    zrimg [COMMAND] [OPTIONS] <FILES>...

COMMANDS:
    detect     Identify formats from file content
    info       Probe and display image headers (default)
    convert    Read one image and write it in another format
    frames     Extract every frame of a multi-page file to PNG

Bare files default to `info`.

EXAMPLES:
    zrimg photo.jpg                          Show dimensions and header fields
    zrimg detect mystery.dat                 Name the format from magic bytes
    zrimg convert scan.tif -o scan.png       Transcode via the output extension
    zrimg convert photo.png -o small.jpg -q 60 --gray
    zrimg frames stack.lsm -o slices/        One PNG per microscopy slice
    zrimg info *.tif --json

Run `zrimg <command> --help` for full options.",
        env!("CARGO_PKG_VERSION")
    );
}
