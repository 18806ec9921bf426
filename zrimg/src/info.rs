//! Image inspection: probe and display header fields without decoding.

use std::path::Path;

use serde::Serialize;

use crate::InfoArgs;
use crate::inputs;

/// Run the `info` subcommand.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let files = inputs::expand(&args.files)?;

    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let multi = files.len() > 1;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        match inspect_file(path) {
            Ok(info) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_info(&info);
                }
            }
            Err(e) => {
                eprintln!("  error: {e:#}");
            }
        }
    }

    Ok(())
}

/// Probe a single file and return structured info.
fn inspect_file(path: &Path) -> anyhow::Result<ImageInfoDisplay> {
    let data = std::fs::read(path)?;
    let file_size = data.len() as u64;

    let mut format = zenraster::detect_format_from_blob(&data)?;

    // Content sniffing reports an LSM stack as TIFF; the extension
    // refines it so the probe counts only real frames.
    if format == zenraster::ImageFormat::Tiff
        && path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("lsm"))
    {
        format = zenraster::ImageFormat::Lsm;
    }

    let probe = zenraster::ProbeResult::for_format(&data, format);
    let registry = zenraster::CodecRegistry::all();

    Ok(ImageInfoDisplay {
        path: path.display().to_string(),
        format: format.to_string(),
        mime_type: format.mime_type().to_string(),
        width: probe.width,
        height: probe.height,
        bit_depth: probe.bit_depth,
        has_alpha: probe.has_alpha,
        frame_count: probe.frame_count,
        multi_frame: format.multi_frame(),
        readable: registry.can_read(format),
        writable: registry.can_write(format),
        external_tool: format.external_tool().map(str::to_string),
        file_size,
    })
}

#[derive(Debug, Serialize)]
struct ImageInfoDisplay {
    path: String,
    format: String,
    mime_type: String,
    width: Option<u32>,
    height: Option<u32>,
    bit_depth: Option<u8>,
    has_alpha: Option<bool>,
    frame_count: Option<u32>,
    multi_frame: bool,
    readable: bool,
    writable: bool,
    external_tool: Option<String>,
    file_size: u64,
}

fn print_info(info: &ImageInfoDisplay) {
    println!("  Format:       {} ({})", info.format, info.mime_type);

    match (info.width, info.height) {
        (Some(w), Some(h)) => println!("  Dimensions:   {w}x{h}"),
        _ => println!("  Dimensions:   unknown (truncated or unreadable header)"),
    }
    if let Some(depth) = info.bit_depth {
        println!("  Bit depth:    {depth}");
    }
    if let Some(alpha) = info.has_alpha {
        println!("  Alpha:        {}", if alpha { "yes" } else { "no" });
    }
    if info.multi_frame {
        match info.frame_count {
            Some(count) => println!("  Frames:       {count}"),
            None => println!("  Frames:       unknown"),
        }
    }

    let codec = match (info.readable, info.writable) {
        (true, true) => "read+write",
        (true, false) => "read-only",
        (false, true) => "write-only",
        (false, false) => "unavailable",
    };
    println!("  Codec:        {codec}");
    if let Some(ref tool) = info.external_tool {
        println!("  Converter:    {tool}");
    }

    println!("  File size:    {}", inputs::format_size(info.file_size));
}
