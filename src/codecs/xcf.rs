//! GIMP XCF input through the external `xcf2png` converter.
//!
//! XCF is a layered project format with no stable in-process decoder
//! here; the original files are handed to `xcf2png <input> -o
//! <output.png>` and the flattened PNG it produces is routed back
//! through the ordinary PNG decode path. Blob input is materialized as
//! a scoped temp file first. Both temp files are owned by
//! [`tempfile::NamedTempFile`] guards and removed on every exit path.
//! Read-only.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::limits::Limits;
use crate::metadata::Metadata;
use crate::read::DecodeOutput;
use crate::ImageFormat;

fn resolve_tool(config: &CodecConfig) -> &str {
    config
        .xcf_tool
        .as_deref()
        .unwrap_or(crate::format::XCF_TOOL)
}

/// Convert and decode an XCF file on disk.
pub(crate) fn decode_path(
    path: &Path,
    config: &CodecConfig,
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let tool = resolve_tool(config);
    let converted = tempfile::Builder::new()
        .prefix("zenraster-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| Error::io("creating temp file", e))?;

    let invocation = Command::new(tool)
        .arg(path)
        .arg("-o")
        .arg(converted.path())
        .output();

    let output = match invocation {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ExternalToolUnavailable {
                tool: tool.to_string(),
                detail: "not found on PATH".to_string(),
            });
        }
        Err(e) => {
            return Err(Error::ExternalToolUnavailable {
                tool: tool.to_string(),
                detail: e.to_string(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        log::warn!("{} exited with {}: {}", tool, output.status, stderr);
        let detail = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {}", output.status, stderr)
        };
        return Err(Error::ExternalToolUnavailable {
            tool: tool.to_string(),
            detail,
        });
    }

    let png_data = std::fs::read(converted.path())
        .map_err(|e| Error::io("reading converted output", e))?;
    if png_data.is_empty() {
        return Err(Error::ExternalToolUnavailable {
            tool: tool.to_string(),
            detail: "produced no output".to_string(),
        });
    }

    let decoded = crate::codecs::png::decode(&png_data, limits, false)?;
    // The intermediate PNG's own metadata describes the converter, not
    // the source document.
    let metadata = want_metadata.then(Metadata::new);
    Ok(DecodeOutput {
        pixels: decoded.pixels,
        metadata,
    })
}

/// Convert and decode an in-memory XCF blob.
pub(crate) fn decode_blob(
    data: &[u8],
    config: &CodecConfig,
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let mut input = tempfile::Builder::new()
        .prefix("zenraster-")
        .suffix(".xcf")
        .tempfile()
        .map_err(|e| Error::io("creating temp file", e))?;
    input
        .write_all(data)
        .map_err(|e| Error::io("writing temp file", e))?;
    decode_path(input.path(), config, limits, want_metadata)
}
