//! Single-image conversion through the unified read/write path.

use anyhow::Context;

use crate::ConvertArgs;
use crate::inputs;

/// Run the `convert` subcommand.
pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let config = args.codec_config();

    let decoded = zenraster::ReadRequest::from_path(&args.input)
        .with_config(&config)
        .with_gray(args.gray)
        .read()
        .with_context(|| format!("reading {}", args.input.display()))?;

    let mut request = zenraster::WriteRequest::new(&decoded.pixels).with_config(&config);
    if let Some(format) = args.format {
        request = request.with_format(format.to_image_format());
    }
    request
        .write(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let input_size = args.input.metadata().map(|m| m.len()).unwrap_or(0);
    let output_size = args.output.metadata().map(|m| m.len()).unwrap_or(0);
    let change = if input_size > 0 {
        let pct = (output_size as f64 - input_size as f64) / input_size as f64 * 100.0;
        format!(" ({pct:+.1}%)")
    } else {
        String::new()
    };
    eprintln!(
        "{} -> {} ({}{change})",
        inputs::format_size(input_size),
        inputs::format_size(output_size),
        args.output.display(),
    );

    Ok(())
}
