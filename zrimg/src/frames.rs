//! Frame extraction: explode a multi-page file into numbered PNGs.

use std::path::Path;

use anyhow::Context;

use crate::FramesArgs;

/// Run the `frames` subcommand.
///
/// Single-frame inputs still work and produce exactly one file, so the
/// command doubles as "convert whatever this is to PNG".
pub fn run(args: FramesArgs) -> anyhow::Result<()> {
    let input = &args.input;

    let stem = match args.prefix {
        Some(ref p) => p.clone(),
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame")
            .to_string(),
    };
    let dir = match args.output {
        Some(ref d) => d.clone(),
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating directory: {}", dir.display()))?;

    let sequence = zenraster::read_multi(input)
        .with_context(|| format!("opening {}", input.display()))?;

    let mut count = 0usize;
    for (index, frame) in sequence.enumerate() {
        let pixels = frame.with_context(|| format!("reading {}", input.display()))?;
        let path = dir.join(format!("{stem}_{index:04}.png"));
        zenraster::WriteRequest::new(&pixels)
            .with_format(zenraster::ImageFormat::Png)
            .write(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        count += 1;
    }

    eprintln!(
        "{count} frame{} written to {}",
        if count == 1 { "" } else { "s" },
        dir.display()
    );
    Ok(())
}
