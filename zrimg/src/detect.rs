//! Format identification from file content.

use crate::DetectArgs;
use crate::inputs;

/// Run the `detect` subcommand.
///
/// Prints one `path: FORMAT` line per file. Detection reads only the
/// signature bytes, so it names what the content is, independent of the
/// file extension; an LSM stack reports as TIFF here because the two
/// share a container.
pub fn run(args: DetectArgs) -> anyhow::Result<()> {
    let files = inputs::expand(&args.files)?;

    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let mut failures = 0usize;
    for path in &files {
        match zenraster::detect_format(path) {
            Ok(format) => println!("{}: {format}", path.display()),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {e}", path.display());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} files were not recognized", files.len());
    }
    Ok(())
}
