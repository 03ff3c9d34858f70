//! `sellercheck optimize` — canonicalize a document.

use std::path::PathBuf;

use sellercheck_engine::optimize_ads_txt;

use crate::CliError;

pub fn cmd_optimize(
    input: PathBuf,
    domain: Option<String>,
    out: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let content = crate::read_input(&input)?;
    let optimized = optimize_ads_txt(&content, domain.as_deref());

    crate::write_output(&optimized, &out)?;
    if !quiet {
        if let Some(path) = &out {
            eprintln!("Wrote {} bytes to {}", optimized.len(), path.display());
        }
    }

    Ok(())
}
