use super::{read_input, STDIO};
use anyhow::{bail, Context, Result};
use ccnbpcap_core::{capture::CaptureWriter, driver::process_buffer, DriverConfig, Error};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::{info, warn};

/// Outcome of a dump run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpSummary {
    /// Inputs attempted
    pub inputs: usize,
    /// Inputs that could not be read or stopped early
    pub failed: usize,
    /// Capture records written
    pub records: usize,
    /// Frame bytes written
    pub frame_bytes: usize,
}

impl DumpSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Convert every input into one capture stream
///
/// `output` of `None` or `-` writes to stdout.
pub fn execute(
    inputs: &[String],
    output: Option<&str>,
    config: &DriverConfig,
    fail_fast: bool,
) -> Result<DumpSummary> {
    if inputs.is_empty() {
        bail!("No inputs given");
    }

    match output {
        None | Some(STDIO) => execute_to(inputs, io::stdout().lock(), config, fail_fast),
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            execute_to(inputs, BufWriter::new(file), config, fail_fast)
        }
    }
}

/// Convert every input into a capture written to `sink`
///
/// A failed input is logged and skipped unless `fail_fast` is set. A sink
/// that rejects writes ends the whole run since later inputs could not be
/// written either.
pub fn execute_to<W: Write>(
    inputs: &[String],
    sink: W,
    config: &DriverConfig,
    fail_fast: bool,
) -> Result<DumpSummary> {
    let mut writer = CaptureWriter::loopback(sink).context("Failed to write capture header")?;
    let mut summary = DumpSummary::default();

    for input in inputs {
        summary.inputs += 1;

        let data = match read_input(input) {
            Ok(data) => data,
            Err(e) if !fail_fast => {
                warn!("{:#}", e);
                summary.failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        info!("Processing {} ({} bytes)", input, data.len());

        match process_buffer(&data, config, &mut writer) {
            Ok(stats) => {
                info!(
                    "{}: {} records, {} frame bytes",
                    input, stats.records, stats.frame_bytes
                );
                summary.records += stats.records;
                summary.frame_bytes += stats.frame_bytes;
            }
            Err(e @ Error::WriteFailure(_)) => {
                return Err(e).with_context(|| format!("Output failed while processing {}", input));
            }
            Err(e) => {
                if fail_fast {
                    return Err(e).with_context(|| format!("Failed to process {}", input));
                }
                warn!("{}: {}", input, e);
                summary.failed += 1;
            }
        }
    }

    writer.close().context("Failed to flush capture output")?;

    info!(
        "Wrote {} records ({} frame bytes) from {} inputs, {} failed",
        summary.records, summary.frame_bytes, summary.inputs, summary.failed
    );

    Ok(summary)
}
