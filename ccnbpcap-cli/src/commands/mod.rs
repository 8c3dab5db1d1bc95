//! Subcommand implementations

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};

pub mod dump;
pub mod scan;

/// Path that means stdin for inputs and stdout for outputs
pub const STDIO: &str = "-";

/// Read a whole input, `-` meaning stdin
pub fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == STDIO {
        let mut data = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        Ok(data)
    } else {
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path))
    }
}
