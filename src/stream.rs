// Upper-case copy of a text file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("cannot read input file {}", .path.display())]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write output file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    pub bytes: usize,
    /// Bytes that differed after upper-casing.
    pub changed: usize,
}

/// ASCII upper-casing. Non-ASCII characters pass through unchanged.
pub fn upper_case(text: &str) -> String {
    text.to_ascii_uppercase()
}

/// Reads `input` whole, upper-cases it and writes the result to `output`.
///
/// Nothing is written when the input cannot be read.
pub fn upper_case_copy(input: &Path, output: &Path) -> Result<TransformSummary, TransformError> {
    let text = fs::read_to_string(input).map_err(|source| TransformError::MalformedInput {
        path: input.to_path_buf(),
        source,
    })?;

    let upper = upper_case(&text);
    let changed = text
        .bytes()
        .zip(upper.bytes())
        .filter(|(before, after)| before != after)
        .count();

    fs::write(output, &upper).map_err(|source| TransformError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = upper.len(),
        changed,
        "wrote upper-case copy"
    );

    Ok(TransformSummary {
        bytes: upper.len(),
        changed,
    })
}
