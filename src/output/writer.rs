use std::path::{Path, PathBuf};

use crate::error::GenerateError;
use crate::generator::emitter::GeneratedFile;

/// Output path for an input file: same base path, `.py` extension.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("py")
}

/// Write the rendered file next to `input` and return the output path.
pub fn write_output(input: &Path, file: &GeneratedFile) -> Result<PathBuf, GenerateError> {
    let output = output_path_for(input);
    if output == input {
        return Err(GenerateError::OutputIsInput { path: output });
    }

    std::fs::write(&output, file.to_string()).map_err(|source| GenerateError::Write {
        path: output.clone(),
        source,
    })?;
    Ok(output)
}
