use std::io;
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};

/// Loads `tokenizer.json` from a model directory (or an explicit tokenizer path).
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path.to_path_buf()
    };

    if !tokenizer_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("tokenizer not found at {}", tokenizer_path.display()),
        ));
    }

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer that truncates to `max_len` tokens and never pads.
///
/// Inputs are encoded one at a time, so padding would only dilute mean pooling.
pub fn load_tokenizer_with_truncation(model_path: &Path, max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(model_path)?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(None);

    Ok(tokenizer)
}

/// Checks that a model directory has the files every BERT loader here expects.
pub fn check_model_dir(model_dir: &Path) -> Result<(), String> {
    if !model_dir.is_dir() {
        return Err(format!("model directory not found: {}", model_dir.display()));
    }
    for file in ["config.json", "model.safetensors", "tokenizer.json"] {
        if !model_dir.join(file).exists() {
            return Err(format!("missing {} in {}", file, model_dir.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_model_dir_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let err = check_model_dir(dir.path()).unwrap_err();
        assert!(err.contains("model.safetensors"));
    }

    #[test]
    fn test_check_model_dir_not_a_dir() {
        let err = check_model_dir(Path::new("/nope/nothing")).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_load_tokenizer_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_tokenizer(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
