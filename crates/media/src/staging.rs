use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::MediaError;

/// Extension used for audio uploads whose name carries none.
pub const DEFAULT_AUDIO_EXT: &str = "ogg";
/// Extension used for image uploads whose name carries none.
pub const DEFAULT_IMAGE_EXT: &str = "jpg";

/// An uploaded file written to a temporary path for the duration of one request.
///
/// The file is deleted when the value drops, whichever way the request ends.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    filename: String,
}

impl StagedUpload {
    /// Writes `bytes` to a fresh temp file that keeps the extension of `filename`
    /// (or `default_ext` when it has none).
    pub fn stage(filename: &str, bytes: &[u8], default_ext: &str) -> Result<Self, MediaError> {
        let suffix = format!(".{}", upload_extension(filename, default_ext));
        let mut file = tempfile::Builder::new()
            .prefix("civic-upload-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(
            filename,
            path = %file.path().display(),
            bytes = bytes.len(),
            "upload staged"
        );
        Ok(Self {
            file,
            filename: filename.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name the client gave the upload.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

fn upload_extension<'a>(filename: &'a str, default_ext: &'a str) -> &'a str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => default_ext,
    }
}
