//! Syllabus file type detection and local staging

use crate::error::TutorError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Extensions accepted for upload, with their MIME types
const SUPPORTED_TYPES: [(&str, &str); 7] = [
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

fn extension_of(display_name: &str) -> Option<String> {
    Path::new(display_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// MIME type for a syllabus file name
///
/// # Errors
///
/// Returns [`TutorError::UnsupportedFileType`] for unknown or missing
/// extensions.
///
/// # Examples
///
/// ```
/// use syllabus_tutor::session::documents::mime_type_for;
///
/// assert_eq!(mime_type_for("Maths Syllabus.PDF").unwrap(), "application/pdf");
/// assert!(mime_type_for("archive.zip").is_err());
/// ```
pub fn mime_type_for(display_name: &str) -> Result<&'static str, TutorError> {
    let extension = extension_of(display_name).unwrap_or_default();
    SUPPORTED_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            TutorError::UnsupportedFileType(if extension.is_empty() {
                display_name.to_string()
            } else {
                extension
            })
        })
}

/// Writes `bytes` to a temporary file that is removed when dropped
///
/// The file keeps the original extension so the upload step can rely on
/// the name alone.
pub fn stage_bytes(bytes: &[u8], display_name: &str) -> Result<NamedTempFile, TutorError> {
    let suffix = extension_of(display_name)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("syllabus-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;

    tracing::debug!(
        "Staged {} ({} bytes) at {}",
        display_name,
        bytes.len(),
        file.path().display()
    );
    Ok(file)
}
