use axum::extract::multipart::Field;

use crate::error::{AppError, Result};

/// Allowed image extensions
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub const ROSTER_EXTENSIONS: &[&str] = &["csv"];

/// Reads a file field. An empty file input (no file chosen) yields `None`.
pub async fn read_file_field(
    field: Field<'_>,
    allowed_extensions: &[&str],
    max_bytes: usize,
) -> Result<Option<Vec<u8>>> {
    let filename = field.file_name().unwrap_or("").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

    if filename.is_empty() && data.is_empty() {
        return Ok(None);
    }

    check_upload(&filename, data.len(), allowed_extensions, max_bytes)?;
    Ok(Some(data.to_vec()))
}

pub fn check_upload(
    filename: &str,
    size: usize,
    allowed_extensions: &[&str],
    max_bytes: usize,
) -> Result<()> {
    // Validate file size
    if size > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large (max {} MB)",
            max_bytes / (1024 * 1024)
        )));
    }

    // Extract and validate extension
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !allowed_extensions.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload() {
        assert!(check_upload("face.JPG", 1024, PHOTO_EXTENSIONS, 4096).is_ok());
        assert!(check_upload("face.bmp", 1024, PHOTO_EXTENSIONS, 4096).is_err());
        assert!(check_upload("face", 1024, PHOTO_EXTENSIONS, 4096).is_err());
        assert!(check_upload("face.png", 8192, PHOTO_EXTENSIONS, 4096).is_err());
        assert!(check_upload("roster.csv", 10, ROSTER_EXTENSIONS, 4096).is_ok());
    }
}
