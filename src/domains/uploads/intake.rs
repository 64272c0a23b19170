//! Multipart intake.
//!
//! Streams file parts into the staging area while enforcing the route's
//! discipline, and collects the remaining text parts as option values.

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::discipline::UploadDiscipline;
use super::error::UploadError;
use super::staging::{StagedFile, StagedUpload};

/// Read the whole multipart body.
///
/// Files land in `staged`; text fields are returned by name. Everything is
/// validated against `discipline` before any capability sees it.
pub async fn receive(
    mut multipart: Multipart,
    discipline: &UploadDiscipline,
    staged: &mut StagedUpload,
) -> Result<HashMap<String, String>, UploadError> {
    let max_bytes = discipline.max_file_bytes();
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_none() && name != discipline.field_name() {
            let value = field
                .text()
                .await
                .map_err(|e| UploadError::from_multipart(e, max_bytes))?;
            fields.insert(name, value);
            continue;
        }

        if name != discipline.field_name() {
            return Err(UploadError::Malformed(format!(
                "unexpected file field '{}', expected '{}'",
                name,
                discipline.field_name()
            )));
        }

        if staged.files().len() >= discipline.max_files() {
            return Err(UploadError::TooManyFiles {
                max: discipline.max_files(),
            });
        }

        discipline.accepts(field.content_type())?;
        stage_field(field, max_bytes, staged).await?;
    }

    if staged.files().is_empty() {
        return Err(UploadError::MissingFile {
            field: discipline.field_name(),
        });
    }

    Ok(fields)
}

async fn stage_field(
    mut field: Field<'_>,
    max_bytes: u64,
    staged: &mut StagedUpload,
) -> Result<(), UploadError> {
    let original_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let (path, mut file) = staged.create(original_name.as_deref()).await?;

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| UploadError::from_multipart(e, max_bytes))?
    {
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(UploadError::PayloadTooLarge { max_bytes });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(
        "Staged {:?} ({} bytes) at {}",
        original_name,
        size,
        path.display()
    );

    staged.push(StagedFile {
        path,
        original_name,
        content_type,
        size,
    });
    Ok(())
}
