use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;

use crate::domain::upload::validate_files;
use crate::domain::{ApiError, FileRejection, UploadContact};
use crate::interface_adapters::gateway::{ApiGateway, RequestOptions};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no files selected")]
    NoFiles,
    #[error("{}", describe_rejections(.0))]
    Rejected(Vec<FileRejection>),
    #[error("could not read {file_name}: {source}")]
    Read {
        file_name: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn describe_rejections(rejections: &[FileRejection]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

// A file picked for upload. Size is known up front; contents are read only once
// validation has passed.
pub struct UploadFile {
    file_name: String,
    size: u64,
    source: FileSource,
}

impl UploadFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            size: bytes.len() as u64,
            source: FileSource::Bytes(bytes),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            file_name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    async fn into_part(self) -> Result<Part, UploadError> {
        let bytes = match self.source {
            FileSource::Bytes(bytes) => bytes,
            FileSource::Path(path) => {
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| UploadError::Read {
                        file_name: self.file_name.clone(),
                        source,
                    })?
            }
        };
        Ok(Part::bytes(bytes).file_name(self.file_name))
    }
}

// Custom design upload form. Staff forwarding and persistence are backend concerns.
#[derive(Clone)]
pub struct CustomFilesUseCase {
    pub gateway: Arc<ApiGateway>,
}

impl CustomFilesUseCase {
    // Validate every file locally, then send them all in one multipart request.
    #[tracing::instrument(name = "custom_upload", skip_all, fields(files = files.len()))]
    pub async fn upload(
        &self,
        files: Vec<UploadFile>,
        contact: &UploadContact,
    ) -> Result<Value, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        validate_files(files.iter().map(|file| (file.file_name(), file.size()))).map_err(
            |rejections| {
                tracing::info!(rejected = rejections.len(), "upload rejected before sending");
                UploadError::Rejected(rejections)
            },
        )?;

        let mut form = Form::new()
            .text("name", contact.name.clone())
            .text("email", contact.email.clone());
        if let Some(phone) = &contact.phone {
            form = form.text("phone", phone.clone());
        }
        if let Some(message) = &contact.message {
            form = form.text("message", message.clone());
        }
        for file in files {
            form = form.part("files", file.into_part().await?);
        }

        // Credential goes along when present; anonymous uploads are allowed.
        let receipt = self
            .gateway
            .post_multipart("/custom-files/upload", form, RequestOptions::default())
            .await?;
        tracing::info!("custom files uploaded");
        Ok(receipt)
    }
}
