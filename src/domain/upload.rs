use std::fmt;
use std::path::Path;

// Largest single file accepted by the custom upload form (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

// Design and document formats accepted for custom orders.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "stl", "obj", "3mf", "step", "stp", "iges", "igs", "dxf", "dwg", "svg", "pdf", "png", "jpg",
    "jpeg", "zip",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    UnsupportedType { extension: Option<String> },
    TooLarge { size: u64, limit: u64 },
    Empty,
}

// Why a single file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub file_name: String,
    pub reason: RejectionReason,
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectionReason::UnsupportedType {
                extension: Some(extension),
            } => write!(f, "{}: file type .{extension} is not supported", self.file_name),
            RejectionReason::UnsupportedType { extension: None } => {
                write!(f, "{}: file has no extension", self.file_name)
            }
            RejectionReason::TooLarge { size, limit } => write!(
                f,
                "{}: file is {} MB, the limit is {} MB",
                self.file_name,
                size.div_ceil(1024 * 1024),
                limit / (1024 * 1024)
            ),
            RejectionReason::Empty => write!(f, "{}: file is empty", self.file_name),
        }
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
}

// Check one file's type and size. Pure; never touches the file contents.
pub fn validate_file(file_name: &str, size: u64) -> Result<(), FileRejection> {
    let reject = |reason| FileRejection {
        file_name: file_name.to_string(),
        reason,
    };

    let extension = extension_of(file_name);
    let allowed = extension
        .as_deref()
        .is_some_and(|extension| ALLOWED_EXTENSIONS.contains(&extension));
    if !allowed {
        return Err(reject(RejectionReason::UnsupportedType { extension }));
    }

    if size == 0 {
        return Err(reject(RejectionReason::Empty));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(reject(RejectionReason::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        }));
    }

    Ok(())
}

// Validate a batch and collect every rejection so the user sees them all at once.
pub fn validate_files<'a>(
    files: impl IntoIterator<Item = (&'a str, u64)>,
) -> Result<(), Vec<FileRejection>> {
    let rejections: Vec<FileRejection> = files
        .into_iter()
        .filter_map(|(name, size)| validate_file(name, size).err())
        .collect();

    if rejections.is_empty() {
        Ok(())
    } else {
        Err(rejections)
    }
}
