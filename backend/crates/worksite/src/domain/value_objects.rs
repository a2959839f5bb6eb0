//! Worksite value objects

use kernel::id::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{WorksiteError, WorksiteResult};

// ============================================================================
// Rating
// ============================================================================

/// Review score, 1 to 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    pub fn new(value: i64) -> WorksiteResult<Self> {
        if !(i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            return Err(WorksiteError::validation(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value as i16))
    }

    /// Trusted value from the database (guarded by a CHECK constraint)
    pub fn from_db(value: i16) -> Self {
        Self(value)
    }

    pub fn get(self) -> i16 {
        self.0
    }
}

// ============================================================================
// Actions & stats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkAction {
    Start,
    End,
    Review,
}

/// Completed-work counters shown with every status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ObjectStats {
    pub total_completed_works: i64,
    pub user_completed_works: i64,
}

// ============================================================================
// QR reference
// ============================================================================

/// Status page link encoded into the object's QR code
pub fn qr_reference(base_url: &str, object_id: ObjectId) -> String {
    format!("{}/object/status/{}", base_url.trim_end_matches('/'), object_id)
}

// ============================================================================
// Image upload
// ============================================================================

/// Validated image payload ready for storage
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    extension: String,
}

impl ImageUpload {
    pub fn new(
        content_type: Option<&str>,
        file_name: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> WorksiteResult<Self> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let Some(subtype) = content_type.strip_prefix("image/") else {
            return Err(WorksiteError::validation("Uploaded file must be an image"));
        };

        if bytes.is_empty() {
            return Err(WorksiteError::validation("Uploaded image is empty"));
        }
        if bytes.len() > max_bytes {
            return Err(WorksiteError::ImageTooLarge { max_bytes });
        }

        Ok(Self {
            bytes,
            extension: extension_for(subtype, file_name),
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Split into `(extension, bytes)` for handing to storage
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.extension, self.bytes)
    }
}

fn extension_for(subtype: &str, file_name: Option<&str>) -> String {
    let known = match subtype.split(';').next().unwrap_or_default().trim() {
        "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "bmp" => Some("bmp"),
        "heic" => Some("heic"),
        "tiff" => Some("tiff"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }

    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "img".to_string())
}
