//! Application Configuration
//!
//! Configuration for the worksite application layer.

/// Ten mebibytes
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct WorksiteConfig {
    /// Prefix of the status link stored as the object's QR reference
    pub qr_base_url: String,
    /// Public prefix under which stored media are served
    pub media_url: String,
    /// Upload size ceiling for work images
    pub max_image_bytes: usize,
    /// Storage directory for work images
    pub image_directory: String,
}

impl Default for WorksiteConfig {
    fn default() -> Self {
        Self {
            qr_base_url: String::new(),
            media_url: "/media".to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            image_directory: "images".to_string(),
        }
    }
}

impl WorksiteConfig {
    /// Public URL of a stored media key
    pub fn media_link(&self, key: &str) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), key)
    }
}
