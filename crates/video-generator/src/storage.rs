//! URLs for videos kept in external file storage.

const FILE_BASE: &str = "https://drive.google.com/file/d";
const THUMBNAIL_BASE: &str = "https://drive.google.com/thumbnail";

/// Embeddable preview page for a stored file
pub fn preview_url(storage_id: &str) -> String {
    format!("{}/{}/preview", FILE_BASE, storage_id)
}

/// URL used as the video source; the preview page doubles as the player
pub fn direct_url(storage_id: &str) -> String {
    preview_url(storage_id)
}

/// 800x450 thumbnail of a stored file
pub fn thumbnail_url(storage_id: &str) -> String {
    format!("{}?id={}&sz=w800-h450", THUMBNAIL_BASE, storage_id)
}
