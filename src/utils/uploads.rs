use uuid::Uuid;

/// Folder inside the materials bucket that holds lesson files.
pub const MATERIALS_FOLDER: &str = "lesson-materials";

/// Object path for a new material, `lesson-materials/<uuid>.<ext>`.
/// The client file name only contributes its extension.
pub fn material_path(file_name: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match file_name.and_then(extension) {
        Some(ext) => format!("{MATERIALS_FOLDER}/{id}.{ext}"),
        None => format!("{MATERIALS_FOLDER}/{id}"),
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type to store the object with, falling back to a byte stream.
pub fn material_content_type(declared: Option<&str>) -> String {
    declared
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or("application/octet-stream")
        .to_string()
}
