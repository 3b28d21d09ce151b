//! File Commands
//!
//! Reading picked files into memory.

use wasm_bindgen_futures::JsFuture;

/// Fallback when the browser reports no type
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// A file selected in an `<input type="file">`
pub struct PickedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub async fn read_picked_file(file: web_sys::File) -> Result<PickedFile, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("failed to read {}: {:?}", file.name(), e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    let mime = file.type_();
    let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME.to_string() } else { mime };
    Ok(PickedFile { name: file.name(), mime, bytes })
}
