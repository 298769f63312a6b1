use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "media_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
    Text,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "heic"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "3gp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "flac", "opus"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", "zip", "rar",
];

impl MediaType {
    /// Classifies an attachment URL or file name by its extension.
    /// Query strings and fragments are ignored; anything unrecognised is `Text`.
    pub fn from_media(media: &str) -> MediaType {
        let path = media
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or_default();

        let extension = match file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return MediaType::Text,
        };

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Video
        } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Audio
        } else if DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Document
        } else {
            MediaType::Text
        }
    }

    /// Label shown in conversation previews in place of the message text.
    pub fn preview_label(&self) -> Option<&'static str> {
        match self {
            MediaType::Image => Some("Photo"),
            MediaType::Video => Some("Video"),
            MediaType::Audio => Some("Audio"),
            MediaType::Document => Some("Document"),
            MediaType::Text => None,
        }
    }
}

/// Computes the `(media_type, preview_text)` pair stored on the conversation.
pub fn message_preview(text: Option<&str>, media: Option<&str>) -> (MediaType, String) {
    let media_type = media
        .filter(|m| !m.trim().is_empty())
        .map(MediaType::from_media)
        .unwrap_or(MediaType::Text);

    let preview = match media_type.preview_label() {
        Some(label) => label.to_string(),
        None => text.unwrap_or_default().to_string(),
    };

    (media_type, preview)
}
