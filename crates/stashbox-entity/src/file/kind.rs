//! File categorization for previews.

use serde::{Deserialize, Serialize};

/// Coarse file category derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Text,
    Code,
    Pdf,
    Document,
    Archive,
    Video,
    Audio,
    Unknown,
}

impl FileKind {
    /// Classify by a bare extension (no dot, any case).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => Self::Image,
            "txt" | "md" | "csv" | "log" => Self::Text,
            "py" | "js" | "ts" | "html" | "css" | "json" | "xml" | "yaml" | "yml" | "rs" | "sql"
            | "sh" => Self::Code,
            "pdf" => Self::Pdf,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "ods" => Self::Document,
            "zip" | "rar" | "7z" | "tar" | "gz" => Self::Archive,
            "mp4" | "avi" | "mov" | "mkv" | "webm" => Self::Video,
            "mp3" | "wav" | "ogg" | "flac" => Self::Audio,
            _ => Self::Unknown,
        }
    }

    /// Classify by file name.
    pub fn from_file_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => Self::Unknown,
        }
    }

    /// Whether an inline preview can be rendered.
    pub fn preview_available(&self) -> bool {
        matches!(self, Self::Image | Self::Text | Self::Code | Self::Pdf)
    }

    /// Get the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
            Self::Code => "code",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }
}

/// Human-readable size with one decimal, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(FileKind::from_file_name("photo.JPG"), FileKind::Image);
        assert_eq!(FileKind::from_file_name("main.rs"), FileKind::Code);
        assert_eq!(FileKind::from_file_name("Report.pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_file_name("bundle.zip"), FileKind::Archive);
        assert_eq!(FileKind::from_file_name(".bashrc"), FileKind::Unknown);
        assert_eq!(FileKind::from_file_name("README"), FileKind::Unknown);
    }

    #[test]
    fn test_preview_available() {
        assert!(FileKind::Text.preview_available());
        assert!(FileKind::Pdf.preview_available());
        assert!(!FileKind::Document.preview_available());
        assert!(!FileKind::Video.preview_available());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(16 * 1024 * 1024), "16.0 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
