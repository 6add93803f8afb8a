use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Coarse category of a watched file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Audio,
    Video,
    Other,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Other => "other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FileType::Text),
            "audio" => Ok(FileType::Audio),
            "video" => Ok(FileType::Video),
            "other" => Ok(FileType::Other),
            other => Err(format!("unknown file type: {}", other)),
        }
    }
}

/// Classify a path by the text after its last `.`
///
/// Matching is case-insensitive. A path without any `.` is `Other`.
pub fn classify(path: &str) -> FileType {
    let Some((_, extension)) = path.rsplit_once('.') else {
        return FileType::Other;
    };

    match extension.to_ascii_lowercase().as_str() {
        "txt" | "pdf" | "docx" => FileType::Text,
        "mp3" | "wav" | "aac" => FileType::Audio,
        "mp4" | "mkv" | "avi" => FileType::Video,
        _ => FileType::Other,
    }
}
