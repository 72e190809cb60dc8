/// Closed set of file kinds stored on `vault_file.file_type`.
///
/// Classification never rejects an entry; anything unrecognized is
/// `Other` and is stored like everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Model,
    Document,
    Other,
}

/// Extensions treated as 3D-model content.
const MODEL_EXTENSIONS: &[&str] = &["stl", "obj", "3mf", "stp", "step"];

/// Extensions treated as document content.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

impl FileKind {
    /// Classify an entry by the extension of its sanitized name.
    pub fn from_name(name: &str) -> Self {
        let filename = name.rsplit('/').next().unwrap_or(name);
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::Other;
        };

        let ext = ext.to_ascii_lowercase();
        if MODEL_EXTENSIONS.contains(&ext.as_str()) {
            Self::Model
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Document
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}
