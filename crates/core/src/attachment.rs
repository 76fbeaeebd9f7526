use crate::error::{ChatError, IngestError};
use crate::extractor::extract_document_text;
use crate::prompt::truncate_chars;
use std::path::Path;

/// Display cap for the preview embedded in the attachment notice.
pub const PREVIEW_MAX_CHARS: usize = 1_000;

/// A supported upload, decided once at the boundary by extension. Images are
/// recorded but never analyzed.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Text { name: String, content: String },
    Code { name: String, content: String },
    Image { name: String },
    Pdf { name: String, text: String },
}

impl Attachment {
    pub fn load(path: &Path) -> Result<Attachment, ChatError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ChatError::UnsupportedAttachment(path.display().to_string()))?
            .to_string();

        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" => Ok(Attachment::Text {
                name,
                content: read_utf8(path)?,
            }),
            "py" | "rs" | "js" | "ts" | "toml" | "json" => Ok(Attachment::Code {
                name,
                content: read_utf8(path)?,
            }),
            "png" | "jpg" | "jpeg" => Ok(Attachment::Image { name }),
            "pdf" => {
                let text = extract_document_text(path).map_err(|error| match error {
                    IngestError::Io(io) => ChatError::Io(io),
                    other => ChatError::PdfParse(other.to_string()),
                })?;
                Ok(Attachment::Pdf { name, text })
            }
            _ => Err(ChatError::UnsupportedAttachment(name)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::Text { name, .. }
            | Attachment::Code { name, .. }
            | Attachment::Image { name }
            | Attachment::Pdf { name, .. } => name,
        }
    }

    /// Full text destined for prompt context. The prompt assembler applies its
    /// own cap, so nothing is truncated here.
    pub fn context_text(&self) -> String {
        match self {
            Attachment::Text { content, .. } | Attachment::Code { content, .. } => content.clone(),
            Attachment::Image { .. } => "[Image uploaded]".to_string(),
            Attachment::Pdf { text, .. } => text.clone(),
        }
    }

    /// The transcript message announcing this attachment, preview included.
    pub fn notice(&self) -> String {
        match self {
            Attachment::Text { name, content } => {
                format!("Attached file: {name}\n{}", preview(content))
            }
            Attachment::Code { name, content } => {
                format!("Attached file: {name}\n```\n{}\n```", preview(content))
            }
            Attachment::Image { name } => {
                format!("Attached file: {name}\nImage uploaded.")
            }
            Attachment::Pdf { name, text } => {
                format!("Attached file: {name}\nExtracted from PDF:\n{}", preview(text))
            }
        }
    }
}

fn read_utf8(path: &Path) -> Result<String, ChatError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| ChatError::BadEncoding(path.display().to_string()))
}

fn preview(text: &str) -> &str {
    truncate_chars(text, PREVIEW_MAX_CHARS)
}
