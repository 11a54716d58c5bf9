//! Upload format detection
//!
//! Classifies an upload as PDF, CSV, or plain text from the filename and the
//! declared mime type. Pure; unknown inputs default to text so the pipeline
//! can still attempt a parse.

/// Detected file format of an uploaded statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Csv,
    Text,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Text => "text",
        }
    }

    /// Classify from filename and declared mime type.
    pub fn detect(filename: &str, mime_type: &str) -> Self {
        let name = filename.to_lowercase();
        let mime = mime_type.to_lowercase();

        if mime == "application/pdf" || name.ends_with(".pdf") {
            return Self::Pdf;
        }
        if mime == "text/csv" || name.ends_with(".csv") {
            return Self::Csv;
        }
        Self::Text
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pdf_by_mime() {
        assert_eq!(
            FileFormat::detect("statement", "application/pdf"),
            FileFormat::Pdf
        );
    }

    #[test]
    fn test_detect_pdf_by_extension() {
        assert_eq!(
            FileFormat::detect("Statement.PDF", "application/octet-stream"),
            FileFormat::Pdf
        );
    }

    #[test]
    fn test_detect_csv() {
        assert_eq!(FileFormat::detect("export.csv", ""), FileFormat::Csv);
        assert_eq!(FileFormat::detect("export", "text/csv"), FileFormat::Csv);
    }

    #[test]
    fn test_unknown_defaults_to_text() {
        assert_eq!(
            FileFormat::detect("statement.docx", "application/msword"),
            FileFormat::Text
        );
    }
}
