use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess a MIME type from a file name's extension, the way a browser file
/// picker fills in `File.type`. Unknown or missing extensions give
/// `application/octet-stream`.
pub fn guess(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") | Some("log") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("zip") => "application/x-zip-compressed",
        Some("gz") | Some("tgz") => "application/x-gzip",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("exe") | Some("dll") => "application/x-msdownload",
        _ => OCTET_STREAM,
    }
}
