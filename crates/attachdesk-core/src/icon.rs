/// Icon used when a MIME type has no dedicated entry.
pub const DEFAULT_ICON: &str = "fa-file-o";

const ICONS: &[(&str, &str)] = &[
    ("application/vnd.ms-excel", "fa-file-excel-o"),
    ("text/plain", "fa-file-text-o"),
    ("image/gif", "fa-file-image-o"),
    ("image/png", "fa-file-image-o"),
    ("application/pdf", "fa-file-pdf-o"),
    ("application/x-zip-compressed", "fa-file-archive-o"),
    ("application/x-gzip", "fa-file-archive-o"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "fa-file-powerpoint-o",
    ),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "fa-file-word-o",
    ),
    ("application/octet-stream", "fa-file-o"),
    ("application/x-msdownload", "fa-file-o"),
];

/// Icon class for a MIME type. Exact match only.
pub fn for_mime(mime_type: &str) -> &'static str {
    ICONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// Short label for renderers that cannot show icon fonts.
pub fn label(icon: &str) -> &'static str {
    match icon {
        "fa-file-excel-o" => "xls",
        "fa-file-text-o" => "txt",
        "fa-file-image-o" => "img",
        "fa-file-pdf-o" => "pdf",
        "fa-file-archive-o" => "zip",
        "fa-file-powerpoint-o" => "ppt",
        "fa-file-word-o" => "doc",
        _ => "file",
    }
}
