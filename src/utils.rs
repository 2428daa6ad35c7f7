use percent_encoding::percent_decode_str;
use url::Url;

pub const DEFAULT_FOLDER: &str = "default_folder";

/// Name of the local folder that receives the files listed at `url_str`:
/// the last non-empty path segment, or `default` when there is none.
pub fn folder_name_for_url(url_str: &str, default: &str) -> String {
    let Ok(url) = Url::parse(url_str.trim()) else {
        return default.to_string();
    };

    file_name_from_url(&url).unwrap_or_else(|| default.to_string())
}

/// Last non-empty path segment of `url`, percent-decoded and made safe for
/// use as a file name. `.` and `..` have no usable name.
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())?;
    let name = sanitize_filename(&percent_decode_str(segment).decode_utf8_lossy());
    match name.as_str() {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

/// Replaces path separators, NUL and control characters with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    filename.replace(|c: char| c == '/' || c == '\\' || c.is_control(), "_")
}
