use std::path::Path;

use serde_json::{Map, Value};
use url::Url;

use crate::input::AlbumQuery;

/// One API entity (album, photo or comment) kept as the ordered field mapping
/// the server returned. Only a handful of fields are read directly; the rest
/// flow untouched into the CSV exports.
pub type Record = Map<String, Value>;

pub fn album_title(album: &Record) -> &str {
    album.get("title").and_then(Value::as_str).unwrap_or("")
}

pub fn album_size(album: &Record) -> u64 {
    album.get("size").and_then(Value::as_u64).unwrap_or(0)
}

pub fn photo_id(photo: &Record) -> Option<i64> {
    photo.get("id").and_then(Value::as_i64)
}

/// Picks the download URL of the largest size variant by width.
///
/// A zero width on the first variant means the server did not rank the sizes;
/// in that case the last listed variant is taken instead of comparing.
pub fn best_size_url(photo: &Record) -> Option<&str> {
    let sizes = photo.get("sizes").and_then(Value::as_array)?;
    let first = sizes.first()?;
    if variant_width(first) == 0 {
        return variant_url(sizes.last()?);
    }

    let mut best_width = variant_width(first);
    let mut best_url = variant_url(first);
    for size in sizes {
        if variant_width(size) > best_width {
            best_width = variant_width(size);
            best_url = variant_url(size);
        }
    }
    best_url
}

fn variant_width(size: &Value) -> i64 {
    size.get("width").and_then(Value::as_i64).unwrap_or(0)
}

fn variant_url(size: &Value) -> Option<&str> {
    size.get("url").and_then(Value::as_str)
}

/// Extension of the file the URL points at, dot included, query string
/// stripped. Empty when the path has no extension.
pub fn file_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split('?').next().unwrap_or("").to_string(),
    };
    match Path::new(&path).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    }
}

const ILLEGAL_TITLE_CHARS: [char; 9] = ['/', '|', ':', '?', '<', '>', '*', '"', '\\'];

/// Makes an album title safe for a directory name: trailing whitespace
/// trimmed, filesystem-hostile characters replaced with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .trim_end()
        .chars()
        .map(|c| if ILLEGAL_TITLE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Directory name for one album: `[<owner_id>]-[<album_id>] <sanitized title>`.
pub fn album_dir_name(query: &AlbumQuery, title: &str) -> String {
    format!(
        "[{}]-[{}] {}",
        query.owner_id,
        query.album_id,
        sanitize_title(title)
    )
}
