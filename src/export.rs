use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Result;
use crate::model::Record;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Renders one record field for CSV: strings verbatim, null empty, anything
/// else as compact JSON.
fn csv_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Excel-friendly writer: UTF-8 with BOM, CRLF row terminator.
fn bom_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut file = File::create(path)?;
    file.write_all(BOM)?;
    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file))
}

fn write_row(writer: &mut csv::Writer<File>, fields: &[String], record: &Record) -> Result<()> {
    let row: Vec<String> = fields
        .iter()
        .map(|field| record.get(field).map(csv_scalar).unwrap_or_default())
        .collect();
    writer.write_record(&row)?;
    Ok(())
}

/// `album.csv`: the album mapping's keys as header, one data row.
pub fn export_album(album_path: &Path, album: &Record) -> Result<()> {
    let mut writer = bom_writer(&album_path.join("album.csv"))?;
    let fields: Vec<String> = album.keys().cloned().collect();
    writer.write_record(&fields)?;
    write_row(&mut writer, &fields, album)?;
    writer.flush()?;
    Ok(())
}

/// `comments.csv`: header from the first comment's keys, one row per comment.
/// All comments in one export are assumed to share that key set.
pub fn export_comments(album_path: &Path, comments: &[Record]) -> Result<()> {
    let mut writer = bom_writer(&album_path.join("comments.csv"))?;
    if let Some(first) = comments.first() {
        let fields: Vec<String> = first.keys().cloned().collect();
        writer.write_record(&fields)?;
        for comment in comments {
            write_row(&mut writer, &fields, comment)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// `photos.csv`, written incrementally across an album's download loop.
///
/// The header comes from the first appended photo's key order; the writer is
/// owned by one album's iteration and closed via [`PhotosExport::finish`]
/// before the next album starts.
pub struct PhotosExport {
    path: PathBuf,
    inner: Option<(csv::Writer<File>, Vec<String>)>,
}

impl PhotosExport {
    pub fn new(album_path: &Path) -> PhotosExport {
        PhotosExport {
            path: album_path.join("photos.csv"),
            inner: None,
        }
    }

    pub fn append(&mut self, photo: &Record) -> Result<()> {
        if self.inner.is_none() {
            let mut writer = bom_writer(&self.path)?;
            let fields: Vec<String> = photo.keys().cloned().collect();
            writer.write_record(&fields)?;
            self.inner = Some((writer, fields));
        }
        let (writer, fields) = self.inner.as_mut().expect("writer initialized above");
        write_row(writer, fields, photo)
    }

    pub fn finish(self) -> Result<()> {
        if let Some((mut writer, _)) = self.inner {
            writer.flush()?;
        }
        Ok(())
    }
}
