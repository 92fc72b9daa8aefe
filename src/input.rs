use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::output::Sink;

/// Account credentials read from the user-data file.
///
/// Consumed by value during authentication so the login and password drop out
/// of memory once the session token is established.
#[derive(Debug)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// One resolved album to download. Both ids are kept as the literal digit
/// strings captured from the URL, signs included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumQuery {
    pub owner_id: String,
    pub album_id: String,
}

static ALBUM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://vk\.com/album(-?\d+)_(\d+)$").expect("album URL regex is valid")
});

/// Service albums (wall, profile, saved photos) addressed by reserved aliases.
const SERVICE_IDS: [(&str, &str); 3] = [("0", "-6"), ("00", "-7"), ("000", "-15")];

/// Validates one album link and extracts its ids, remapping service aliases.
pub fn resolve_album_url(url: &str) -> Result<AlbumQuery> {
    let captures = ALBUM_URL
        .captures(url)
        .ok_or_else(|| Error::BadAlbumUrl(url.to_string()))?;
    let owner_id = captures[1].to_string();
    let album_id = &captures[2];
    let album_id = SERVICE_IDS
        .iter()
        .find(|(alias, _)| *alias == album_id)
        .map(|(_, id)| id.to_string())
        .unwrap_or_else(|| album_id.to_string());
    Ok(AlbumQuery { owner_id, album_id })
}

fn read_lines(path: &Path, guidance: &'static str) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::InputFile {
        path: path.to_path_buf(),
        source,
        guidance,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads the first two non-empty lines of the user-data file as
/// (login, password).
pub fn read_credentials(path: &Path) -> Result<Credentials> {
    let lines = read_lines(path, "please, fix the file name or either path to it")?;
    let mut lines = lines.into_iter();
    match (lines.next(), lines.next()) {
        (Some(login), Some(password)) => Ok(Credentials { login, password }),
        _ => Err(Error::ShortCredentials),
    }
}

/// Reads the albums-list file and resolves each line.
///
/// A line that fails validation is reported through the sink and dropped;
/// order and duplicates of the remaining lines are preserved.
pub fn read_queries(path: &Path, sink: &mut Sink) -> Result<Vec<AlbumQuery>> {
    let mut queries = Vec::new();
    for line in read_lines(path, "please, fix the file name either in the folder or in the script")? {
        match resolve_album_url(&line) {
            Ok(query) => queries.push(query),
            Err(e) => sink.line(&e.to_string())?,
        }
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn resolves_plain_album_url() {
        let query = resolve_album_url("https://vk.com/album-100_5").unwrap();
        assert_eq!(query.owner_id, "-100");
        assert_eq!(query.album_id, "5");
    }

    #[test]
    fn keeps_positive_owner_and_long_ids_verbatim() {
        let query = resolve_album_url("https://vk.com/album12345_289371923").unwrap();
        assert_eq!(query.owner_id, "12345");
        assert_eq!(query.album_id, "289371923");
    }

    #[test]
    fn remaps_service_album_aliases() {
        for (alias, id) in [("0", "-6"), ("00", "-7"), ("000", "-15")] {
            let url = format!("https://vk.com/album-1_{alias}");
            let query = resolve_album_url(&url).unwrap();
            assert_eq!(query.album_id, id, "alias {alias}");
        }
    }

    #[test]
    fn four_zeroes_is_a_literal_album_id() {
        let query = resolve_album_url("https://vk.com/album-1_0000").unwrap();
        assert_eq!(query.album_id, "0000");
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "https://vk.com/album5",
            "https://vk.com/album_5",
            "http://vk.com/album-1_5",
            "https://vk.com/album-1_5/extra",
            "https://vk.com/album-1_-5",
            "not a url",
        ] {
            let err = resolve_album_url(url).unwrap_err();
            assert!(err.to_string().contains(url), "error names the url");
        }
    }

    #[test]
    fn credentials_come_from_first_two_nonempty_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\n  user@example.com  \n\npassword123\nignored").unwrap();
        let credentials = read_credentials(file.path()).unwrap();
        assert_eq!(credentials.login, "user@example.com");
        assert_eq!(credentials.password, "password123");
    }

    #[test]
    fn single_line_credentials_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user@example.com").unwrap();
        assert!(matches!(
            read_credentials(file.path()),
            Err(Error::ShortCredentials)
        ));
    }

    #[test]
    fn missing_credentials_file_carries_os_error() {
        let err = read_credentials(Path::new("no/such/data.txt")).unwrap_err();
        assert!(err.exit_code() != 0);
        match err {
            Error::InputFile { guidance, .. } => {
                assert_eq!(guidance, "please, fix the file name or either path to it");
            }
            other => panic!("expected input-file error, got {other:?}"),
        }
    }

    #[test]
    fn missing_albums_list_carries_its_own_guidance() {
        let mut sink = Sink::console();
        let err = read_queries(Path::new("no/such/albums_list.txt"), &mut sink).unwrap_err();
        match err {
            Error::InputFile { guidance, .. } => {
                assert_eq!(
                    guidance,
                    "please, fix the file name either in the folder or in the script"
                );
            }
            other => panic!("expected input-file error, got {other:?}"),
        }
    }

    #[test]
    fn bad_lines_are_skipped_not_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "https://vk.com/album-1_2\nhttps://vk.com/not_an_album\nhttps://vk.com/album3_4"
        )
        .unwrap();
        let mut sink = Sink::console();
        let queries = read_queries(file.path(), &mut sink).unwrap();
        assert_eq!(
            queries,
            vec![
                AlbumQuery {
                    owner_id: "-1".into(),
                    album_id: "2".into()
                },
                AlbumQuery {
                    owner_id: "3".into(),
                    album_id: "4".into()
                },
            ]
        );
    }
}
