//! Kotatsu backup reader.
//!
//! A Kotatsu backup is a zip archive whose entries are JSON arrays:
//! `favourites` (required), `categories` and `history`. Entry names may carry
//! a `.json` extension and may sit in a subdirectory.

use std::io::{Cursor, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use zip::ZipArchive;

use super::BackupError;
use crate::ports::FileSystem;

const FAVOURITES: &str = "favourites";
const CATEGORIES: &str = "categories";
const HISTORY: &str = "history";

/// Parsed contents of a Kotatsu backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KotatsuBackup {
    /// Library entries.
    pub favourites: Vec<Favourite>,
    /// User categories.
    pub categories: Vec<Category>,
    /// Reading history.
    pub history: Vec<HistoryEntry>,
}

/// One library entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Favourite {
    /// Category the entry is filed under.
    pub category_id: Option<i64>,
    /// When the entry was added, in epoch milliseconds.
    pub created_at: Option<i64>,
    /// The manga itself. Entries without one are skipped.
    pub manga: Option<Manga>,
}

/// Manga metadata as stored by Kotatsu.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Manga {
    /// Kotatsu-side manga id, referenced by history entries.
    pub id: Option<i64>,
    /// Title.
    pub title: Option<String>,
    /// Source-relative manga URL.
    pub url: Option<String>,
    /// Absolute manga URL.
    pub public_url: Option<String>,
    /// Parser key of the source, such as `ASURASCANS`.
    pub source: Option<String>,
    /// Artist.
    pub artist: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Cover image URL.
    pub cover_url: Option<String>,
    /// Publication state, such as `ONGOING`.
    pub state: Option<String>,
    /// Genre tags.
    pub tags: Vec<Tag>,
    /// Known chapters.
    pub chapters: Vec<Chapter>,
}

/// A genre tag, written either as a bare string or as an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    /// `"Action"`.
    Name(String),
    /// `{"title": "Action", "key": "action", ...}`.
    Object {
        /// Display title.
        #[serde(default)]
        title: Option<String>,
    },
}

impl Tag {
    /// Display text, if the tag has any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            Self::Name(name) => name.as_str(),
            Self::Object { title } => title.as_deref()?,
        };
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// A chapter entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Chapter {
    /// Source-relative chapter URL.
    pub url: Option<String>,
    /// Chapter title.
    pub title: Option<String>,
    /// Older spelling of the title.
    pub name: Option<String>,
    /// Whether the chapter was read.
    pub read: Option<bool>,
    /// Upload time, in epoch milliseconds.
    pub uploaded_at: Option<i64>,
    /// Chapter number, as a number or numeric string.
    pub number: Option<serde_json::Value>,
}

impl Chapter {
    /// The chapter number, if it parses as one.
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        match self.number.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A user category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Kotatsu category id.
    #[serde(alias = "category_id")]
    pub id: Option<i64>,
    /// Display name.
    #[serde(alias = "title")]
    pub name: Option<String>,
    /// Position among categories.
    #[serde(rename = "sortKey", alias = "sort_key")]
    pub sort_key: Option<i64>,
}

/// One history record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    /// Manga the record belongs to.
    pub manga_id: Option<i64>,
    /// First read, in epoch milliseconds.
    pub created_at: Option<i64>,
    /// Last read, in epoch milliseconds.
    pub updated_at: Option<i64>,
}

/// A library entry as seen by the resolver: a source name and URL, plus the
/// payload passed through to the output untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MigrationEntry<'a> {
    /// Source name, possibly empty.
    pub source_name: &'a str,
    /// Source URL, possibly empty or relative.
    pub source_url: &'a str,
    /// The favourite this entry came from.
    pub favourite: &'a Favourite,
    /// The favourite's manga.
    pub manga: &'a Manga,
}

impl KotatsuBackup {
    /// Reads and parses a backup archive through the filesystem port.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a zip archive,
    /// lacks a `favourites` entry, or holds malformed JSON.
    pub fn read(fs: &dyn FileSystem, path: &Path) -> Result<Self, BackupError> {
        let bytes = fs.read_bytes(path).map_err(|e| BackupError::io(path, e))?;
        Self::from_zip(&bytes)
    }

    /// Parses a backup archive held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a zip archive, lacks a
    /// `favourites` entry, or holds malformed JSON.
    pub fn from_zip(bytes: &[u8]) -> Result<Self, BackupError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let favourites = read_entry(&mut archive, FAVOURITES)?
            .ok_or_else(|| BackupError::MissingEntry(FAVOURITES.into()))?;
        let categories = read_entry(&mut archive, CATEGORIES)?.unwrap_or_default();
        let history = read_entry(&mut archive, HISTORY)?.unwrap_or_default();

        let backup = Self { favourites, categories, history };
        debug!(
            favourites = backup.favourites.len(),
            categories = backup.categories.len(),
            history = backup.history.len(),
            "read Kotatsu backup"
        );
        Ok(backup)
    }

    /// One entry per favourite that carries a manga, in backup order.
    ///
    /// The source URL is the manga's public URL, falling back to its
    /// source-relative URL.
    #[must_use]
    pub fn entries(&self) -> Vec<MigrationEntry<'_>> {
        self.favourites
            .iter()
            .filter_map(|favourite| {
                let manga = favourite.manga.as_ref()?;
                let source_url = manga
                    .public_url
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .or(manga.url.as_deref())
                    .unwrap_or_default();
                Some(MigrationEntry {
                    source_name: manga.source.as_deref().unwrap_or_default(),
                    source_url,
                    favourite,
                    manga,
                })
            })
            .collect()
    }
}

/// Reads the first entry whose file name is `name` or `name.json`.
fn read_entry<T: DeserializeOwned>(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<T>, BackupError> {
    let with_ext = format!("{name}.json");
    let Some(full) = archive
        .file_names()
        .find(|full| {
            let base = full.rsplit('/').next().unwrap_or(full);
            base == name || base == with_ext
        })
        .map(str::to_owned)
    else {
        return Ok(None);
    };

    let mut file = archive.by_name(&full)?;
    let mut content = String::new();
    file.read_to_string(&mut content).map_err(zip::result::ZipError::Io)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| BackupError::Json { entry: name.into(), source })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub(crate) fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const FAVOURITES_JSON: &str = r#"[
        {"manga_id": 1, "category_id": 3, "created_at": 1700000000000, "manga": {
            "id": 1, "title": "Solo Leveling", "url": "/manga/solo",
            "public_url": "https://asuratoon.com/manga/solo", "source": "ASURASCANS",
            "state": "FINISHED", "tags": ["Action", {"title": "Fantasy", "key": "fantasy"}, {"key": "x"}],
            "chapters": [{"url": "/c/1", "name": "Ch. 1", "read": true, "number": "1.5"}]
        }},
        {"manga_id": 2, "manga": {"id": 2, "title": "Orphan", "url": "/manga/orphan", "public_url": null, "source": null}},
        {"manga_id": 3}
    ]"#;

    #[test]
    fn reads_entries_with_and_without_extension() {
        let bytes = zip_of(&[
            ("backup/favourites", FAVOURITES_JSON),
            ("categories.json", r#"[{"category_id": 3, "title": "Reading", "sort_key": 2}]"#),
            ("history", r#"[{"manga_id": 1, "created_at": 5, "updated_at": 9}]"#),
        ]);

        let backup = KotatsuBackup::from_zip(&bytes).unwrap();
        assert_eq!(backup.favourites.len(), 3);
        assert_eq!(backup.categories[0].id, Some(3));
        assert_eq!(backup.categories[0].name.as_deref(), Some("Reading"));
        assert_eq!(backup.categories[0].sort_key, Some(2));
        assert_eq!(backup.history[0].updated_at, Some(9));
    }

    #[test]
    fn entries_skip_favourites_without_manga() {
        let backup = KotatsuBackup::from_zip(&zip_of(&[("favourites.json", FAVOURITES_JSON)])).unwrap();
        let entries = backup.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source_name, "ASURASCANS");
        assert_eq!(entries[0].source_url, "https://asuratoon.com/manga/solo");
        assert_eq!(entries[1].source_name, "");
        assert_eq!(entries[1].source_url, "/manga/orphan");
    }

    #[test]
    fn tags_and_chapter_numbers_are_lenient() {
        let backup = KotatsuBackup::from_zip(&zip_of(&[("favourites", FAVOURITES_JSON)])).unwrap();
        let manga = backup.favourites[0].manga.as_ref().unwrap();

        let tags: Vec<Option<&str>> = manga.tags.iter().map(Tag::text).collect();
        assert_eq!(tags, vec![Some("Action"), Some("Fantasy"), None]);
        assert_eq!(manga.chapters[0].number(), Some(1.5));
    }

    #[test]
    fn missing_favourites_is_an_error() {
        let bytes = zip_of(&[("history", "[]")]);
        assert!(matches!(KotatsuBackup::from_zip(&bytes), Err(BackupError::MissingEntry(_))));
    }

    #[test]
    fn malformed_json_names_the_entry() {
        let bytes = zip_of(&[("favourites", "{not json")]);
        let err = KotatsuBackup::from_zip(&bytes).unwrap_err();
        assert!(err.to_string().starts_with("malformed favourites entry"));
    }

    #[test]
    fn non_zip_input_is_an_error() {
        assert!(matches!(KotatsuBackup::from_zip(b"plain text"), Err(BackupError::Zip(_))));
    }

    #[test]
    fn read_goes_through_the_filesystem_port() {
        let fs = MemoryFileSystem::new();
        fs.insert("Backup.zip", zip_of(&[("favourites", "[]")]));

        assert!(KotatsuBackup::read(&fs, Path::new("Backup.zip")).unwrap().favourites.is_empty());
        let err = KotatsuBackup::read(&fs, Path::new("Missing.zip")).unwrap_err();
        assert!(matches!(err, BackupError::Io { .. }));
    }
}
