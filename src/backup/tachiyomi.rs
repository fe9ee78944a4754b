//! Tachiyomi backup writer.
//!
//! Builds the importing app's backup document (`backupManga`,
//! `backupCategories`, `backupSources`) and writes it as JSON. Every distinct
//! source id is declared exactly once, in the order it is first referenced.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::kotatsu::{Category, Chapter, HistoryEntry, KotatsuBackup, Manga, Tag};
use super::BackupError;
use crate::ports::FileSystem;
use crate::resolve::Resolution;

/// Status code for a series still publishing.
pub const STATUS_ONGOING: i32 = 1;
/// Status code for a finished series.
pub const STATUS_COMPLETED: i32 = 2;
/// Status code when the state is unknown.
pub const STATUS_UNKNOWN: i32 = 0;

/// The complete output document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TachiyomiBackup {
    /// Library entries.
    pub backup_manga: Vec<BackupManga>,
    /// User categories.
    pub backup_categories: Vec<BackupCategory>,
    /// One declaration per distinct source id.
    pub backup_sources: Vec<BackupSource>,
}

/// A library entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManga {
    /// Source id.
    pub source: i64,
    /// Source-relative manga URL.
    pub url: String,
    /// Title.
    pub title: String,
    /// Artist.
    pub artist: String,
    /// Author.
    pub author: String,
    /// Description.
    pub description: String,
    /// Genre tags.
    pub genre: Vec<String>,
    /// One of the `STATUS_*` codes.
    pub status: i32,
    /// Cover image URL.
    pub thumbnail_url: String,
    /// When the entry was added, in epoch milliseconds.
    pub date_added: i64,
    /// Chapters.
    pub chapters: Vec<BackupChapter>,
    /// Orders of the categories the entry is filed under.
    pub categories: Vec<i64>,
    /// Reading history.
    pub history: Vec<BackupHistory>,
}

/// A chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupChapter {
    /// Source-relative chapter URL.
    pub url: String,
    /// Chapter title.
    pub name: String,
    /// Scanlator credit.
    pub scanlator: String,
    /// Whether the chapter was read.
    pub read: bool,
    /// Whether the chapter is bookmarked.
    pub bookmark: bool,
    /// Last page read.
    pub last_page_read: i64,
    /// When the chapter was fetched, in epoch milliseconds.
    pub date_fetch: i64,
    /// When the chapter was uploaded, in epoch milliseconds.
    pub date_upload: i64,
    /// Chapter number, `-1` when unknown.
    pub chapter_number: f64,
    /// Position in the source's chapter list.
    pub source_order: i64,
}

/// A user category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupCategory {
    /// Display name.
    pub name: String,
    /// Sort position.
    pub order: i64,
    /// Display flags.
    pub flags: i64,
}

/// A source declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSource {
    /// Source id.
    pub source_id: i64,
    /// Source display name.
    pub name: String,
}

/// A reading-history record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupHistory {
    /// Manga URL the record belongs to.
    pub url: String,
    /// Last read, in epoch milliseconds.
    pub last_read: i64,
    /// Time spent reading, in milliseconds.
    pub read_duration: i64,
}

impl TachiyomiBackup {
    /// Converts a Kotatsu backup using one resolution per
    /// [`KotatsuBackup::entries`] item, in the same order.
    ///
    /// `fetched_at` stamps every chapter's fetch date, and stands in for a
    /// missing upload date.
    #[must_use]
    pub fn convert(source: &KotatsuBackup, resolutions: &[Resolution], fetched_at: DateTime<Utc>) -> Self {
        let fetched_ms = fetched_at.timestamp_millis();
        let category_orders = category_orders(&source.categories);
        let last_read = last_read_by_manga(&source.history);

        let mut declared = BTreeSet::new();
        let mut backup = Self {
            backup_categories: source
                .categories
                .iter()
                .zip(0_i64..)
                .map(|(category, index)| BackupCategory {
                    name: category.name.clone().unwrap_or_default(),
                    order: category.sort_key.unwrap_or(index),
                    flags: 0,
                })
                .collect(),
            ..Self::default()
        };

        for (entry, resolution) in source.entries().into_iter().zip(resolutions) {
            if declared.insert(resolution.id) {
                backup
                    .backup_sources
                    .push(BackupSource { source_id: resolution.id, name: resolution.name.clone() });
            }

            let manga = entry.manga;
            let url = text(manga.url.as_ref());
            let history = manga
                .id
                .and_then(|id| last_read.get(&id))
                .map(|&time| BackupHistory { url: url.clone(), last_read: time, read_duration: 0 })
                .into_iter()
                .collect();

            backup.backup_manga.push(BackupManga {
                source: resolution.id,
                url,
                title: text(manga.title.as_ref()),
                artist: text(manga.artist.as_ref()),
                author: text(manga.author.as_ref()),
                description: text(manga.description.as_ref()),
                genre: manga.tags.iter().filter_map(Tag::text).map(str::to_string).collect(),
                status: status_code(manga),
                thumbnail_url: text(manga.cover_url.as_ref()),
                date_added: entry.favourite.created_at.unwrap_or(0),
                chapters: manga
                    .chapters
                    .iter()
                    .zip(0_i64..)
                    .map(|(chapter, order)| convert_chapter(chapter, order, fetched_ms))
                    .collect(),
                categories: entry
                    .favourite
                    .category_id
                    .and_then(|id| category_orders.get(&id).copied())
                    .into_iter()
                    .collect(),
                history,
            });
        }
        backup
    }

    /// Serialises the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, BackupError> {
        serde_json::to_vec_pretty(self)
            .map_err(|source| BackupError::Json { entry: "output".into(), source })
    }

    /// Writes the document through the filesystem port.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn write(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), BackupError> {
        fs.write(path, &self.to_json()?).map_err(|e| BackupError::io(path, e))
    }
}

fn text(value: Option<&String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn status_code(manga: &Manga) -> i32 {
    match manga.state.as_deref().map(str::to_uppercase).as_deref() {
        Some("ONGOING") => STATUS_ONGOING,
        Some("FINISHED" | "COMPLETED") => STATUS_COMPLETED,
        _ => STATUS_UNKNOWN,
    }
}

fn convert_chapter(chapter: &Chapter, order: i64, fetched_ms: i64) -> BackupChapter {
    BackupChapter {
        url: text(chapter.url.as_ref()),
        name: text(chapter.title.as_ref().or(chapter.name.as_ref())),
        scanlator: String::new(),
        read: chapter.read.unwrap_or(false),
        bookmark: false,
        last_page_read: 0,
        date_fetch: fetched_ms,
        date_upload: chapter.uploaded_at.filter(|t| *t > 0).unwrap_or(fetched_ms),
        chapter_number: chapter.number().unwrap_or(-1.0),
        source_order: order,
    }
}

/// Kotatsu category id to output category order.
fn category_orders(categories: &[Category]) -> BTreeMap<i64, i64> {
    categories
        .iter()
        .zip(0_i64..)
        .filter_map(|(category, index)| Some((category.id?, category.sort_key.unwrap_or(index))))
        .collect()
}

/// Latest read time per manga id, from `updated_at` or else `created_at`.
fn last_read_by_manga(history: &[HistoryEntry]) -> BTreeMap<i64, i64> {
    let mut latest = BTreeMap::new();
    for entry in history {
        let (Some(manga_id), Some(time)) = (entry.manga_id, entry.updated_at.or(entry.created_at))
        else {
            continue;
        };
        if time <= 0 {
            continue;
        }
        latest.entry(manga_id).and_modify(|t: &mut i64| *t = (*t).max(time)).or_insert(time);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::backup::kotatsu::tests::zip_of;
    use crate::resolve::Tier;
    use chrono::TimeZone;

    const FAVOURITES: &str = r#"[
        {"category_id": 10, "created_at": 1700000000000, "manga": {
            "id": 1, "title": " Solo Leveling ", "url": "/manga/solo", "source": "ASURASCANS",
            "state": "finished", "tags": [{"title": "Action"}, ""],
            "chapters": [
                {"url": "/c/1", "title": "Ch. 1", "read": true, "number": 1, "uploaded_at": 1600000000000},
                {"url": "/c/2", "name": "Ch. 2"}
            ]
        }},
        {"category_id": 99, "manga": {"id": 2, "title": "Second", "url": "/manga/two", "source": "ASURASCANS", "state": "ONGOING"}},
        {"manga": {"id": 3, "title": "Third", "url": "/manga/three", "source": "MYSTERY", "state": "PAUSED"}}
    ]"#;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn resolution(id: i64, name: &str) -> Resolution {
        Resolution { id, name: name.into(), tier: Tier::Alias }
    }

    fn backup() -> KotatsuBackup {
        KotatsuBackup::from_zip(&zip_of(&[
            ("favourites", FAVOURITES),
            ("categories", r#"[{"id": 10, "name": "Reading", "sortKey": 5}, {"id": 11, "name": "Later"}]"#),
            ("history", r#"[
                {"manga_id": 1, "created_at": 100, "updated_at": 300},
                {"manga_id": 1, "created_at": 200},
                {"manga_id": 2, "created_at": 0}
            ]"#),
        ]))
        .unwrap()
    }

    fn converted() -> TachiyomiBackup {
        let resolutions =
            [resolution(42, "Asura Comic"), resolution(42, "Asura Comic"), resolution(-7, "MYSTERY")];
        TachiyomiBackup::convert(&backup(), &resolutions, fetched_at())
    }

    #[test]
    fn shared_source_is_declared_once() {
        let out = converted();
        assert_eq!(
            out.backup_sources,
            vec![
                BackupSource { source_id: 42, name: "Asura Comic".into() },
                BackupSource { source_id: -7, name: "MYSTERY".into() },
            ]
        );
        let sources: Vec<i64> = out.backup_manga.iter().map(|m| m.source).collect();
        assert_eq!(sources, vec![42, 42, -7]);
    }

    #[test]
    fn manga_fields_are_mapped() {
        let out = converted();
        let solo = &out.backup_manga[0];
        assert_eq!(solo.title, "Solo Leveling");
        assert_eq!(solo.status, STATUS_COMPLETED);
        assert_eq!(solo.genre, vec!["Action"]);
        assert_eq!(solo.date_added, 1_700_000_000_000);
        assert_eq!(solo.categories, vec![5]);
        assert_eq!(solo.history, vec![BackupHistory { url: "/manga/solo".into(), last_read: 300, read_duration: 0 }]);

        assert_eq!(out.backup_manga[1].status, STATUS_ONGOING);
        assert!(out.backup_manga[1].categories.is_empty());
        assert!(out.backup_manga[1].history.is_empty());
        assert_eq!(out.backup_manga[2].status, STATUS_UNKNOWN);
        assert_eq!(out.backup_manga[2].date_added, 0);
    }

    #[test]
    fn chapters_default_missing_fields() {
        let out = converted();
        let chapters = &out.backup_manga[0].chapters;
        let fetched = fetched_at().timestamp_millis();

        assert_eq!(chapters[0].name, "Ch. 1");
        assert!(chapters[0].read);
        assert!((chapters[0].chapter_number - 1.0).abs() < f64::EPSILON);
        assert_eq!(chapters[0].date_upload, 1_600_000_000_000);
        assert_eq!(chapters[0].date_fetch, fetched);

        assert_eq!(chapters[1].name, "Ch. 2");
        assert!(!chapters[1].read);
        assert!((chapters[1].chapter_number + 1.0).abs() < f64::EPSILON);
        assert_eq!(chapters[1].date_upload, fetched);
        assert_eq!(chapters[1].source_order, 1);
    }

    #[test]
    fn categories_keep_sort_key_or_position() {
        let out = converted();
        assert_eq!(
            out.backup_categories,
            vec![
                BackupCategory { name: "Reading".into(), order: 5, flags: 0 },
                BackupCategory { name: "Later".into(), order: 1, flags: 0 },
            ]
        );
    }

    #[test]
    fn written_document_uses_camel_case_keys() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("output/Backup.tachiyomi.json");
        converted().write(&fs, path).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&fs.get(path).unwrap()).unwrap();
        assert_eq!(json["backupSources"][0]["sourceId"], 42);
        assert_eq!(json["backupManga"][0]["thumbnailUrl"], "");
        assert_eq!(json["backupManga"][0]["chapters"][0]["dateUpload"], 1_600_000_000_000_i64);
        assert_eq!(json["backupCategories"][1]["order"], 1);
    }
}
