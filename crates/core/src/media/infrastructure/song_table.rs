use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::media::domain::media_resolver::{MediaRef, MediaResolver, ResolverError};
use crate::shared::emotion::{Emotion, Mood};

pub const DEFAULT_RECOMMENDATIONS: usize = 7;

#[derive(Error, Debug)]
pub enum SongTableError {
    #[error("failed to read song table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse song table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("song table has no rows")]
    Empty,
}

/// One CSV record. Columns other than these four are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongRow {
    #[serde(rename = "Song Title")]
    pub title: String,
    #[serde(rename = "Emotion", deserialize_with = "emotion_label")]
    pub emotion: Emotion,
    #[serde(rename = "level_of_emotion")]
    pub level: u8,
    #[serde(rename = "YouTube Link")]
    pub url: String,
}

fn emotion_label<'de, D>(deserializer: D) -> Result<Emotion, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    label.parse().map_err(serde::de::Error::custom)
}

/// Static song list queried by nearest neighbour over `(emotion code, level)`.
///
/// Emotion codes are the alphabetical rank of the labels present in the
/// table, so a table without "Disgust" numbers "Fear" as 1.
#[derive(Debug, Clone)]
pub struct SongTable {
    rows: Vec<SongRow>,
    codes: [Option<u8>; Emotion::ALL.len()],
    recommendations: usize,
}

impl SongTable {
    /// Load a CSV with `Song Title`, `Emotion`, `level_of_emotion` and
    /// `YouTube Link` columns.
    pub fn load(path: &Path) -> Result<Self, SongTableError> {
        let file = File::open(path).map_err(|source| SongTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rows = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file)
            .deserialize()
            .collect::<Result<Vec<SongRow>, _>>()
            .map_err(|source| SongTableError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Loaded {} songs from {}", rows.len(), path.display());
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<SongRow>) -> Result<Self, SongTableError> {
        if rows.is_empty() {
            return Err(SongTableError::Empty);
        }
        Ok(Self {
            codes: label_codes(&rows),
            rows,
            recommendations: DEFAULT_RECOMMENDATIONS,
        })
    }

    /// Number of rows returned by [`MediaResolver::resolve`].
    pub fn with_recommendations(mut self, k: usize) -> Self {
        self.recommendations = k.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Code of `emotion` within this table, `None` when no row carries it.
    pub fn code(&self, emotion: Emotion) -> Option<u8> {
        self.codes[emotion.code() as usize]
    }

    /// The `k` rows closest to `mood`, nearest first. Equal distances keep
    /// table order. An emotion the table has never seen yields the first
    /// `k` rows.
    pub fn recommend(&self, mood: Mood, k: usize) -> Vec<&SongRow> {
        let Some(code) = self.code(mood.emotion) else {
            log::warn!("No songs labelled {}, using table order", mood.emotion);
            return self.rows.iter().take(k).collect();
        };
        let target = (code as f64, mood.level as f64);
        let mut ranked: Vec<(f64, &SongRow)> = self
            .rows
            .iter()
            .map(|row| {
                let de = self.code(row.emotion).unwrap_or_default() as f64 - target.0;
                let dl = row.level as f64 - target.1;
                ((de * de + dl * dl).sqrt(), row)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().take(k).map(|(_, row)| row).collect()
    }
}

fn label_codes(rows: &[SongRow]) -> [Option<u8>; Emotion::ALL.len()] {
    let mut present: Vec<Emotion> = rows.iter().map(|row| row.emotion).collect();
    present.sort_by_key(|emotion| emotion.label());
    present.dedup();

    let mut codes = [None; Emotion::ALL.len()];
    for (rank, emotion) in present.into_iter().enumerate() {
        codes[emotion.code() as usize] = Some(rank as u8);
    }
    codes
}

impl MediaResolver for SongTable {
    fn resolve(&self, mood: Mood) -> Result<Vec<MediaRef>, ResolverError> {
        let picks = self.recommend(mood, self.recommendations);
        if picks.is_empty() {
            return Err(ResolverError::Table(format!("no songs for {mood}")));
        }
        Ok(picks
            .into_iter()
            .map(|row| MediaRef::new(row.url.clone()).with_title(row.title.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Song Title,Emotion,level_of_emotion,YouTube Link\n";

    fn row(title: &str, emotion: Emotion, level: u8) -> SongRow {
        SongRow {
            title: title.into(),
            emotion,
            level,
            url: format!("https://example.com/{title}"),
        }
    }

    fn table() -> SongTable {
        SongTable::from_rows(vec![
            row("sunny", Emotion::Happy, 90),
            row("mellow", Emotion::Happy, 70),
            row("rain", Emotion::Sad, 70),
            row("storm", Emotion::Angry, 80),
            row("calm", Emotion::Neutral, 50),
        ])
        .unwrap()
    }

    fn csv_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{HEADER}{body}").unwrap();
        file
    }

    #[test]
    fn test_codes_follow_alphabetical_label_rank() {
        let all = SongTable::from_rows(
            Emotion::ALL
                .iter()
                .map(|&e| row(e.label(), e, 50))
                .collect(),
        )
        .unwrap();
        let expected = [
            (Emotion::Angry, 0),
            (Emotion::Disgust, 1),
            (Emotion::Fear, 2),
            (Emotion::Happy, 3),
            (Emotion::Neutral, 4),
            (Emotion::Sad, 5),
            (Emotion::Surprise, 6),
        ];
        for (emotion, code) in expected {
            assert_eq!(all.code(emotion), Some(code), "{emotion}");
        }
    }

    #[test]
    fn test_codes_only_count_present_labels() {
        let table = table();
        assert_eq!(table.code(Emotion::Angry), Some(0));
        assert_eq!(table.code(Emotion::Happy), Some(1));
        assert_eq!(table.code(Emotion::Neutral), Some(2));
        assert_eq!(table.code(Emotion::Sad), Some(3));
        assert_eq!(table.code(Emotion::Fear), None);
    }

    #[test]
    fn test_sad_is_nearer_neutral_than_happy() {
        let table = SongTable::from_rows(vec![
            row("happy", Emotion::Happy, 50),
            row("neutral", Emotion::Neutral, 50),
        ])
        .unwrap();
        let picks = table.recommend(Mood::new(Emotion::Sad, 50), 1);
        assert_eq!(picks[0].title, "neutral");
    }

    #[test]
    fn test_recommend_orders_by_distance() {
        let table = table();
        let picks = table.recommend(Mood::new(Emotion::Happy, 85), 2);
        let titles: Vec<&str> = picks.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["sunny", "mellow"]);
    }

    #[test]
    fn test_recommend_caps_at_table_size() {
        assert_eq!(table().recommend(Mood::default(), 50).len(), 5);
    }

    #[test]
    fn test_unseen_emotion_uses_table_order() {
        let picks = table().recommend(Mood::new(Emotion::Surprise, 90), 2);
        let titles: Vec<&str> = picks.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["sunny", "mellow"]);
    }

    #[test]
    fn test_resolve_returns_titled_refs() {
        let media = table()
            .with_recommendations(1)
            .resolve(Mood::new(Emotion::Sad, 65))
            .unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].title.as_deref(), Some("rain"));
        assert_eq!(media[0].url, "https://example.com/rain");
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(matches!(
            SongTable::from_rows(vec![]),
            Err(SongTableError::Empty)
        ));
    }

    #[test]
    fn test_load_csv() {
        let file = csv_file(
            "Walking on Sunshine,Happy,95,https://example.com/ws\n\
             \"Mad World, Remastered\", sad ,20,https://example.com/mw\n",
        );

        let table = SongTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let picks = table.recommend(Mood::new(Emotion::Sad, 25), 1);
        assert_eq!(picks[0].title, "Mad World, Remastered");
        assert_eq!(picks[0].emotion, Emotion::Sad);
    }

    #[test]
    fn test_load_ignores_extra_columns() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "Song Title,Artist,Emotion,level_of_emotion,YouTube Link\n\
             Happy,Pharrell,Happy,90,https://example.com/happy\n"
        )
        .unwrap();

        let table = SongTable::load(file.path()).unwrap();
        assert_eq!(table.recommend(Mood::default(), 1)[0].title, "Happy");
    }

    #[test]
    fn test_load_header_only_is_empty() {
        let file = csv_file("");
        assert!(matches!(
            SongTable::load(file.path()),
            Err(SongTableError::Empty)
        ));
    }

    #[test]
    fn test_load_rejects_bad_level() {
        let file = csv_file("Loud,Angry,very,https://example.com/loud\n");
        assert!(matches!(
            SongTable::load(file.path()),
            Err(SongTableError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_rejects_unknown_emotion() {
        let file = csv_file("Yawn,Bored,40,https://example.com/yawn\n");
        let err = SongTable::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown emotion label: Bored"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SongTable::load(Path::new("/nonexistent/songs.csv")),
            Err(SongTableError::Read { .. })
        ));
    }
}
