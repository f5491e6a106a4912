//! Core data models for Spotify-to-Plex matching.
//!
//! This module contains the struct definitions and enums shared by the
//! matcher, the search cascade and the playlist sync.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Matching Models
// ============================================================================

/// Spotify-sourced text being looked for in the Plex library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTarget {
    pub title: String,
    pub artist: String,
}

impl SearchTarget {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// Plex library entry returned by a search. Only title and artist are scored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTrack {
    #[serde(default)]
    pub id: String, // Plex ratingKey
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String, // Grandparent (album artist) title in Plex
    #[serde(default)]
    pub album: String,
}

impl CandidateTrack {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }
}

/// How a track was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TitleArtist,
    None,
}

/// Result of one match attempt: the chosen track, if any, and how.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub track: Option<CandidateTrack>,
    pub match_type: MatchType,
}

impl MatchOutcome {
    pub fn matched(track: CandidateTrack) -> Self {
        Self {
            track: Some(track),
            match_type: MatchType::TitleArtist,
        }
    }

    pub fn no_match() -> Self {
        Self {
            track: None,
            match_type: MatchType::None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.track.is_some()
    }
}

/// Search strategies, in the order the cascade tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    ExactTitleArtist,
    SingleQuoteVariations,
    BracketsRemoved,
    FeaturingRemoved,
    ArtistFeaturingRemoved,
    NormalizedTitle,
    WithRemoved,
    SuffixesRemoved,
    AccentsNormalized,
    FullLibrary,
}

impl SearchStrategy {
    pub fn label(self) -> &'static str {
        match self {
            SearchStrategy::ExactTitleArtist => "exact title/artist",
            SearchStrategy::SingleQuoteVariations => "single quote variations",
            SearchStrategy::BracketsRemoved => "brackets removed",
            SearchStrategy::FeaturingRemoved => "featuring removed",
            SearchStrategy::ArtistFeaturingRemoved => "artist featuring removed",
            SearchStrategy::NormalizedTitle => "normalized title",
            SearchStrategy::WithRemoved => "'with' removed",
            SearchStrategy::SuffixesRemoved => "suffixes removed",
            SearchStrategy::AccentsNormalized => "accents normalized",
            SearchStrategy::FullLibrary => "full library scan",
        }
    }
}

// ============================================================================
// Spotify Models
// ============================================================================

/// Track from a Spotify playlist export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub id: String, // Spotify track ID (e.g., "2takcwOaAZWiXQijPHIx7B")
    pub name: String,
    pub artist: String, // Primary artist
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub isrc: Option<String>,
}

impl SourceTrack {
    pub fn target(&self) -> SearchTarget {
        SearchTarget::new(self.name.as_str(), self.artist.as_str())
    }
}

/// Spotify playlist export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tracks: Vec<SourceTrack>,
}

// ============================================================================
// Output Models
// ============================================================================

/// Per-track sync result.
///
/// `confidence` is the combined title/artist score of the chosen track against
/// the Spotify track, or 0.0 when nothing matched. `strategy` names the
/// cascade step that produced the match.
#[derive(Clone, Debug, Serialize)]
pub struct MatchResult {
    pub source: SourceTrack,
    pub track: Option<CandidateTrack>,
    pub match_type: MatchType,
    pub confidence: f64,
    pub strategy: Option<SearchStrategy>,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        self.track.is_some()
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Sync statistics, per playlist or merged across a run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct SyncStats {
    pub playlists: usize,
    pub total_tracks: usize,
    pub matched: usize,
    pub missing: usize,

    // Which cascade step found each match, keyed by strategy label
    pub matches_by_strategy: BTreeMap<String, usize>,

    // Library search calls that failed and were skipped
    pub source_errors: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl SyncStats {
    /// Calculate match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.total_tracks as f64
        }
    }

    pub fn record_match(&mut self, strategy: Option<SearchStrategy>) {
        self.total_tracks += 1;
        self.matched += 1;
        if let Some(strategy) = strategy {
            *self
                .matches_by_strategy
                .entry(strategy.label().to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn record_missing(&mut self) {
        self.total_tracks += 1;
        self.missing += 1;
    }

    /// Fold another playlist's stats into this one
    pub fn merge(&mut self, other: &SyncStats) {
        self.playlists += other.playlists;
        self.total_tracks += other.total_tracks;
        self.matched += other.matched;
        self.missing += other.missing;
        self.source_errors += other.source_errors;
        self.elapsed_seconds += other.elapsed_seconds;
        for (label, count) in &other.matches_by_strategy {
            *self.matches_by_strategy.entry(label.clone()).or_insert(0) += count;
        }
    }

    /// Log stats in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            log::info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchType::TitleArtist).unwrap(),
            "\"title_artist\""
        );
        assert_eq!(serde_json::to_string(&MatchType::None).unwrap(), "\"none\"");
    }

    #[test]
    fn test_candidate_track_defaults_missing_fields() {
        let track: CandidateTrack =
            serde_json::from_str(r#"{"title": "Hello", "artist": "Adele"}"#).unwrap();
        assert_eq!(track, CandidateTrack::new("", "Hello", "Adele", ""));
    }

    #[test]
    fn test_match_outcome_constructors() {
        let outcome = MatchOutcome::matched(CandidateTrack::new("1", "Hello", "Adele", "25"));
        assert!(outcome.is_match());
        assert_eq!(outcome.match_type, MatchType::TitleArtist);

        let none = MatchOutcome::no_match();
        assert!(!none.is_match());
        assert_eq!(none.match_type, MatchType::None);
    }

    #[test]
    fn test_sync_stats_match_rate_and_merge() {
        let mut a = SyncStats {
            playlists: 1,
            ..Default::default()
        };
        a.record_match(Some(SearchStrategy::ExactTitleArtist));
        a.record_missing();

        let mut b = SyncStats {
            playlists: 1,
            ..Default::default()
        };
        b.record_match(Some(SearchStrategy::ExactTitleArtist));
        b.record_match(Some(SearchStrategy::SuffixesRemoved));

        assert_eq!(a.match_rate(), 50.0);

        a.merge(&b);
        assert_eq!(a.playlists, 2);
        assert_eq!(a.total_tracks, 4);
        assert_eq!(a.matched, 3);
        assert_eq!(a.missing, 1);
        assert_eq!(a.matches_by_strategy["exact title/artist"], 2);
        assert_eq!(a.matches_by_strategy["suffixes removed"], 1);
        assert_eq!(a.match_rate(), 75.0);
    }

    #[test]
    fn test_empty_stats_match_rate() {
        assert_eq!(SyncStats::default().match_rate(), 0.0);
    }
}
