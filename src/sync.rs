//! Playlist sync: run the search cascade for every track of a Spotify playlist.
//!
//! Tracks are matched strictly in playlist order, one full cascade at a time.
//! The report keeps that order so the matched Plex IDs can be written to a
//! playlist as-is.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

use crate::models::{
    CandidateTrack, MatchResult, SearchTarget, SourcePlaylist, SourceTrack, SyncStats,
};
use crate::progress::{format_duration, ProgressMode};
use crate::scoring::confidence;
use crate::search::{CandidateSource, TrackSearcher};

pub const SPOTIFY_PLAYLIST_URL: &str = "https://open.spotify.com/playlist/";

/// Progress lines every N tracks in log-only mode
const PROGRESS_INTERVAL: u64 = 25;

// ============================================================================
// Playlist Loading
// ============================================================================

pub fn load_playlist(path: &Path) -> Result<SourcePlaylist> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read playlist {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse playlist {}", path.display()))
}

/// Description for the Plex copy of a playlist, crediting the Spotify source.
/// Spotify returns descriptions HTML-escaped; entities are decoded.
pub fn playlist_description(description: &str, playlist_id: &str) -> String {
    let described = if playlist_id.is_empty() {
        description.to_string()
    } else {
        let attribution = format!("synced from Spotify: {}{}", SPOTIFY_PLAYLIST_URL, playlist_id);
        if description.trim().is_empty() {
            attribution
        } else {
            format!("{}\n\n{}", description, attribution)
        }
    };
    html_escape::decode_html_entities(&described).into_owned()
}

/// Numbered entry for a track missing from the library, with the IDs needed
/// to look it up by hand.
pub fn missing_entry(position: usize, source: &SourceTrack) -> String {
    let isrc = source.isrc.as_deref().unwrap_or("(not available)");
    format!(
        "{:3}. {} - {}\n     Spotify track ID: {}\n     ISRC: {}",
        position, source.artist, source.name, source.id, isrc
    )
}

/// Highest-confidence library track for a target, for diagnosing misses.
/// Ties keep the earlier track.
pub fn best_library_match<'a>(
    target: &SearchTarget,
    tracks: &'a [CandidateTrack],
) -> Option<(&'a CandidateTrack, f64)> {
    let mut best: Option<(&'a CandidateTrack, f64)> = None;
    for track in tracks {
        let score = confidence(target, track);
        if best.map_or(true, |(_, current)| score > current) {
            best = Some((track, score));
        }
    }
    best
}

// ============================================================================
// Sync Report
// ============================================================================

/// Outcome of syncing one playlist
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub playlist_id: String,
    pub playlist_name: String,
    pub description: String,
    pub results: Vec<MatchResult>, // playlist order
    pub stats: SyncStats,
}

impl SyncReport {
    /// Plex IDs of matched tracks, in playlist order
    pub fn matched_track_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| r.track.as_ref())
            .map(|t| t.id.as_str())
            .collect()
    }

    pub fn missing(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| !r.is_match())
    }
}

// ============================================================================
// Orchestration
// ============================================================================

pub struct PlaylistSync<'a, S: CandidateSource + ?Sized> {
    searcher: TrackSearcher<'a, S>,
    progress: ProgressMode,
}

impl<'a, S: CandidateSource + ?Sized> PlaylistSync<'a, S> {
    pub fn new(searcher: TrackSearcher<'a, S>) -> Self {
        Self {
            searcher,
            progress: ProgressMode::default(),
        }
    }

    pub fn progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    pub fn sync(&self, playlist: &SourcePlaylist) -> SyncReport {
        let start = Instant::now();
        let total = playlist.tracks.len() as u64;
        let mut stats = SyncStats {
            playlists: 1,
            ..Default::default()
        };
        let mut results = Vec::with_capacity(playlist.tracks.len());

        log::info!(
            "Syncing playlist '{}' ({} tracks)",
            playlist.name,
            playlist.tracks.len()
        );
        let pb = self.progress.bar(total, &format!("Matching {}", playlist.name));

        for (i, source) in playlist.tracks.iter().enumerate() {
            log::debug!(
                "Processing song {}/{}: '{}' by '{}'",
                i + 1,
                total,
                source.name,
                source.artist
            );

            let target = source.target();
            let outcome = self.searcher.search(&target);
            stats.source_errors += outcome.source_errors;

            let match_type = outcome.match_type();
            let score = match &outcome.track {
                Some(track) => {
                    stats.record_match(outcome.strategy);
                    confidence(&target, track)
                }
                None => {
                    stats.record_missing();
                    0.0
                }
            };

            results.push(MatchResult {
                source: source.clone(),
                track: outcome.track,
                match_type,
                confidence: score,
                strategy: outcome.strategy,
            });

            pb.inc(1);
            self.progress.tick("MATCH", i as u64 + 1, total, PROGRESS_INTERVAL);
        }

        pb.finish_and_clear();
        let elapsed = start.elapsed();
        stats.elapsed_seconds = elapsed.as_secs_f64();
        log::info!(
            "Matched {}/{} tracks of '{}' ({:.1}%) in {}",
            stats.matched,
            stats.total_tracks,
            playlist.name,
            stats.match_rate(),
            format_duration(elapsed)
        );

        SyncReport {
            playlist_id: playlist.id.clone(),
            playlist_name: playlist.name.clone(),
            description: playlist_description(&playlist.description, &playlist.id),
            results,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{Matcher, NullLog};
    use crate::models::{MatchType, SearchStrategy};
    use crate::search::LibraryIndex;
    use std::sync::Arc;

    fn source(id: &str, name: &str, artist: &str) -> SourceTrack {
        SourceTrack {
            id: id.to_string(),
            name: name.to_string(),
            artist: artist.to_string(),
            album: String::new(),
            isrc: None,
        }
    }

    fn library() -> LibraryIndex {
        LibraryIndex::new(vec![
            CandidateTrack::new("101", "Spotlight", "Jessie Ware", "What's Your Pleasure?"),
            CandidateTrack::new("102", "the lakes", "Taylor Swift", "folklore"),
            CandidateTrack::new("103", "Do It", "Chloe x Halle", "Ungodly Hour"),
        ])
    }

    fn playlist() -> SourcePlaylist {
        SourcePlaylist {
            id: "37i9dQZF1DX".to_string(),
            name: "Mix".to_string(),
            description: "Weekend mix".to_string(),
            tracks: vec![
                source("s1", "Do It", "Chloe × Halle"),
                source("s2", "Bohemian Rhapsody", "Queen"),
                source("s3", "Spotlight - Single Edit", "Jessie Ware"),
                source("s4", "the lakes - bonus track", "Taylor Swift"),
            ],
        }
    }

    #[test]
    fn test_sync_preserves_order_and_counts() {
        let index = library();
        let searcher = TrackSearcher::new(&index, Matcher::with_log(false, Arc::new(NullLog)));
        let report = PlaylistSync::new(searcher)
            .progress(ProgressMode::LogOnly)
            .sync(&playlist());

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.matched_track_ids(), vec!["103", "101", "102"]);

        let missing: Vec<&str> = report.missing().map(|r| r.source.id.as_str()).collect();
        assert_eq!(missing, vec!["s2"]);
        assert_eq!(report.results[1].match_type, MatchType::None);
        assert_eq!(report.results[1].confidence, 0.0);
        assert_eq!(report.results[1].strategy, None);

        let spotlight = &report.results[2];
        assert_eq!(spotlight.match_type, MatchType::TitleArtist);
        assert!((spotlight.confidence - 1.0).abs() < 1e-9);
        assert!(spotlight.strategy.is_some());

        assert_eq!(report.stats.playlists, 1);
        assert_eq!(report.stats.total_tracks, 4);
        assert_eq!(report.stats.matched, 3);
        assert_eq!(report.stats.missing, 1);
        assert_eq!(report.stats.source_errors, 0);
        assert_eq!(report.stats.matches_by_strategy.values().sum::<usize>(), 3);
        assert_eq!(
            report.description,
            "Weekend mix\n\nsynced from Spotify: https://open.spotify.com/playlist/37i9dQZF1DX"
        );
    }

    #[test]
    fn test_empty_playlist() {
        let index = library();
        let searcher = TrackSearcher::new(&index, Matcher::with_log(false, Arc::new(NullLog)));
        let empty = SourcePlaylist {
            id: String::new(),
            name: "Empty".to_string(),
            description: String::new(),
            tracks: Vec::new(),
        };
        let report = PlaylistSync::new(searcher)
            .progress(ProgressMode::LogOnly)
            .sync(&empty);
        assert!(report.results.is_empty());
        assert_eq!(report.stats.match_rate(), 0.0);
        assert_eq!(report.description, "");
    }

    #[test]
    fn test_playlist_description() {
        assert_eq!(
            playlist_description("", "abc"),
            "synced from Spotify: https://open.spotify.com/playlist/abc"
        );
        assert_eq!(
            playlist_description("Chill", "abc"),
            "Chill\n\nsynced from Spotify: https://open.spotify.com/playlist/abc"
        );
        assert_eq!(playlist_description("Chill", ""), "Chill");
    }

    #[test]
    fn test_playlist_description_decodes_entities() {
        assert_eq!(
            playlist_description("a &#x2F; b", "abc"),
            "a / b\n\nsynced from Spotify: https://open.spotify.com/playlist/abc"
        );
        assert_eq!(playlist_description("Rock &amp; Roll", ""), "Rock & Roll");
        assert_eq!(playlist_description("R&B", ""), "R&B");
    }

    #[test]
    fn test_missing_entry() {
        let mut track = source("4uLU6hMCjMI75M1A2tKUQC", "Bohemian Rhapsody", "Queen");
        assert_eq!(
            missing_entry(3, &track),
            "  3. Queen - Bohemian Rhapsody\n     Spotify track ID: 4uLU6hMCjMI75M1A2tKUQC\n     ISRC: (not available)"
        );

        track.isrc = Some("GBUM71029604".to_string());
        assert!(missing_entry(12, &track).ends_with("     ISRC: GBUM71029604"));
        assert!(missing_entry(12, &track).starts_with(" 12. Queen"));
    }

    #[test]
    fn test_best_library_match() {
        let index = library();
        let target = SearchTarget::new("Spotlight (Live)", "Jessie Ware");
        let (track, score) = best_library_match(&target, index.tracks()).unwrap();
        assert_eq!(track.id, "101");
        assert!(score > 0.9);

        assert!(best_library_match(&target, &[]).is_none());
    }

    #[test]
    fn test_load_playlist() {
        let path = std::env::temp_dir().join("plexify-match-playlist-test.json");
        std::fs::write(
            &path,
            r#"{
                "id": "pl1",
                "name": "Road Trip",
                "tracks": [
                    {"id": "t1", "name": "Hello", "artist": "Adele", "isrc": "GBBKS1500214"}
                ]
            }"#,
        )
        .unwrap();

        let playlist = load_playlist(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.description, "");
        assert_eq!(playlist.tracks.len(), 1);
        assert_eq!(playlist.tracks[0].isrc.as_deref(), Some("GBBKS1500214"));
        assert_eq!(playlist.tracks[0].album, "");

        assert!(load_playlist(Path::new("/nonexistent/playlist.json")).is_err());
    }

    #[test]
    fn test_match_strategy_is_recorded() {
        let index = LibraryIndex::new(vec![CandidateTrack::new("1", "Hello", "Adele", "25")]);
        let searcher = TrackSearcher::new(&index, Matcher::with_log(false, Arc::new(NullLog)));
        let playlist = SourcePlaylist {
            id: "p".to_string(),
            name: "One".to_string(),
            description: String::new(),
            tracks: vec![source("s1", "Hello", "Adele")],
        };
        let report = PlaylistSync::new(searcher)
            .progress(ProgressMode::LogOnly)
            .sync(&playlist);
        assert_eq!(report.results[0].strategy, Some(SearchStrategy::ExactTitleArtist));
        assert_eq!(report.stats.matches_by_strategy["exact title/artist"], 1);
    }

    #[test]
    fn test_demo_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let index = LibraryIndex::from_json_file(&dir.join("library.json")).unwrap();
        let playlist = load_playlist(&dir.join("playlist.json")).unwrap();

        let searcher = TrackSearcher::new(&index, Matcher::with_log(false, Arc::new(NullLog)));
        let report = PlaylistSync::new(searcher)
            .progress(ProgressMode::LogOnly)
            .sync(&playlist);

        assert_eq!(
            report.matched_track_ids(),
            vec!["101", "102", "103", "104", "105", "106", "107"]
        );
        let missing: Vec<&str> = report.missing().map(|r| r.source.id.as_str()).collect();
        assert_eq!(missing, vec!["s8"]);
    }
}
