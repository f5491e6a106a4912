//! Candidate search cascade.
//!
//! A library search only returns tracks whose text contains the query, so a
//! Spotify title like "Spotlight - Single Edit" can miss the Plex track
//! "Spotlight" entirely. The cascade retries with progressively looser query
//! text (see `SearchStrategy::CASCADE`) and hands every result list to the
//! matcher, always scored against the original Spotify title and artist.

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::path::Path;

use crate::matcher::Matcher;
use crate::models::{CandidateTrack, MatchType, SearchStrategy, SearchTarget};
use crate::normalize::{normalize_accents, remove_featuring, Normalizer};

/// Maximum results a library search returns
pub const SEARCH_LIMIT: usize = 100;

// ============================================================================
// Candidate Sources
// ============================================================================

/// Where candidates come from. A Plex HTTP client implements this against
/// `/library/sections/<id>/search`; `LibraryIndex` implements it in memory.
pub trait CandidateSource {
    /// Tracks matching a free-text query, at most `SEARCH_LIMIT`.
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>>;

    /// Every track in the library, for the last-resort scan.
    fn all_tracks(&self) -> Result<Vec<CandidateTrack>>;
}

/// In-memory library loaded from a JSON dump.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    tracks: Vec<CandidateTrack>,
    haystacks: Vec<String>, // lowercased "title artist album", parallel to `tracks`
}

impl LibraryIndex {
    pub fn new(tracks: Vec<CandidateTrack>) -> Self {
        let haystacks = tracks
            .iter()
            .map(|t| format!("{} {} {}", t.title, t.artist, t.album).to_lowercase())
            .collect();
        Self { tracks, haystacks }
    }

    /// Parse a JSON array of tracks
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tracks: Vec<CandidateTrack> =
            serde_json::from_str(json).context("Library dump is not a JSON array of tracks")?;
        Ok(Self::new(tracks))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read library dump {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn tracks(&self) -> &[CandidateTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl CandidateSource for LibraryIndex {
    /// Tracks whose haystack contains every query word, in library order.
    fn search(&self, query: &str) -> Result<Vec<CandidateTrack>> {
        let query = query.to_lowercase();
        let words: Vec<&str> = query.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .tracks
            .iter()
            .zip(&self.haystacks)
            .filter(|(_, haystack)| words.iter().all(|w| haystack.contains(w)))
            .map(|(track, _)| track.clone())
            .take(SEARCH_LIMIT)
            .collect())
    }

    fn all_tracks(&self) -> Result<Vec<CandidateTrack>> {
        Ok(self.tracks.clone())
    }
}

// ============================================================================
// Query Variants
// ============================================================================

/// Contraction expansions tried for titles with apostrophes
const CONTRACTIONS: [(&str, &str); 9] = [
    ("n't", " not"),
    ("'t", " not"),
    ("'s", " is"),
    ("'s", "s"),
    ("'re", " are"),
    ("'ll", " will"),
    ("'ve", " have"),
    ("'d", " would"),
    ("'d", " had"),
];

/// Alternate spellings of a title containing `'`, as Plex may store the
/// apostrophe differently or not at all. Excludes the title itself.
pub fn single_quote_variations(title: &str) -> Vec<String> {
    if !title.contains('\'') {
        return Vec::new();
    }

    let mut variations = vec![
        title.replace('\'', ""),
        title.replace('\'', "`"),
        title.replace('\'', "\u{2032}"),
        title.replace('\'', "\u{2019}"),
    ];
    for (contraction, expansion) in CONTRACTIONS {
        if title.contains(contraction) {
            variations.push(title.replace(contraction, expansion));
        }
    }

    let mut seen = FxHashSet::default();
    variations.retain(|v| v != title && !v.trim().is_empty() && seen.insert(v.clone()));
    variations
}

/// A rewritten title, unless it matches the title or an earlier rewrite.
/// Library search ignores case, so neither does the comparison.
fn fresh_title(
    title: &str,
    artist: &str,
    normalizer: Normalizer,
    earlier: &[Normalizer],
) -> Vec<(String, String)> {
    let variant = normalizer.apply(title);
    let key = variant.to_lowercase();
    if key == title.to_lowercase() || earlier.iter().any(|n| n.apply(title).to_lowercase() == key) {
        return Vec::new();
    }
    vec![(variant, artist.to_string())]
}

impl SearchStrategy {
    /// Strategies in the order the searcher tries them
    pub const CASCADE: [SearchStrategy; 10] = [
        SearchStrategy::ExactTitleArtist,
        SearchStrategy::SingleQuoteVariations,
        SearchStrategy::BracketsRemoved,
        SearchStrategy::FeaturingRemoved,
        SearchStrategy::ArtistFeaturingRemoved,
        SearchStrategy::NormalizedTitle,
        SearchStrategy::WithRemoved,
        SearchStrategy::SuffixesRemoved,
        SearchStrategy::AccentsNormalized,
        SearchStrategy::FullLibrary,
    ];

    /// (title, artist) query pairs for this strategy. Empty when the strategy
    /// has nothing to try, and always empty for `FullLibrary`.
    pub fn variants(self, title: &str, artist: &str) -> Vec<(String, String)> {
        use Normalizer::*;

        match self {
            SearchStrategy::ExactTitleArtist => vec![(title.to_string(), artist.to_string())],
            // A quote in the artist alone still earns one plain retry
            SearchStrategy::SingleQuoteVariations if !title.contains('\'') => {
                if artist.contains('\'') {
                    vec![(title.to_string(), artist.to_string())]
                } else {
                    Vec::new()
                }
            }
            SearchStrategy::SingleQuoteVariations => single_quote_variations(title)
                .into_iter()
                .map(|t| (t, artist.to_string()))
                .collect(),
            SearchStrategy::BracketsRemoved => fresh_title(title, artist, RemoveBrackets, &[]),
            SearchStrategy::FeaturingRemoved => {
                fresh_title(title, artist, RemoveFeaturing, &[RemoveBrackets])
            }
            SearchStrategy::ArtistFeaturingRemoved => {
                let stripped = remove_featuring(artist);
                if stripped == artist {
                    Vec::new()
                } else {
                    vec![(title.to_string(), stripped)]
                }
            }
            SearchStrategy::NormalizedTitle => {
                fresh_title(title, artist, NormalizeTitle, &[RemoveBrackets, RemoveFeaturing])
            }
            SearchStrategy::WithRemoved => fresh_title(
                title,
                artist,
                RemoveWith,
                &[RemoveBrackets, RemoveFeaturing, NormalizeTitle],
            ),
            SearchStrategy::SuffixesRemoved => fresh_title(
                title,
                artist,
                RemoveCommonSuffixes,
                &[RemoveBrackets, RemoveFeaturing, NormalizeTitle, RemoveWith],
            ),
            SearchStrategy::AccentsNormalized => {
                let folded_title = normalize_accents(title);
                let folded_artist = normalize_accents(artist);
                if folded_title == title && folded_artist == artist {
                    Vec::new()
                } else {
                    vec![(folded_title, folded_artist)]
                }
            }
            SearchStrategy::FullLibrary => Vec::new(),
        }
    }
}

/// The three searches issued per query pair, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Combined,
    Title,
    Artist,
}

impl QueryKind {
    pub const ORDER: [QueryKind; 3] = [QueryKind::Combined, QueryKind::Title, QueryKind::Artist];

    pub fn query(self, title: &str, artist: &str) -> String {
        match self {
            QueryKind::Combined => format!("{} {}", title.trim(), artist.trim()).trim().to_string(),
            QueryKind::Title => title.trim().to_string(),
            QueryKind::Artist => artist.trim().to_string(),
        }
    }
}

// ============================================================================
// Track Searcher
// ============================================================================

/// Result of one cascade run
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub track: Option<CandidateTrack>,
    pub strategy: Option<SearchStrategy>,
    pub source_errors: usize,
}

impl SearchOutcome {
    pub fn match_type(&self) -> MatchType {
        if self.track.is_some() {
            MatchType::TitleArtist
        } else {
            MatchType::None
        }
    }
}

/// Runs the strategy cascade against a candidate source.
pub struct TrackSearcher<'a, S: CandidateSource + ?Sized> {
    source: &'a S,
    matcher: Matcher,
    punctuation_only: bool,
}

impl<'a, S: CandidateSource + ?Sized> TrackSearcher<'a, S> {
    pub fn new(source: &'a S, matcher: Matcher) -> Self {
        Self {
            source,
            matcher,
            punctuation_only: false,
        }
    }

    /// Select with `find_best_match_with_normalized_punctuation` instead
    pub fn punctuation_only(mut self, enabled: bool) -> Self {
        self.punctuation_only = enabled;
        self
    }

    /// Try each strategy in cascade order; the first match wins.
    pub fn search(&self, target: &SearchTarget) -> SearchOutcome {
        let mut source_errors = 0;

        for strategy in SearchStrategy::CASCADE {
            let found = if strategy == SearchStrategy::FullLibrary {
                self.scan_library(target, &mut source_errors)
            } else {
                strategy
                    .variants(&target.title, &target.artist)
                    .into_iter()
                    .find_map(|(title, artist)| {
                        log::debug!(
                            "Trying {} with '{}' by '{}'",
                            strategy.label(),
                            title,
                            artist
                        );
                        self.try_queries(&title, &artist, target, &mut source_errors)
                    })
            };

            if let Some(track) = found {
                log::info!(
                    "Found '{}' by '{}' using {}",
                    track.title,
                    track.artist,
                    strategy.label()
                );
                return SearchOutcome {
                    track: Some(track),
                    strategy: Some(strategy),
                    source_errors,
                };
            }
        }

        log::debug!(
            "No match for '{}' by '{}' after every strategy",
            target.title,
            target.artist
        );
        SearchOutcome {
            track: None,
            strategy: None,
            source_errors,
        }
    }

    fn try_queries(
        &self,
        title: &str,
        artist: &str,
        target: &SearchTarget,
        source_errors: &mut usize,
    ) -> Option<CandidateTrack> {
        for kind in QueryKind::ORDER {
            let query = kind.query(title, artist);
            if query.is_empty() {
                continue;
            }
            match self.source.search(&query) {
                Ok(candidates) => {
                    if let Some(track) = self.select(&candidates, target) {
                        return Some(track);
                    }
                }
                Err(err) => {
                    log::warn!("Search for '{}' failed: {:#}", query, err);
                    *source_errors += 1;
                }
            }
        }
        None
    }

    fn scan_library(&self, target: &SearchTarget, source_errors: &mut usize) -> Option<CandidateTrack> {
        match self.source.all_tracks() {
            Ok(tracks) => {
                log::debug!("Scanning {} library tracks", tracks.len());
                self.select(&tracks, target)
            }
            Err(err) => {
                log::warn!("Library scan failed: {:#}", err);
                *source_errors += 1;
                None
            }
        }
    }

    fn select(&self, candidates: &[CandidateTrack], target: &SearchTarget) -> Option<CandidateTrack> {
        let chosen = if self.punctuation_only {
            self.matcher.find_best_match_with_normalized_punctuation(
                candidates,
                &target.title,
                &target.artist,
            )
        } else {
            self.matcher
                .find_best_match(candidates, &target.title, &target.artist)
        };
        chosen.cloned()
    }
}
