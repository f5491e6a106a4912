//! Match selection: pick the Plex candidate that best represents a Spotify track.
//!
//! Selection runs in phases:
//! 1. Exact pass on folded title and artist (first hit wins)
//! 2. Variant scoring of every candidate, with guard clauses rejecting
//!    title-only coincidences (Various Artists compilations excepted)
//! 3. Best combined score, accepted at `MIN_CONFIDENCE_SCORE`
//!
//! Diagnostics go through an injected `MatchLog` sink. Per-candidate traces are
//! only formatted when the matcher is verbose.

use std::fmt;
use std::sync::Arc;

use crate::models::{CandidateTrack, MatchOutcome, SearchTarget};
use crate::normalize::{normalize_punctuation, Normalizer, VARIOUS_ARTISTS};
use crate::scoring::{
    best_field_similarity, combined_score, fold_case, MIN_CONFIDENCE_SCORE,
    SELECTOR_ARTIST_VARIANTS, SELECTOR_TITLE_VARIANTS,
};

// ============================================================================
// Log Sink
// ============================================================================

/// Destination for matcher diagnostics.
pub trait MatchLog: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLog;

impl MatchLog for FacadeLog {
    fn debug(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl MatchLog for NullLog {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
}

// ============================================================================
// Guard Clauses
// ============================================================================

/// (title above, artist below) pairs that reject a candidate.
/// A near-identical title with an unrelated artist is a different song.
pub const GUARD_RULES: [(f64, f64); 2] = [(0.9, 0.3), (0.7, 0.2)];

/// Outcome of the guard clauses for one scored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardVerdict {
    Pass,
    /// A guard fired but the candidate is a Various Artists compilation track
    VariousArtists,
    Reject { title_above: f64, artist_below: f64 },
}

impl GuardVerdict {
    pub fn is_rejected(self) -> bool {
        matches!(self, GuardVerdict::Reject { .. })
    }
}

pub fn is_various_artists(artist: &str) -> bool {
    fold_case(artist) == VARIOUS_ARTISTS
}

/// Apply the guard clauses in order; the first one that fires decides.
pub fn guard_verdict(
    title_similarity: f64,
    artist_similarity: f64,
    candidate_artist: &str,
) -> GuardVerdict {
    for (title_above, artist_below) in GUARD_RULES {
        if title_similarity > title_above && artist_similarity < artist_below {
            if is_various_artists(candidate_artist) {
                return GuardVerdict::VariousArtists;
            }
            return GuardVerdict::Reject {
                title_above,
                artist_below,
            };
        }
    }
    GuardVerdict::Pass
}

// ============================================================================
// Scored Candidates
// ============================================================================

/// A candidate borrowed from the input slice with its similarities.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a CandidateTrack,
    pub title_similarity: f64,
    pub artist_similarity: f64,
    pub combined_score: f64,
}

impl<'a> ScoredCandidate<'a> {
    pub fn new(candidate: &'a CandidateTrack, title_similarity: f64, artist_similarity: f64) -> Self {
        Self {
            candidate,
            title_similarity,
            artist_similarity,
            combined_score: combined_score(title_similarity, artist_similarity),
        }
    }

    /// Higher combined score wins; an exact tie goes to the higher artist
    /// similarity. Anything else keeps the incumbent.
    pub fn outranks(&self, other: &ScoredCandidate<'_>) -> bool {
        self.combined_score > other.combined_score
            || (self.combined_score == other.combined_score
                && self.artist_similarity > other.artist_similarity)
    }

    pub fn is_perfect(&self) -> bool {
        self.title_similarity == 1.0 && self.artist_similarity == 1.0
    }
}

/// Whether a combined score is high enough to accept.
pub fn clears_threshold(score: f64) -> bool {
    score >= MIN_CONFIDENCE_SCORE
}

// ============================================================================
// Selection Modes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionMode {
    /// Raw strings, full variant lists
    Variants,
    /// Punctuation-normalized strings, compared as-is
    PunctuationOnly,
}

impl SelectionMode {
    fn prepare(self, s: &str) -> String {
        match self {
            SelectionMode::Variants => s.to_string(),
            SelectionMode::PunctuationOnly => normalize_punctuation(s),
        }
    }

    fn title_variants(self) -> &'static [Normalizer] {
        match self {
            SelectionMode::Variants => &SELECTOR_TITLE_VARIANTS,
            SelectionMode::PunctuationOnly => &[Normalizer::Identity],
        }
    }

    fn artist_variants(self) -> &'static [Normalizer] {
        match self {
            SelectionMode::Variants => &SELECTOR_ARTIST_VARIANTS,
            SelectionMode::PunctuationOnly => &[Normalizer::Identity],
        }
    }

    fn label(self) -> &'static str {
        match self {
            SelectionMode::Variants => "FindBestMatch",
            SelectionMode::PunctuationOnly => "FindBestMatchPunctuation",
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Fuzzy selector over candidate lists. Cheap to clone and safe to share.
#[derive(Clone)]
pub struct Matcher {
    verbose: bool,
    log: Arc<dyn MatchLog>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher").field("verbose", &self.verbose).finish()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Matcher {
    /// Matcher logging through the `log` facade.
    pub fn new(verbose: bool) -> Self {
        Self::with_log(verbose, Arc::new(FacadeLog))
    }

    pub fn with_log(verbose: bool, log: Arc<dyn MatchLog>) -> Self {
        Self { verbose, log }
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.verbose {
            self.log.debug(&message());
        }
    }

    /// Pick the candidate that best matches `title`/`artist`, or None when
    /// nothing clears the confidence threshold. Pass the original,
    /// untransformed Spotify text.
    pub fn find_best_match<'a>(
        &self,
        candidates: &'a [CandidateTrack],
        title: &str,
        artist: &str,
    ) -> Option<&'a CandidateTrack> {
        self.select(candidates, title, artist, SelectionMode::Variants)
    }

    /// Like `find_best_match`, but only punctuation is normalized: both sides
    /// go through `normalize_punctuation` and are compared without further
    /// variants.
    pub fn find_best_match_with_normalized_punctuation<'a>(
        &self,
        candidates: &'a [CandidateTrack],
        title: &str,
        artist: &str,
    ) -> Option<&'a CandidateTrack> {
        self.select(candidates, title, artist, SelectionMode::PunctuationOnly)
    }

    pub fn match_outcome(&self, candidates: &[CandidateTrack], target: &SearchTarget) -> MatchOutcome {
        match self.find_best_match(candidates, &target.title, &target.artist) {
            Some(track) => MatchOutcome::matched(track.clone()),
            None => MatchOutcome::no_match(),
        }
    }

    fn accept<'a>(&self, title: &str, artist: &str, scored: ScoredCandidate<'a>) -> &'a CandidateTrack {
        self.log.info(&format!(
            "Matched '{}' by '{}' to '{}' by '{}' (score {:.3})",
            title, artist, scored.candidate.title, scored.candidate.artist, scored.combined_score
        ));
        scored.candidate
    }

    fn select<'a>(
        &self,
        candidates: &'a [CandidateTrack],
        title: &str,
        artist: &str,
        mode: SelectionMode,
    ) -> Option<&'a CandidateTrack> {
        if candidates.is_empty() {
            return None;
        }

        let title = mode.prepare(title);
        let artist = mode.prepare(artist);
        self.trace(|| {
            format!(
                "{}: searching for '{}' by '{}' among {} tracks",
                mode.label(),
                title,
                artist,
                candidates.len()
            )
        });

        // Phase 1: exact match on folded strings
        let title_key = fold_case(&title);
        let artist_key = fold_case(&artist);
        if let Some(exact) = candidates.iter().find(|c| {
            fold_case(&mode.prepare(&c.title)) == title_key
                && fold_case(&mode.prepare(&c.artist)) == artist_key
        }) {
            self.trace(|| format!("Exact match: '{}' by '{}'", exact.title, exact.artist));
            return Some(exact);
        }

        // Phase 2: variant scoring
        let mut best: Option<ScoredCandidate<'a>> = None;
        for candidate in candidates {
            let candidate_title = mode.prepare(&candidate.title);
            let candidate_artist = mode.prepare(&candidate.artist);
            let title_score = best_field_similarity(&title, &candidate_title, mode.title_variants());
            let artist_score =
                best_field_similarity(&artist, &candidate_artist, mode.artist_variants());
            let scored =
                ScoredCandidate::new(candidate, title_score.similarity, artist_score.similarity);

            self.trace(|| {
                format!(
                    "Candidate '{}' by '{}': title {:.3} ({}), artist {:.3} ({}), combined {:.3}",
                    candidate.title,
                    candidate.artist,
                    scored.title_similarity,
                    title_score.via.label(),
                    scored.artist_similarity,
                    artist_score.via.label(),
                    scored.combined_score
                )
            });

            match guard_verdict(scored.title_similarity, scored.artist_similarity, &candidate.artist) {
                GuardVerdict::Reject {
                    title_above,
                    artist_below,
                } => {
                    self.trace(|| {
                        format!(
                            "Rejecting '{}' by '{}': title > {} but artist < {}",
                            candidate.title, candidate.artist, title_above, artist_below
                        )
                    });
                    continue;
                }
                GuardVerdict::VariousArtists => {
                    self.trace(|| format!("Allowing Various Artists track '{}'", candidate.title));
                }
                GuardVerdict::Pass => {}
            }

            if best.map_or(true, |current| scored.outranks(&current)) {
                self.trace(|| format!("New best: {:.3}", scored.combined_score));
                best = Some(scored);
            }

            if scored.is_perfect() {
                self.trace(|| "Perfect match, stopping early".to_string());
                return Some(self.accept(&title, &artist, scored));
            }
        }

        // Phase 3: threshold
        match best {
            Some(scored) if clears_threshold(scored.combined_score) => {
                Some(self.accept(&title, &artist, scored))
            }
            Some(scored) => {
                self.trace(|| {
                    format!(
                        "No match for '{}' by '{}': best score {:.3} below {}",
                        title, artist, scored.combined_score, MIN_CONFIDENCE_SCORE
                    )
                });
                None
            }
            None => {
                self.trace(|| format!("No match for '{}' by '{}': every candidate rejected", title, artist));
                None
            }
        }
    }
}
