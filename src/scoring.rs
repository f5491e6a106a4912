//! Scoring functions for Spotify-to-Plex matching.
//!
//! This module contains:
//! - Bounded string similarity between two folded strings
//! - Best-of-variant field similarity across normalizers
//! - Weighted title/artist confidence for a target/candidate pair

use rustc_hash::FxHashMap;

use crate::models::{CandidateTrack, SearchTarget};
use crate::normalize::Normalizer;

// ============================================================================
// Weights & Thresholds
// ============================================================================

/// Title share of the combined score
pub const TITLE_WEIGHT: f64 = 0.7;

/// Artist share of the combined score
pub const ARTIST_WEIGHT: f64 = 0.3;

/// Minimum combined score to accept a match
pub const MIN_CONFIDENCE_SCORE: f64 = 0.7;

const WORD_OVERLAP_WEIGHT: f64 = 0.7;
const LENGTH_WEIGHT: f64 = 0.3;

// ============================================================================
// Variant Lists
// ============================================================================

/// Title normalizers tried by `confidence`
pub const CONFIDENCE_TITLE_VARIANTS: [Normalizer; 7] = [
    Normalizer::Identity,
    Normalizer::RemoveBrackets,
    Normalizer::RemoveFeaturing,
    Normalizer::NormalizeTitle,
    Normalizer::RemoveWith,
    Normalizer::RemoveCommonSuffixes,
    Normalizer::NormalizeAccents,
];

/// Artist normalizers tried by `confidence`
pub const CONFIDENCE_ARTIST_VARIANTS: [Normalizer; 4] = [
    Normalizer::Identity,
    Normalizer::RemoveFeaturing,
    Normalizer::NormalizePunctuation,
    Normalizer::NormalizeAccents,
];

/// Title normalizers tried by the match selector
pub const SELECTOR_TITLE_VARIANTS: [Normalizer; 8] = [
    Normalizer::Identity,
    Normalizer::RemoveBrackets,
    Normalizer::RemoveFeaturing,
    Normalizer::NormalizeTitle,
    Normalizer::RemoveWith,
    Normalizer::RemoveCommonSuffixes,
    Normalizer::NormalizeAccents,
    Normalizer::NormalizePunctuation,
];

/// Artist normalizers tried by the match selector
pub const SELECTOR_ARTIST_VARIANTS: [Normalizer; 4] = [
    Normalizer::Identity,
    Normalizer::NormalizePunctuation,
    Normalizer::NormalizeAccents,
    Normalizer::RemoveFeaturing,
];

// ============================================================================
// String Similarity
// ============================================================================

/// Case folding applied before every selector comparison
pub fn fold_case(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Confidence folds case only; surrounding whitespace still counts.
fn lowercase(s: &str) -> String {
    s.to_lowercase()
}

/// Similarity between two already-folded strings (0.0 to 1.0).
///
/// Equal strings score 1.0 and an empty side scores 0.0. When one string
/// contains the other the score is the length ratio. Otherwise it blends word
/// overlap (each word matched at most once) with length similarity.
/// Lengths are counted in UTF-8 bytes.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let len_a = a.len();
    let len_b = b.len();
    let longer = len_a.max(len_b) as f64;

    if a.contains(b) || b.contains(a) {
        return len_a.min(len_b) as f64 / longer;
    }

    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    // Multiset intersection: a repeated word only matches as often as it
    // appears on the other side
    let mut available: FxHashMap<&str, usize> = FxHashMap::default();
    for &word in &words_b {
        *available.entry(word).or_insert(0) += 1;
    }
    let mut matching = 0usize;
    for word in &words_a {
        if let Some(count) = available.get_mut(word) {
            if *count > 0 {
                *count -= 1;
                matching += 1;
            }
        }
    }

    let word_overlap = matching as f64 / words_a.len().max(words_b.len()) as f64;
    let length_similarity = 1.0 - len_a.abs_diff(len_b) as f64 / longer;

    WORD_OVERLAP_WEIGHT * word_overlap + LENGTH_WEIGHT * length_similarity
}

// ============================================================================
// Field Similarity
// ============================================================================

/// Best similarity for one field, and the normalizer that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScore {
    pub similarity: f64,
    pub via: Normalizer,
}

/// One row of a per-normalizer comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantComparison {
    pub via: Normalizer,
    pub target: String,
    pub candidate: String,
    pub similarity: f64,
}

fn compare_with(
    normalizer: Normalizer,
    target: &str,
    candidate: &str,
    fold: fn(&str) -> String,
) -> VariantComparison {
    let target = fold(&normalizer.apply(target));
    let candidate = fold(&normalizer.apply(candidate));
    let similarity = string_similarity(&target, &candidate);
    VariantComparison {
        via: normalizer,
        target,
        candidate,
        similarity,
    }
}

/// Apply each normalizer to both sides and report every comparison.
pub fn compare_variants(
    target: &str,
    candidate: &str,
    variants: &[Normalizer],
) -> Vec<VariantComparison> {
    variants
        .iter()
        .map(|&normalizer| compare_with(normalizer, target, candidate, fold_case))
        .collect()
}

/// Maximum similarity over `variants`. Ties keep the earliest normalizer.
pub fn best_field_similarity(target: &str, candidate: &str, variants: &[Normalizer]) -> FieldScore {
    best_folded_similarity(target, candidate, variants, fold_case)
}

fn best_folded_similarity(
    target: &str,
    candidate: &str,
    variants: &[Normalizer],
    fold: fn(&str) -> String,
) -> FieldScore {
    let mut best = FieldScore {
        similarity: 0.0,
        via: Normalizer::Identity,
    };

    for &normalizer in variants {
        let similarity = compare_with(normalizer, target, candidate, fold).similarity;
        if similarity > best.similarity {
            best = FieldScore {
                similarity,
                via: normalizer,
            };
        }
        if best.similarity >= 1.0 {
            break;
        }
    }

    best
}

// ============================================================================
// Combined Scoring
// ============================================================================

/// Weighted title/artist score
pub fn combined_score(title_similarity: f64, artist_similarity: f64) -> f64 {
    title_similarity * TITLE_WEIGHT + artist_similarity * ARTIST_WEIGHT
}

/// Confidence with the winning normalizer for each field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBreakdown {
    pub title: FieldScore,
    pub artist: FieldScore,
    pub combined: f64,
}

pub fn confidence_breakdown(target: &SearchTarget, candidate: &CandidateTrack) -> ConfidenceBreakdown {
    let title = best_folded_similarity(
        &target.title,
        &candidate.title,
        &CONFIDENCE_TITLE_VARIANTS,
        lowercase,
    );
    let artist = best_folded_similarity(
        &target.artist,
        &candidate.artist,
        &CONFIDENCE_ARTIST_VARIANTS,
        lowercase,
    );

    ConfidenceBreakdown {
        title,
        artist,
        combined: combined_score(title.similarity, artist.similarity),
    }
}

/// Confidence (0.0 to 1.0) that `candidate` is the track `target` describes.
pub fn confidence(target: &SearchTarget, candidate: &CandidateTrack) -> f64 {
    confidence_breakdown(target, candidate).combined
}
