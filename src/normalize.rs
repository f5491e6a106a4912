//! Text normalizers for Spotify-to-Plex track matching.
//!
//! Every function here is a pure, total `&str -> String` transform: a string
//! without the pattern comes back unchanged. Pattern detection ignores case,
//! but the returned text keeps the input's casing. Callers lowercase before
//! comparing.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Bracketed spans removed by `remove_brackets`: "(feat. X)", "[Remix]", "{Live}".
/// Non-nested; each span ends at the nearest closing bracket.
pub static BRACKET_SPANS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\([^)]*\)").unwrap(),
        Regex::new(r"\[[^\]]*\]").unwrap(),
        Regex::new(r"\{[^}]*\}").unwrap(),
    ]
});

/// "with" as a whole word. Never matches inside "without" or "within".
pub static WITH_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwith\b").unwrap());

/// Year-remastered suffixes: "- 2018 Remastered", "(2009 Remastered)"
pub static YEAR_REMASTERED: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s*-\s*\d{4}\s+remastered\s*$").unwrap(),
        Regex::new(r"(?i)\s*\(\s*\d{4}\s+remastered\s*\)\s*$").unwrap(),
    ]
});

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ============================================================================
// PATTERN LISTS
// ============================================================================

/// Featured-artist markers, checked in this order. The first marker present
/// wins and the string is cut at its last occurrence.
pub const FEATURING_MARKERS: [&str; 5] = [" featuring ", " feat. ", " feat ", " ft. ", " ft "];

/// Edit/mix/version descriptors and soundtrack attributions, in priority order.
/// All entries are lowercase ASCII.
pub const COMMON_SUFFIXES: &[&str] = &[
    " - bonus track",
    " - remix",
    " - extended",
    " - radio edit",
    " - single edit",
    " - edit",
    " - version",
    " - live",
    " - acoustic",
    " - instrumental",
    " - demo",
    " - original mix",
    " - club mix",
    " - clean",
    " - explicit",
    " - bonus",
    " - track",
    " - remastered",
    // Soundtrack attributions
    " - from the motion picture",
    " - from the film",
    " - from the movie",
    " - from the soundtrack",
    " - soundtrack version",
    " - film version",
    " - movie version",
    " (bonus track)",
    " (remix)",
    " (extended)",
    " (radio edit)",
    " (single edit)",
    " (edit)",
    " (version)",
    " (live)",
    " (acoustic)",
    " (instrumental)",
    " (demo)",
    " (original mix)",
    " (club mix)",
    " (clean)",
    " (explicit)",
    " (bonus)",
    " (track)",
    " (remastered)",
    " (from the soundtrack)",
    " (soundtrack version)",
    " (film version)",
    " (movie version)",
];

/// Soundtrack markers followed by arbitrary film/show names, e.g.
/// `Shallow - From "A Star Is Born" Soundtrack`. Cut at the first occurrence,
/// unless the marker opens the string.
pub const SOUNDTRACK_MARKERS: &[&str] = &[
    " - from the motion picture",
    " - from the film",
    " - from the movie",
    " - love theme from",
    "(from the motion picture",
    "(from the film",
    "(from the movie",
    "(love theme from",
];

/// Literal compilation artist Plex assigns to various-artist records
pub const VARIOUS_ARTISTS: &str = "various artists";

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Latin-1 Supplement, Latin Extended-A/B and Latin Extended Additional.
fn is_extended_latin(c: char) -> bool {
    matches!(c as u32, 0x00C0..=0x024F | 0x1E00..=0x1EFF)
}

/// Latin letters whose stroke is not a combining mark, so NFD leaves them alone.
fn stroked_latin_base(c: char) -> Option<char> {
    match c {
        'ø' => Some('o'),
        'Ø' => Some('O'),
        'ł' => Some('l'),
        'Ł' => Some('L'),
        'đ' => Some('d'),
        'Đ' => Some('D'),
        'ħ' => Some('h'),
        'Ħ' => Some('H'),
        'ŧ' => Some('t'),
        'Ŧ' => Some('T'),
        _ => None,
    }
}

/// Collapse whitespace runs and trim.
pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").trim().to_string()
}

/// Trim, drop one trailing dash, trim again: "Neon Moon -" → "Neon Moon"
fn strip_trailing_dash(s: &str) -> String {
    let trimmed = s.trim();
    trimmed.strip_suffix('-').unwrap_or(trimmed).trim().to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Delete every `(...)`, `[...]` and `{...}` span, then collapse whitespace.
/// e.g., "Song (feat. X) [Remix]" → "Song"
pub fn remove_brackets(s: &str) -> String {
    let mut result = s.to_string();
    for pattern in BRACKET_SPANS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }
    collapse_whitespace(&result)
}

/// Cut a featured-artist credit: "Song feat. Someone" → "Song"
pub fn remove_featuring(s: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `s`
    let lower = s.to_ascii_lowercase();

    for marker in FEATURING_MARKERS {
        if let Some(idx) = lower.rfind(marker) {
            return s[..idx].trim().to_string();
        }
    }

    s.to_string()
}

/// Strip a "with" credit.
/// e.g., "Neon Moon - with Kacey Musgraves" → "Neon Moon", "With You" → "You"
pub fn remove_with(s: &str) -> String {
    let lower = s.to_ascii_lowercase();

    if lower.starts_with("with ") {
        let rest = &s[5..];
        if !rest.trim().is_empty() {
            return strip_trailing_dash(rest);
        }
    }

    // Only the last "with" is considered, and only when text follows it
    if let Some(m) = WITH_WORD.find_iter(s).last() {
        if !s[m.end()..].trim().is_empty() {
            return strip_trailing_dash(&s[..m.start()]);
        }
    }

    s.to_string()
}

/// Lowercase and turn each " - " segment after the first into a parenthetical.
/// e.g., "Mood Ring - Pride Remix" → "mood ring (pride remix)"
pub fn normalize_title(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut parts = lower.split(" - ");

    let mut result = parts.next().unwrap_or_default().to_string();
    for part in parts {
        result.push_str(" (");
        result.push_str(part.trim());
        result.push(')');
    }

    collapse_whitespace(&result)
}

/// Remove the first matching edit/version/soundtrack suffix.
/// e.g., "the lakes - bonus track" → "the lakes"
///
/// Checked in list order, first hit wins: `COMMON_SUFFIXES`, then
/// `YEAR_REMASTERED`, then `SOUNDTRACK_MARKERS`. Not applied recursively.
pub fn remove_common_suffixes(s: &str) -> String {
    let lower = s.to_ascii_lowercase();

    for suffix in COMMON_SUFFIXES {
        if lower.ends_with(suffix) {
            return strip_trailing_dash(&s[..s.len() - suffix.len()]);
        }
    }

    for pattern in YEAR_REMASTERED.iter() {
        if let Some(m) = pattern.find(s) {
            return strip_trailing_dash(&s[..m.start()]);
        }
    }

    for marker in SOUNDTRACK_MARKERS {
        if let Some(idx) = lower.find(marker) {
            if idx > 0 {
                return strip_trailing_dash(&s[..idx]);
            }
        }
    }

    s.to_string()
}

/// Map visually-equivalent Unicode punctuation to ASCII.
/// e.g., "Chloe × Halle" → "Chloe x Halle", "Don’t Stop…" → "Don't Stop..."
pub fn normalize_punctuation(s: &str) -> String {
    s.replace(['\u{2010}', '\u{2011}', '\u{2013}', '\u{2014}', '\u{2015}'], "-") // Hyphens, en/em dash, horizontal bar
        .replace('\u{00D7}', "x") // Multiplication sign
        .replace(['\u{2018}', '\u{2019}', '\u{2032}', '\u{0060}'], "'") // Curly singles, prime, grave
        .replace(['\u{201C}', '\u{201D}'], "\"") // Curly doubles
        .replace('\u{2026}', "...") // Ellipsis
}

/// Strip diacritics from Latin letters, leaving other scripts untouched.
/// e.g., "Beyoncé" → "Beyonce", "Røyksopp" → "Royksopp", "Кино" → "Кино"
pub fn normalize_accents(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for c in s.chars() {
        if let Some(base) = stroked_latin_base(c) {
            result.push(base);
        } else if is_extended_latin(c) {
            result.extend(std::iter::once(c).nfd().filter(|m| !is_combining_mark(*m)));
        } else {
            result.push(c);
        }
    }

    result
}

// ============================================================================
// NORMALIZER CATALOGUE
// ============================================================================

/// Named normalizer, so variant lists can be expressed as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalizer {
    Identity,
    RemoveBrackets,
    RemoveFeaturing,
    NormalizeTitle,
    RemoveWith,
    RemoveCommonSuffixes,
    NormalizePunctuation,
    NormalizeAccents,
}

impl Normalizer {
    pub fn apply(self, s: &str) -> String {
        match self {
            Normalizer::Identity => s.to_string(),
            Normalizer::RemoveBrackets => remove_brackets(s),
            Normalizer::RemoveFeaturing => remove_featuring(s),
            Normalizer::NormalizeTitle => normalize_title(s),
            Normalizer::RemoveWith => remove_with(s),
            Normalizer::RemoveCommonSuffixes => remove_common_suffixes(s),
            Normalizer::NormalizePunctuation => normalize_punctuation(s),
            Normalizer::NormalizeAccents => normalize_accents(s),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Normalizer::Identity => "original",
            Normalizer::RemoveBrackets => "brackets removed",
            Normalizer::RemoveFeaturing => "featuring removed",
            Normalizer::NormalizeTitle => "normalized title",
            Normalizer::RemoveWith => "'with' removed",
            Normalizer::RemoveCommonSuffixes => "suffixes removed",
            Normalizer::NormalizePunctuation => "punctuation normalized",
            Normalizer::NormalizeAccents => "accents normalized",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Normalizer; 8] = [
        Normalizer::Identity,
        Normalizer::RemoveBrackets,
        Normalizer::RemoveFeaturing,
        Normalizer::NormalizeTitle,
        Normalizer::RemoveWith,
        Normalizer::RemoveCommonSuffixes,
        Normalizer::NormalizePunctuation,
        Normalizer::NormalizeAccents,
    ];

    #[test]
    fn test_remove_brackets() {
        assert_eq!(remove_brackets("Song (feat. X) [Remix]"), "Song");
        assert_eq!(remove_brackets("Song {Live}  Version"), "Song Version");
        assert_eq!(remove_brackets("(Intro) Song"), "Song");
        assert_eq!(remove_brackets("No Brackets Here"), "No Brackets Here");
        assert_eq!(remove_brackets(""), "");
    }

    #[test]
    fn test_remove_featuring() {
        assert_eq!(remove_featuring("Song feat. Someone"), "Song");
        assert_eq!(remove_featuring("Song FEATURING Someone"), "Song");
        assert_eq!(remove_featuring("Artist ft Other"), "Artist");
        assert_eq!(remove_featuring("Artist Ft. Other"), "Artist");
        // Last occurrence of the first marker present
        assert_eq!(remove_featuring("A feat. B feat. C"), "A feat. B");
        // "(feat." has no leading space, so it is left for remove_brackets
        assert_eq!(remove_featuring("Song (feat. X)"), "Song (feat. X)");
        assert_eq!(remove_featuring("Often Left"), "Often Left");
    }

    #[test]
    fn test_remove_with() {
        assert_eq!(remove_with("Neon Moon - with Kacey Musgraves"), "Neon Moon");
        assert_eq!(remove_with("With You"), "You");
        assert_eq!(remove_with("Dancing WITH Myself"), "Dancing");
        // Never inside "without"/"within", never as the final token
        assert_eq!(remove_with("Song without with"), "Song without with");
        assert_eq!(remove_with("Within Temptation"), "Within Temptation");
        assert_eq!(remove_with("Stay With"), "Stay With");
        assert_eq!(remove_with("with"), "with");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("A - B - C"), "a (b) (c)");
        assert_eq!(
            normalize_title("Mood Ring (By Demand) - Pride Remix"),
            "mood ring (by demand) (pride remix)"
        );
        assert_eq!(normalize_title("Plain  Title"), "plain title");
        // Hyphenated words are not segments
        assert_eq!(normalize_title("Jay-Z Song"), "jay-z song");
    }

    #[test]
    fn test_remove_common_suffixes() {
        assert_eq!(remove_common_suffixes("the lakes - bonus track"), "the lakes");
        assert_eq!(remove_common_suffixes("Song Title"), "Song Title");
        assert_eq!(remove_common_suffixes("Spotlight - Single Edit"), "Spotlight");
        assert_eq!(remove_common_suffixes("Spotlight - Radio Edit"), "Spotlight");
        assert_eq!(remove_common_suffixes("Song Title - Live"), "Song Title");
        assert_eq!(remove_common_suffixes("Song (Acoustic)"), "Song");
        assert_eq!(remove_common_suffixes("Heroes - 2017 Remastered"), "Heroes");
        assert_eq!(remove_common_suffixes("Heroes (2017 Remastered)"), "Heroes");
        assert_eq!(
            remove_common_suffixes(r#"Shallow - From the Motion Picture "A Star Is Born""#),
            "Shallow"
        );
        assert_eq!(
            remove_common_suffixes(r#"Theme (Love Theme From "Romeo and Juliet")"#),
            "Theme"
        );
    }

    #[test]
    fn test_remove_common_suffixes_first_hit_only() {
        // Only one suffix is removed per call
        assert_eq!(remove_common_suffixes("Song - Live - Remix"), "Song - Live");
        // A marker at the very start is not a suffix
        assert_eq!(
            remove_common_suffixes("(From the Film) Overture"),
            "(From the Film) Overture"
        );
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_punctuation("Chloe × Halle"), "Chloe x Halle");
        assert_eq!(normalize_punctuation("Don’t Stop"), "Don't Stop");
        assert_eq!(normalize_punctuation("Rock ‘n’ Roll"), "Rock 'n' Roll");
        assert_eq!(normalize_punctuation("“Heroes”"), "\"Heroes\"");
        assert_eq!(normalize_punctuation("A – B — C ― D"), "A - B - C - D");
        assert_eq!(normalize_punctuation("Wait…"), "Wait...");
        assert_eq!(normalize_punctuation("Plain"), "Plain");
    }

    #[test]
    fn test_normalize_accents() {
        assert_eq!(normalize_accents("Beyoncé"), "Beyonce");
        assert_eq!(normalize_accents("Björk"), "Bjork");
        assert_eq!(normalize_accents("Mötley Crüe"), "Motley Crue");
        assert_eq!(normalize_accents("Sigur Rós"), "Sigur Ros");
        assert_eq!(normalize_accents("Røyksopp"), "Royksopp");
        assert_eq!(normalize_accents("Łona"), "Lona");
        assert_eq!(normalize_accents("ÇA VA"), "CA VA");
        // Non-Latin scripts stay as they are
        assert_eq!(normalize_accents("Кино"), "Кино");
        assert_eq!(normalize_accents("Йорш"), "Йорш");
        assert_eq!(normalize_accents("宇多田ヒカル"), "宇多田ヒカル");
    }

    #[test]
    fn test_empty_string_is_identity() {
        for normalizer in ALL {
            assert_eq!(normalizer.apply(""), "", "{}", normalizer.label());
        }
    }

    #[test]
    fn test_normalizers_are_idempotent() {
        let samples = [
            "Song (feat. X) [Remix]",
            "Neon Moon - with Kacey Musgraves",
            "Spotlight - Single Edit",
            "the lakes - bonus track",
            "Do It",
            "Beyoncé",
            "Chloe × Halle",
            "Don’t Stop…",
            "A - B - C",
            "Song without with",
            "Кино",
            "",
        ];

        for normalizer in ALL {
            for sample in samples {
                let once = normalizer.apply(sample);
                let twice = normalizer.apply(&once);
                assert_eq!(once, twice, "{} not idempotent on {:?}", normalizer.label(), sample);
            }
        }
    }
}
