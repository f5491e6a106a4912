//! Explain how one Spotify track scores against one Plex candidate
//!
//! Usage: explain-match --title <t> --artist <a> --candidate-title <t> --candidate-artist <a>

use anyhow::Result;
use clap::Parser;

use plexify_match::matcher::{clears_threshold, guard_verdict, GuardVerdict, Matcher};
use plexify_match::models::{CandidateTrack, SearchTarget};
use plexify_match::scoring::{
    combined_score, compare_variants, confidence_breakdown, VariantComparison,
    SELECTOR_ARTIST_VARIANTS, SELECTOR_TITLE_VARIANTS,
};

#[derive(Parser)]
#[command(name = "explain-match")]
#[command(about = "Show per-normalizer similarities, guards and confidence for one pair")]
struct Args {
    /// Spotify title
    #[arg(long)]
    title: String,

    /// Spotify artist
    #[arg(long)]
    artist: String,

    /// Plex candidate title
    #[arg(long)]
    candidate_title: String,

    /// Plex candidate artist
    #[arg(long)]
    candidate_artist: String,

    /// Also print matcher traces
    #[arg(long, env = "PLEXIFY_DEBUG")]
    debug: bool,
}

fn print_table(field: &str, rows: &[VariantComparison]) -> f64 {
    println!("\n{} similarity", field);
    println!("{:-<60}", "");
    let mut best = 0.0_f64;
    for row in rows {
        println!(
            "  {:<24} {:.3}  '{}' vs '{}'",
            row.via.label(),
            row.similarity,
            row.target,
            row.candidate
        );
        best = best.max(row.similarity);
    }
    println!("  {:<24} {:.3}", "best", best);
    best
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    clog.filter(None, level);
    clog.init();

    let target = SearchTarget::new(args.title.as_str(), args.artist.as_str());
    let candidate = CandidateTrack::new(
        "",
        args.candidate_title.as_str(),
        args.candidate_artist.as_str(),
        "",
    );

    println!("Target:    '{}' by '{}'", target.title, target.artist);
    println!("Candidate: '{}' by '{}'", candidate.title, candidate.artist);

    let title_rows = compare_variants(&target.title, &candidate.title, &SELECTOR_TITLE_VARIANTS);
    let artist_rows = compare_variants(&target.artist, &candidate.artist, &SELECTOR_ARTIST_VARIANTS);
    let title = print_table("Title", &title_rows);
    let artist = print_table("Artist", &artist_rows);
    let combined = combined_score(title, artist);

    println!("\n{:=<60}", "");
    match guard_verdict(title, artist, &candidate.artist) {
        GuardVerdict::Pass => println!("Guards: pass"),
        GuardVerdict::VariousArtists => println!("Guards: fired, allowed for Various Artists"),
        GuardVerdict::Reject {
            title_above,
            artist_below,
        } => println!(
            "Guards: rejected (title > {} but artist < {})",
            title_above, artist_below
        ),
    }
    println!(
        "Selector score: {:.3} ({})",
        combined,
        if clears_threshold(combined) {
            "above threshold"
        } else {
            "below threshold"
        }
    );

    let breakdown = confidence_breakdown(&target, &candidate);
    println!(
        "Confidence: {:.3} (title {:.3} via {}, artist {:.3} via {})",
        breakdown.combined,
        breakdown.title.similarity,
        breakdown.title.via.label(),
        breakdown.artist.similarity,
        breakdown.artist.via.label()
    );

    let matcher = Matcher::new(args.debug);
    let selected = matcher.find_best_match(
        std::slice::from_ref(&candidate),
        &target.title,
        &target.artist,
    );
    println!(
        "Selected: {}",
        if selected.is_some() { "yes" } else { "no" }
    );
    println!("{:=<60}", "");

    Ok(())
}
