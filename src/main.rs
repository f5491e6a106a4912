//! Match Spotify playlist exports against a Plex music library dump.
//!
//! Each playlist track runs through the search cascade; the report lists the
//! Plex track chosen for every Spotify track and the tracks that are missing
//! from the library.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;

use plexify_match::matcher::Matcher;
use plexify_match::models::{SourcePlaylist, SyncStats};
use plexify_match::progress::{format_duration, ProgressMode};
use plexify_match::safety::validate_report_path;
use plexify_match::search::{LibraryIndex, TrackSearcher};
use plexify_match::sync::{
    best_library_match, load_playlist, missing_entry, PlaylistSync, SyncReport,
};

#[derive(Parser)]
#[command(name = "plexify-match")]
#[command(about = "Match Spotify playlist exports against a Plex music library dump")]
struct Args {
    /// Plex library dump (JSON array of {id, title, artist, album})
    #[arg(long, env = "PLEXIFY_LIBRARY")]
    library: PathBuf,

    /// Spotify playlist exports (JSON)
    #[arg(required = true)]
    playlists: Vec<PathBuf>,

    /// Log per-candidate scoring traces
    #[arg(long, env = "PLEXIFY_DEBUG")]
    debug: bool,

    /// Hide progress bars and log periodic progress lines instead
    #[arg(long)]
    log_only: bool,

    /// Compare punctuation-normalized text only, without title/artist variants
    #[arg(long)]
    punctuation_only: bool,

    /// Write merged sync stats to this JSON file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn init_logging(debug: bool) {
    let mut clog = colog::default_builder();
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    clog.filter(None, level);
    clog.init();
}

fn load_playlists(paths: &[PathBuf]) -> Result<Vec<SourcePlaylist>> {
    paths.iter().map(|path| load_playlist(path)).collect()
}

fn print_report(report: &SyncReport) {
    println!("\n{:=<60}", "");
    println!("Playlist: {} ({} tracks)", report.playlist_name, report.results.len());
    println!("{:=<60}", "");

    for (i, result) in report.results.iter().enumerate() {
        let source = &result.source;
        match &result.track {
            Some(track) => println!(
                "  {:>3}. MATCH {} - {} -> {} - {} [{:.2}, {}]",
                i + 1,
                source.artist,
                source.name,
                track.artist,
                track.title,
                result.confidence,
                result.strategy.map_or("unknown", |s| s.label())
            ),
            None => println!("  {:>3}. MISS  {} - {}", i + 1, source.artist, source.name),
        }
    }

    println!("\nDescription:\n{}", report.description);
}

fn print_missing(reports: &[SyncReport], library: &LibraryIndex) {
    let missing: Vec<_> = reports.iter().flat_map(|r| r.missing()).collect();
    if missing.is_empty() {
        return;
    }

    println!("\n{:=<60}", "");
    println!("Missing tracks ({})", missing.len());
    println!("{:=<60}", "");
    for (i, result) in missing.into_iter().enumerate() {
        let source = &result.source;
        println!("{}", missing_entry(i + 1, source));
        if let Some((closest, score)) = best_library_match(&source.target(), library.tracks()) {
            println!(
                "     Closest: '{}' by '{}' ({:.2})",
                closest.title, closest.artist, score
            );
        }
    }
}

fn print_summary(stats: &SyncStats, elapsed: std::time::Duration) {
    println!("\n{:=<60}", "");
    println!("Sync complete!");
    println!("  Playlists: {}", stats.playlists);
    println!("  Tracks: {}", stats.total_tracks);
    println!("  Matched: {} ({:.1}%)", stats.matched, stats.match_rate());
    println!("  Missing: {}", stats.missing);
    for (strategy, count) in &stats.matches_by_strategy {
        println!("    {}: {}", strategy, count);
    }
    if stats.source_errors > 0 {
        println!("  Search errors: {}", stats.source_errors);
    }
    println!("  Elapsed: {}", format_duration(elapsed));
    println!("{:=<60}", "");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    let progress = ProgressMode::from_log_only(args.log_only);

    // Refuse a bad report path before doing any work
    if let Some(report) = &args.report {
        let inputs: Vec<&Path> = std::iter::once(args.library.as_path())
            .chain(args.playlists.iter().map(PathBuf::as_path))
            .collect();
        validate_report_path(report, &inputs)?;
    }

    let start = Instant::now();

    let spinner = progress.spinner("Loading library");
    let library = LibraryIndex::from_json_file(&args.library)?;
    spinner.finish_and_clear();
    log::info!("Loaded {} library tracks from {:?}", library.len(), args.library);

    let playlists = load_playlists(&args.playlists)?;

    let searcher = TrackSearcher::new(&library, Matcher::new(args.debug))
        .punctuation_only(args.punctuation_only);
    let sync = PlaylistSync::new(searcher).progress(progress);

    let mut totals = SyncStats::default();
    let mut reports = Vec::with_capacity(playlists.len());
    for playlist in &playlists {
        let report = sync.sync(playlist);
        print_report(&report);
        totals.merge(&report.stats);
        reports.push(report);
    }

    print_missing(&reports, &library);
    print_summary(&totals, start.elapsed());
    totals.log_phase("FINAL");

    if let Some(path) = &args.report {
        totals
            .write_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report written to {:?}", path);
    }

    Ok(())
}
