use std::env;
use std::path::PathBuf;

use library::{Library, LibraryConfig, SkipPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let music_root = args
        .next()
        .or_else(|| env::var("MUSIC_ROOT").ok())
        .ok_or("MUSIC_ROOT not set and no path argument")?;
    let storage_path = args
        .next()
        .or_else(|| env::var("STORAGE_PATH").ok())
        .unwrap_or_else(|| ".cache".to_string());
    let artwork_path = args
        .next()
        .or_else(|| env::var("ARTWORK_PATH").ok())
        .unwrap_or_else(|| ".art".to_string());

    let library = Library::open(LibraryConfig {
        storage_path: PathBuf::from(&storage_path),
        artwork_path: PathBuf::from(&artwork_path),
        placeholder_path: PathBuf::from("resources/placeholder.png"),
        skip_policy: SkipPolicy::Log,
    })?;
    info!("Syncing {} into {}", music_root, storage_path);
    let report = library.sync(&PathBuf::from(&music_root))?;

    println!(
        "Indexed: {} tracks, {} albums ({} skipped, {} artwork failures) in {:.2}s, {} bytes",
        report.tracks,
        report.albums.len(),
        report.skipped,
        report.artwork_failures,
        report.summary.seconds,
        report.summary.size
    );

    Ok(())
}
