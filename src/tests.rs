use crate::cli::Cli;
use crate::config::{self, Config};
use crate::listing::Listing;
use crate::local::LocalInstalls;
use crate::releases::{ReleaseCache, CACHE_FILE_NAME};
use crate::select::{normalize_tag, Resolver, Selection, Target};
use crate::types::{ReleaseEntry, Settings};
use clap::Parser;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_settings_default() {
    let settings = Settings::default();
    assert!(!settings.quiet);
    assert!(!settings.assume_yes);
    assert_eq!(settings.prompt_timeout.as_secs(), config::DEFAULT_PROMPT_TIMEOUT_SECS);
    assert_eq!(settings.max_entries, 9);
}

#[test]
fn test_config_from_flags() {
    let cli = Cli::try_parse_from([
        "geprotondl",
        "-D",
        "/srv/steam/compatibilitytools.d",
        "-C",
        "/srv/cache",
        "-l",
        "-b",
        "-q",
    ])
    .unwrap();
    let config = Config::from_cli(&cli).unwrap();

    assert_eq!(config.install_dir.to_str(), Some("/srv/steam/compatibilitytools.d"));
    assert_eq!(config.cache_file(), std::path::Path::new("/srv/cache").join(CACHE_FILE_NAME));
    assert_eq!(config.settings.max_entries, 999);
    assert!(config.settings.compact);
    assert!(config.settings.quiet);
}

#[tokio::test]
async fn test_cache_and_registry_agree_on_tags() {
    let root = TempDir::new().unwrap();
    let cache_path = root.path().join(CACHE_FILE_NAME);
    let records = json!([
        {
            "url": "https://api.github.com/x",
            "html_url": "https://github.com/x",
            "author": { "login": "GloriousEggroll" },
            "name": "GE-Proton9-1",
            "tag_name": "GE-Proton9-1",
            "published_at": "2024-03-01T00:00:00Z",
            "created_at": "2024-02-29T00:00:00Z",
            "body": "",
            "assets": [
                {
                    "content_type": "application/gzip",
                    "name": "GE-Proton9-1.tar.gz",
                    "browser_download_url": "https://example.invalid/GE-Proton9-1.tar.gz",
                    "size": 1024
                }
            ]
        }
    ]);
    fs::write(&cache_path, records.to_string()).unwrap();

    let mut releases = ReleaseCache::new(cache_path, "http://127.0.0.1:9/unused");
    releases.load(false).await.unwrap();
    let basedir = root.path().join("compat");
    crate::local::tests::make_install(&basedir, "GE-Proton9-1");
    let installs = LocalInstalls::scan(&basedir).unwrap();

    let latest: Option<ReleaseEntry> = releases.by_index(1, 9);
    let latest = latest.unwrap();
    assert!(latest.is_installable());
    assert!(installs.contains(&latest.tag_name));

    let resolver = Resolver::new(&releases, &installs, Target::Installs, 999);
    let resolved = resolver
        .resolve(Selection::Tag(normalize_tag("9-1")))
        .unwrap();
    assert_eq!(resolved.release(), Some(&latest));
}
