use crate::cli::{Cli, Shown};
use crate::releases::CACHE_FILE_NAME;
use crate::source::default_source_url;
use crate::types::Settings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "geprotondl";
pub const COMPAT_DIR_NAME: &str = "compatibilitytools.d";
pub const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 20;

const STEAM_ROOTS: &[&str] = &[
    ".local/share/Steam",
    ".steam/root",
    ".steam/steam",
    ".var/app/com.valvesoftware.Steam/data/Steam",
    "snap/steam/common/.steam/root",
];

/// Everything one invocation needs, resolved from flags, env and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub source_url: String,
    pub settings: Settings,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let install_dir = match cli.dir.as_deref().map(expand_home) {
            Some(dir) => dir,
            None => env_path("GEPROTONDL_DIR")
                .or_else(default_install_dir)
                .ok_or_else(|| {
                    anyhow!("Could not find a Steam installation. Set the install dir with --dir.")
                })?,
        };
        tracing::debug!("Install directory: {}", install_dir.display());

        let cache_dir = match cli.cache.as_deref().map(expand_home) {
            Some(dir) => dir,
            None => match env_path("GEPROTONDL_CACHE_DIR") {
                Some(dir) => dir,
                None => default_cache_dir()?,
            },
        };
        tracing::debug!("Cache directory: {}", cache_dir.display());

        let source_url = std::env::var("GEPROTONDL_SOURCE_URL").unwrap_or_else(|_| default_source_url());

        let prompt_timeout = std::env::var("GEPROTONDL_TIMEOUT")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PROMPT_TIMEOUT_SECS);

        let settings = Settings {
            quiet: cli.quiet,
            assume_yes: cli.yes,
            prompt_timeout: Duration::from_secs(prompt_timeout),
            max_entries: max_entries(cli.max, cli.install, cli.shown() == Shown::Releases),
            compact: cli.brief,
            human_readable: cli.human,
        };

        Ok(Self {
            install_dir,
            cache_dir,
            source_url,
            settings,
        })
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }
}

/// Listing limit: explicit value, else 9 for release listings and 999 for
/// local ones, which are usually short.
pub fn max_entries(limit: Option<usize>, install_mode: bool, show_releases: bool) -> usize {
    match limit {
        Some(limit) if limit > 0 => limit,
        _ if install_mode || show_releases => 9,
        _ => 999,
    }
}

/// First existing Steam root, joined with `compatibilitytools.d`.
pub fn default_install_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    find_install_dir(&home)
}

fn find_install_dir(home: &Path) -> Option<PathBuf> {
    STEAM_ROOTS
        .iter()
        .map(|root| home.join(root))
        .find(|root| root.is_dir())
        .map(|root| root.join(COMPAT_DIR_NAME))
}

pub fn default_cache_dir() -> Result<PathBuf> {
    let path = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join(APP_NAME);
    Ok(path)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(|value| expand_home(Path::new(&value)))
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_max_entries() {
        assert_eq!(max_entries(None, true, false), 9);
        assert_eq!(max_entries(None, false, true), 9);
        assert_eq!(max_entries(None, false, false), 999);
        assert_eq!(max_entries(Some(0), false, false), 999);
        assert_eq!(max_entries(Some(3), true, false), 3);
    }

    #[test]
    fn test_find_install_dir_prefers_first_root() {
        let home = TempDir::new().unwrap();
        assert_eq!(find_install_dir(home.path()), None);

        fs::create_dir_all(home.path().join(".steam/steam")).unwrap();
        assert_eq!(
            find_install_dir(home.path()),
            Some(home.path().join(".steam/steam").join(COMPAT_DIR_NAME))
        );

        fs::create_dir_all(home.path().join(".local/share/Steam")).unwrap();
        assert_eq!(
            find_install_dir(home.path()),
            Some(home.path().join(".local/share/Steam").join(COMPAT_DIR_NAME))
        );
    }

    #[test]
    fn test_explicit_dirs_win() {
        let cli = Cli {
            dir: Some(PathBuf::from("/opt/compat")),
            cache: Some(PathBuf::from("/tmp/geprotondl-cache")),
            install: true,
            ..Cli::default()
        };
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.install_dir, PathBuf::from("/opt/compat"));
        assert_eq!(
            config.cache_file(),
            PathBuf::from("/tmp/geprotondl-cache").join(CACHE_FILE_NAME)
        );
        assert_eq!(config.settings.max_entries, 9);
    }

    #[test]
    fn test_listing_limit_follows_shown_listing() {
        let limit = |args: &[&str]| {
            let mut argv = vec!["geprotondl", "-D", "/opt/compat", "-C", "/tmp/geprotondl-cache"];
            argv.extend_from_slice(args);
            let cli = <Cli as clap::Parser>::try_parse_from(argv).unwrap();
            Config::from_cli(&cli).unwrap().settings.max_entries
        };
        assert_eq!(limit(&["-r", "-L"]), 999);
        assert_eq!(limit(&["-r", "-l"]), 999);
        assert_eq!(limit(&["-i", "-l"]), 9);
        assert_eq!(limit(&["-L"]), 9);
        assert_eq!(limit(&["-r", "-L", "-m", "2"]), 2);
    }

    #[test]
    fn test_expand_home() {
        let absolute = Path::new("/var/lib/steam");
        assert_eq!(expand_home(absolute), absolute.to_path_buf());
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/games")), home.join("games"));
        }
    }
}
