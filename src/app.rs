use crate::cli::{Cli, Shown};
use crate::config::Config;
use crate::error::Error;
use crate::install::{InstallOutcome, Installer};
use crate::interface::{Answer, Interface};
use crate::listing::Listing;
use crate::local::LocalInstalls;
use crate::present::{print_install_listing, print_release_listing, release_summary};
use crate::releases::ReleaseCache;
use crate::select::{Resolved, Resolver, Selection, Target};
use crate::types::TAG_PREFIX;
use anyhow::{bail, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Failed after the reason was already reported, or silently by design.
    Failure,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Remove,
    Test,
    Browse,
}

impl Mode {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.install {
            Mode::Install
        } else if cli.remove {
            Mode::Remove
        } else if cli.test {
            Mode::Test
        } else {
            Mode::Browse
        }
    }
}

pub struct App {
    config: Config,
    ui: Interface,
    mode: Mode,
    shown: Shown,
    tag: Option<String>,
    summary: bool,
    force: bool,
    print_dir: bool,
    print_cache: bool,
}

impl App {
    pub fn new(cli: &Cli, config: Config) -> Self {
        let ui = Interface::new(config.settings.clone());
        Self::with_interface(cli, config, ui)
    }

    pub fn with_interface(cli: &Cli, config: Config, ui: Interface) -> Self {
        Self {
            config,
            ui,
            mode: Mode::from_cli(cli),
            shown: cli.shown(),
            tag: cli.tag.clone(),
            summary: cli.summary,
            force: cli.force,
            print_dir: cli.print_dir,
            print_cache: cli.print_cache,
        }
    }

    pub async fn run(&mut self) -> Result<Outcome> {
        if self.print_dir {
            self.print_location("dir", &self.config.install_dir);
        }
        if self.print_cache {
            self.print_location("cache", &self.config.cache_dir);
        }
        if self.mode == Mode::Browse && self.shown == Shown::Nothing && !self.summary {
            if !self.print_dir && !self.print_cache {
                tracing::info!("Nothing to do. See --help for available options.");
            }
            return Ok(Outcome::Success);
        }

        let installs = LocalInstalls::scan(&self.config.install_dir)?;
        let mut releases = ReleaseCache::new(self.config.cache_file(), self.config.source_url.clone());
        tracing::debug!("Release database: {}", releases.path().display());
        match releases.load(self.force).await {
            Ok(()) => {}
            // Removal works from the local listing alone
            Err(e) if self.mode == Mode::Remove => {
                tracing::warn!("Release database unavailable: {}", e);
            }
            Err(e) => return Err(e.into()),
        }

        let choice = match self.choose(&releases, &installs)? {
            Some(Ok(selection)) => Some(selection),
            Some(Err(outcome)) => return Ok(outcome),
            None => None,
        };
        let selection = choice.unwrap_or_else(|| match &self.tag {
            Some(tag) => Selection::Tag(tag.clone()),
            None => Selection::Default,
        });

        let target = if self.mode == Mode::Remove {
            Target::Installs
        } else {
            Target::Releases
        };
        let limit = self.config.settings.max_entries;
        let resolved = Resolver::new(&releases, &installs, target, limit).resolve(selection)?;
        tracing::debug!("Selected {}", resolved.tag_name());
        if let Some(entry) = resolved.release() {
            tracing::debug!("Release record {} by {}", entry.json_url, entry.author);
        }

        if self.summary {
            match resolved.release() {
                Some(entry) => println!("{}", release_summary(entry, self.ui.settings())),
                None => tracing::warn!("No release information for {}", resolved.tag_name()),
            }
        }

        match self.mode {
            Mode::Test => Ok(self.test(&resolved, &installs)),
            Mode::Install => self.install(&resolved).await,
            Mode::Remove => self.remove(resolved, &installs),
            Mode::Browse => Ok(Outcome::Success),
        }
    }

    fn print_location(&self, label: &str, path: &Path) {
        if self.ui.settings().compact {
            println!("{}", path.display());
        } else {
            println!("{} {}", label, path.display());
        }
    }

    /// Prints the requested listing and, when no tag was given and the mode
    /// needs one, asks for a number. `Some(Err(_))` ends the run early.
    fn choose(
        &mut self,
        releases: &ReleaseCache,
        installs: &LocalInstalls,
    ) -> Result<Option<std::result::Result<Selection, Outcome>>> {
        let wants_choice = self.tag.is_none();
        let limit = self.config.settings.max_entries;

        match self.shown {
            Shown::Nothing => Ok(None),
            Shown::Installs => {
                print_install_listing(&self.ui, installs);
                if !wants_choice || installs.is_empty() {
                    return Ok(None);
                }
                if self.mode == Mode::Remove {
                    return Ok(Some(self.ask_index("Remove").map(Selection::Index)));
                }
                if !(self.summary || self.mode == Mode::Test) {
                    return Ok(None);
                }
                let index = match self.ask_index("Choose") {
                    Ok(index) => index,
                    Err(outcome) => return Ok(Some(Err(outcome))),
                };
                // Local picks are looked up again in the release database
                let install = installs
                    .by_index(index, limit)
                    .ok_or_else(|| Error::EntryNotFound(format!("index {}", index)))?;
                Ok(Some(Ok(Selection::Tag(install.tag_name))))
            }
            Shown::Releases => {
                print_release_listing(&self.ui, releases, installs);
                if !wants_choice || releases.is_empty() {
                    return Ok(None);
                }
                let verb = match self.mode {
                    Mode::Install => "Install",
                    Mode::Test => "Choose",
                    _ if self.summary => "Choose",
                    _ => return Ok(None),
                };
                Ok(Some(self.ask_index(verb).map(Selection::Index)))
            }
        }
    }

    fn ask_index(&mut self, verb: &str) -> std::result::Result<i64, Outcome> {
        let question = if self.ui.settings().compact {
            format!("{}:", verb)
        } else {
            format!("\nEnter number to {}:", verb.to_lowercase())
        };
        match self.ui.ask_number(&question) {
            Answer::Number(index) => Ok(index),
            Answer::Invalid | Answer::TimedOut => Err(Outcome::Failure),
        }
    }

    /// Prints the tag when it was picked from a listing or is not installed
    /// yet. An installed tag fails without output.
    fn test(&self, resolved: &Resolved, installs: &LocalInstalls) -> Outcome {
        let tag = resolved.tag_name();
        if self.shown == Shown::Nothing && installs.contains(tag) {
            return Outcome::Failure;
        }
        if self.ui.settings().compact {
            println!("{}", tag.replace(TAG_PREFIX, ""));
        } else {
            println!("{}", tag);
        }
        Outcome::Success
    }

    async fn install(&mut self, resolved: &Resolved) -> Result<Outcome> {
        let Some(entry) = resolved.release() else {
            bail!("No release information for {}", resolved.tag_name());
        };
        let installer = Installer::new(&self.config.install_dir);
        match installer.install(entry, self.force, &mut self.ui).await? {
            InstallOutcome::Installed(path) => {
                tracing::debug!("Installed into {}", path.display());
                Ok(Outcome::Success)
            }
            InstallOutcome::Cancelled => Ok(Outcome::Cancelled),
        }
    }

    fn remove(&mut self, resolved: Resolved, installs: &LocalInstalls) -> Result<Outcome> {
        let install = match resolved {
            Resolved::Local { install, .. } => install,
            Resolved::Release(entry) => bail!("{} is not a local installation", entry.tag_name),
        };

        let mut message = format!("-Remove: {}", install.tag_name);
        if !self.ui.settings().compact {
            message.push_str(&format!("\n\t{}/\n", install.path.display()));
        }
        tracing::info!("{}", message);

        if !self.ui.ask_to_proceed(None) {
            return Ok(Outcome::Cancelled);
        }
        installs.remove(&install)?;
        tracing::info!("Done.");
        Ok(Outcome::Success)
    }
}
