use clap::{ArgGroup, Parser};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds are tagged; everything else carries the commit
    if let Some(tag) = option_env!("GEPROTONDL_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("GEPROTONDL_GIT_COMMIT").unwrap_or("unknown");
    let version = format!("v{}-{}", BASE_VERSION, commit);
    Box::leak(version.into_boxed_str())
}

pub fn version_line() -> String {
    format!("geprotondl {}", get_version())
}

#[derive(Parser, Debug, Default)]
#[command(name = "geprotondl")]
#[command(about = "CLI to download latest or manage your GE-Proton for Steam")]
#[command(disable_version_flag = true)]
#[command(group(ArgGroup::new("mode").args(["install", "remove", "test", "update"])))]
#[command(group(ArgGroup::new("listing").args(["list", "releases"])))]
pub struct Cli {
    /// Show version information and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Folder to unpack and install GE-Proton into [default: Steam's compatibilitytools.d]
    #[arg(short = 'D', long, value_name = "DIR", help_heading = "Locations")]
    pub dir: Option<PathBuf>,

    /// Folder to save temporary cache files into [default: ~/.cache/geprotondl]
    #[arg(short = 'C', long, value_name = "DIR", help_heading = "Locations")]
    pub cache: Option<PathBuf>,

    /// Show path of install folder set by -D, can be combined with -b
    #[arg(short = 'd', long, help_heading = "Locations")]
    pub print_dir: bool,

    /// Show path of cache folder set by -C, can be combined with -b
    #[arg(short = 'c', long, help_heading = "Locations")]
    pub print_cache: bool,

    /// Download and unpack latest release, combine with -l or -T to choose from other available versions
    #[arg(short, long, help_heading = "Modes")]
    pub install: bool,

    /// Uninstall oldest local version, combine with -l or -T to choose from other available versions
    #[arg(short, long, help_heading = "Modes")]
    pub remove: bool,

    /// Show tag name if it's known in database and not installed locally, default to latest unless
    /// combined with -T, when -l or -L are active then always show selected tag name, can be
    /// combined with -b to output version number only
    #[arg(short, long, help_heading = "Modes")]
    pub test: bool,

    /// Install the latest release if it's new: runs "-t -q", "-s -H", "-i" and "-l -H" in turn,
    /// stopping at the first step that doesn't succeed. Only -D and -C are passed on
    #[arg(short = 'u', long, help_heading = "Modes")]
    pub update: bool,

    /// Select a specific version by tag name, as "GE-Proton7-53" or in short "7-53"
    #[arg(short = 'T', long, value_name = "NAME", help_heading = "Choose")]
    pub tag: Option<String>,

    /// Show local installed versions, but when combined with -i then show downloadable releases instead
    #[arg(short, long, help_heading = "Listing")]
    pub list: bool,

    /// Show downloadable releases, but when combined with -r then show local installed versions instead
    #[arg(short = 'L', long, help_heading = "Listing")]
    pub releases: bool,

    /// Limit max entries to show for listings, defaults to '9' for install and no limit otherwise
    #[arg(short, long, value_name = "NUM", help_heading = "Listing")]
    pub max: Option<usize>,

    /// Show description and meta information for selected version
    #[arg(short, long, help_heading = "Info")]
    pub summary: bool,

    /// Format certain numbers, dates and entire structures into human readable presentation
    #[arg(short = 'H', long, help_heading = "Info")]
    pub human: bool,

    /// Reduce some output to be compact, create excerpts from long descriptions
    #[arg(short, long, help_heading = "Info")]
    pub brief: bool,

    /// Suppress most informal and error messages, hide interface parts providing additional context
    #[arg(short, long, help_heading = "Info")]
    pub quiet: bool,

    /// Print debug logging to stderr
    #[arg(long, help_heading = "Info")]
    pub verbose: bool,

    /// Skip checksum verification, re-download database and files, re-install and overwrite
    /// existing version
    #[arg(short, long, help_heading = "Control")]
    pub force: bool,

    /// Don't ask to proceed for download, install or remove, assume reply yes
    #[arg(short = 'y', long, help_heading = "Control")]
    pub yes: bool,
}

/// Which listing an invocation prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    Nothing,
    Installs,
    Releases,
}

impl Cli {
    /// `-l` with `-i` lists releases and `-L` with `-r` lists installs, so the
    /// listing always matches what the mode acts on.
    pub fn shown(&self) -> Shown {
        match (self.list, self.releases) {
            (true, _) if self.install => Shown::Releases,
            (_, true) if self.remove => Shown::Installs,
            (true, _) => Shown::Installs,
            (_, true) => Shown::Releases,
            _ => Shown::Nothing,
        }
    }

    /// The invocations `--update` runs, in order, each with this one's
    /// locations.
    pub fn update_steps(&self) -> Vec<Cli> {
        let step = |cli: Cli| Cli {
            dir: self.dir.clone(),
            cache: self.cache.clone(),
            verbose: self.verbose,
            ..cli
        };
        vec![
            step(Cli {
                test: true,
                quiet: true,
                ..Cli::default()
            }),
            step(Cli {
                summary: true,
                human: true,
                ..Cli::default()
            }),
            step(Cli {
                install: true,
                ..Cli::default()
            }),
            step(Cli {
                list: true,
                human: true,
                ..Cli::default()
            }),
        ]
    }
}
