use crate::interface::Interface;
use crate::local::{LocalInstalls, VERSION_FILE};
use crate::releases::ReleaseCache;
use crate::source::project_page_url;
use crate::types::{ReleaseEntry, Settings};
use chrono::{DateTime, Local, Utc};
use std::fs;

/// "today", "yesterday", "N days ago" or "N days ahead".
pub fn days_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - time).num_days();
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d if d > 0 => format!("{} days ago", d),
        d => format!("{} days ahead", d.abs()),
    }
}

fn format_date(time: DateTime<Utc>, settings: &Settings) -> String {
    if settings.human_readable {
        days_ago(time, Utc::now())
    } else {
        time.with_timezone(&Local).date_naive().to_string()
    }
}

/// One line excerpt of a longer text.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let short: String = text.chars().take(max_chars).collect();
    format!("{}...", short.replace('\n', " "))
}

pub fn release_summary(entry: &ReleaseEntry, settings: &Settings) -> String {
    let sep = "\n";
    let (pre, date, size) = if settings.human_readable {
        (
            " o ",
            days_ago(entry.creation_time, Utc::now()),
            format!("{} MB", (entry.size as f64 / 1024.0 / 1024.0).round()),
        )
    } else {
        (
            "",
            entry.creation_time.to_string(),
            format!("{} Bytes", entry.size),
        )
    };

    if settings.compact {
        let desc = excerpt(&entry.description, 64);
        return [
            format!("{}{}", pre, entry.title),
            format!("{}{}", pre, desc),
            format!("{}Tag: {}", pre, entry.tag_name),
            format!("{}Date: {}", pre, date),
            format!("{}Size: {}", pre, size),
        ]
        .join(sep);
    }

    let (fmt, gap) = if settings.human_readable {
        ("\n\t", sep)
    } else {
        ("\t", "")
    };
    [
        format!("{}{}{}", pre, entry.title, gap),
        format!("{}{}{}", pre, entry.description, gap),
        format!("{}Releases Page:{}{}", pre, fmt, entry.html_url),
        format!("{}Tag Name:{}{}", pre, fmt, entry.tag_name),
        format!("{}Publish Date:{}{}", pre, fmt, date),
        format!("{}Download Size:{}{}", pre, fmt, size),
        format!("{}Download File:{}{}{}", pre, fmt, entry.download_url, gap),
    ]
    .join(sep)
}

/// Numbered listing of downloadable releases. Returns the number of lines.
pub fn print_release_listing(ui: &Interface, releases: &ReleaseCache, installs: &LocalInstalls) -> usize {
    let settings = ui.settings();
    let mut header = String::new();
    if !settings.compact {
        header.push_str("Available from: \n\t");
    }
    ui.print(&format!("{}{}", header, project_page_url()));
    if !settings.compact {
        ui.print(
            "\nsorted by newest release tag  --  shows day of publish\n\
             [x] = locally installed\n",
        );
    }

    let mut count = 0;
    for (index, entry) in releases.list(settings.max_entries).enumerate() {
        count = index + 1;
        let Some(entry) = entry else {
            println!("{:3}. (unreadable release record)", count);
            continue;
        };
        let mut line = format!("{:3}.", count);
        if !settings.compact {
            let marker = if installs.contains(&entry.tag_name) {
                "[x]"
            } else {
                "[ ]"
            };
            line.push(' ');
            line.push_str(marker);
        }
        line.push_str(&format!(" {}", entry.tag_name));
        if !settings.compact {
            line.push_str(&format!("  --  {}", format_date(entry.publish_time, settings)));
        }
        println!("{}", line);
    }
    count
}

/// Numbered listing of local installations. Returns the number of lines.
pub fn print_install_listing(ui: &Interface, installs: &LocalInstalls) -> usize {
    let settings = ui.settings();
    let mut header = String::new();
    if !settings.compact {
        header.push_str("Installed on: \n\t");
    }
    ui.print(&format!("{}{}", header, installs.basedir().display()));
    if !settings.compact {
        ui.print("\nsorted by oldest release tag  --  shows day of install\n");
    }

    let mut count = 0;
    for (index, install) in installs.list(settings.max_entries).enumerate() {
        count = index + 1;
        let mut line = format!("{:3}. {}", count, install.tag_name);
        if !settings.compact {
            let changed = fs::metadata(install.path.join(VERSION_FILE)).and_then(|m| m.modified());
            match changed {
                Ok(changed) => {
                    line.push_str(&format!("  --  {}", format_date(changed.into(), settings)))
                }
                Err(e) => tracing::error!(
                    "version file is missing for {}: {}",
                    install.path.display(),
                    e
                ),
            }
        }
        println!("{}", line);
    }
    count
}
