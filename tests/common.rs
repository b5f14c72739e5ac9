use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Isolated home with a pre-seeded fresh release cache and an install dir,
/// so no command needs the network.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let install_dir = temp_dir.path().join("compatibilitytools.d");
        let cache_dir = temp_dir.path().join("cache");
        fs::create_dir_all(&install_dir).expect("Failed to create install dir");
        fs::create_dir_all(&cache_dir).expect("Failed to create cache dir");

        Self {
            _temp_dir: temp_dir,
            install_dir,
            cache_dir,
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_geprotondl")),
        }
    }

    /// Writes `releases.json` with one record per tag, newest first.
    pub fn seed_releases(&self, tags: &[&str]) {
        let records: Vec<_> = tags
            .iter()
            .map(|tag| {
                json!({
                    "url": format!("https://api.github.com/repos/GloriousEggroll/proton-ge-custom/releases/{}", tag),
                    "html_url": format!("https://github.com/GloriousEggroll/proton-ge-custom/releases/tag/{}", tag),
                    "author": { "login": "GloriousEggroll" },
                    "name": format!("{} Released", tag),
                    "tag_name": tag,
                    "published_at": "2024-03-01T10:00:00Z",
                    "created_at": "2024-02-29T08:00:00Z",
                    "body": "Changelog\n- fixes",
                    "assets": [
                        {
                            "content_type": "application/octet-stream",
                            "name": format!("{}.sha512sum", tag),
                            "browser_download_url": format!("http://127.0.0.1:9/{}.sha512sum", tag),
                            "size": 160
                        },
                        {
                            "content_type": "application/gzip",
                            "name": format!("{}.tar.gz", tag),
                            "browser_download_url": format!("http://127.0.0.1:9/{}.tar.gz", tag),
                            "size": 4096
                        }
                    ]
                })
            })
            .collect();
        fs::write(
            self.cache_dir.join("releases.json"),
            serde_json::to_vec(&records).expect("Failed to encode records"),
        )
        .expect("Failed to seed release cache");
    }

    pub fn add_install(&self, tag: &str) -> PathBuf {
        let dir = self.install_dir.join(tag);
        fs::create_dir_all(dir.join("protonfixes")).expect("Failed to create install");
        fs::write(dir.join("proton"), "#!/usr/bin/env python3\n").expect("Failed to write proton");
        fs::write(dir.join("version"), format!("1709200000 {}\n", tag))
            .expect("Failed to write version");
        dir
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_CACHE_HOME", self._temp_dir.path().join("xdg-cache"));
        cmd.env("GEPROTONDL_DIR", &self.install_dir);
        cmd.env("GEPROTONDL_CACHE_DIR", &self.cache_dir);
        cmd.env("GEPROTONDL_SOURCE_URL", "http://127.0.0.1:9/releases");
        cmd.env("GEPROTONDL_TIMEOUT", "2");
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Runs with `input` piped to stdin.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> CommandOutput {
        let mut child = self
            .cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to run geprotondl");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
        child
            .wait_with_output()
            .expect("Failed to wait for geprotondl")
            .into()
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run geprotondl")
            .into()
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        self.assert_code(0)
    }

    pub fn assert_code(&self, code: i32) -> &Self {
        if self.status.code() != Some(code) {
            panic!(
                "Expected exit code {}, got {:?}\nstdout: {}\nstderr: {}",
                code,
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
