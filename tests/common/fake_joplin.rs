//! A shell script that behaves enough like the Joplin client for end-to-end
//! runs of the `jbak` binary.
#![allow(dead_code)]
//!
//! Behavior is keyed on the configured username:
//! - containing `broken`: `sync` exits 1
//! - containing `empty`: `export` prints "No data to export" and exits 1
//! - anything else: every command succeeds and `export` writes the file
//!
//! Every invocation is appended to `calls.log`. Configuring a username while
//! the profile still holds another one appends `VIOLATION` instead.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const SCRIPT: &str = r#"#!/bin/sh
log="$FAKE_JOPLIN_LOG"
[ "$1" = "--profile" ] || { echo "missing --profile" >&2; exit 2; }
profile="$2"
shift 2
mkdir -p "$profile"
echo "$*" >> "$log"
user=""
[ -f "$profile/user" ] && user=$(cat "$profile/user")

case "$1" in
  config)
    if [ "$2" = "sync.9.username" ]; then
      if [ -n "$user" ] && [ "$user" != "$3" ]; then echo "VIOLATION" >> "$log"; fi
      echo "$3" > "$profile/user"
    fi
    ;;
  sync)
    case "$user" in *broken*) echo "Error: Invalid username or password" >&2; exit 1 ;; esac
    echo "Synchronisation completed"
    ;;
  status)
    echo "Notes: 1/1"
    echo "Items: 2/2"
    ;;
  ls)
    echo "Welcome to Joplin"
    ;;
  export)
    case "$user" in *empty*) echo "Error: No data to export." >&2; exit 1 ;; esac
    echo "archive of $user" > "$2"
    ;;
  *)
    echo "unknown command $1" >&2
    exit 2
    ;;
esac
"#;

pub struct FakeJoplin {
    pub program: PathBuf,
    pub profile_dir: PathBuf,
    pub log: PathBuf,
}

impl FakeJoplin {
    /// Write the script into `dir` and make it executable.
    pub fn install(dir: &Path) -> Self {
        let program = dir.join("joplin");
        fs::write(&program, SCRIPT).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            program,
            profile_dir: dir.join("profile"),
            log: dir.join("calls.log"),
        }
    }

    /// Logged invocations, one string per call (without `--profile`).
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .filter(|l| *l != "VIOLATION")
            .map(str::to_string)
            .collect()
    }

    pub fn violations(&self) -> usize {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .filter(|l| *l == "VIOLATION")
            .count()
    }

    /// Environment for `jbak` pointing at this fake with no sync pauses.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("JBAK_TOOL", self.program.display().to_string()),
            ("JBAK_PROFILE_DIR", self.profile_dir.display().to_string()),
            ("JBAK_SYNC_DELAY", "0".to_string()),
            ("JBAK_SETTLE_DELAY", "0".to_string()),
            ("FAKE_JOPLIN_LOG", self.log.display().to_string()),
        ]
    }
}
