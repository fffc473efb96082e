//! CLI argument parsing for rmount

use crate::settings::SettingsOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rmount", version)]
#[command(about = "Mount and unmount rclone remotes")]
#[command(long_about = "Mount and unmount rclone remotes.\n\n\
    Mount points and rclone mount options are remembered per remote in a small\n\
    JSON registry. Use `all` as the remote name to act on every remote, e.g. from\n\
    a login or shutdown unit.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show what would be done without mounting, unmounting or writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Directory holding default mount points (<base-dir>/<remote>)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Mount registry file (JSON)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Settings file (TOML) instead of ~/.config/rmount/config.toml
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            base_dir: self.base_dir.clone(),
            registry: self.registry.clone(),
            settings_file: self.settings.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mount a remote, or `all` remotes
    Mount {
        /// Remote name, or `all`
        remote: String,

        /// Mount at this path with the baseline options (single remote only)
        path: Option<PathBuf>,
    },

    /// Unmount a remote, or `all` mounted remotes
    #[command(alias = "umount")]
    Unmount {
        /// Remote name, or `all`
        remote: String,
    },

    /// List remotes with their mount status and mount point
    List,

    /// Run `rclone config` and record a mount entry for every remote
    Config {
        /// Run `rclone config` even if a registry already exists
        #[arg(long)]
        force: bool,

        /// Remote whose entry should be changed
        #[arg(long)]
        remote: Option<String>,

        /// Mount point for --remote
        #[arg(long, requires = "remote")]
        mount_point: Option<PathBuf>,

        /// rclone mount option for --remote (repeatable; replaces stored options)
        #[arg(long = "param", requires = "remote", allow_hyphen_values = true)]
        params: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mount_with_explicit_path() {
        let cli = Cli::try_parse_from(["rmount", "mount", "gdrive", "/data/gdrive"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Mount {
                remote: "gdrive".into(),
                path: Some(PathBuf::from("/data/gdrive")),
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["rmount", "umount", "all", "--dry-run", "--base-dir", "/m"])
                .unwrap();
        assert_eq!(
            cli.command,
            Command::Unmount {
                remote: "all".into()
            }
        );
        let overrides = cli.overrides();
        assert!(overrides.dry_run);
        assert_eq!(overrides.base_dir, Some(PathBuf::from("/m")));
    }

    #[test]
    fn config_params_accept_leading_dashes() {
        let cli = Cli::try_parse_from([
            "rmount",
            "config",
            "--remote",
            "gdrive",
            "--param",
            "--read-only",
            "--param",
            "--buffer-size 64M",
        ])
        .unwrap();
        match cli.command {
            Command::Config { remote, params, .. } => {
                assert_eq!(remote.as_deref(), Some("gdrive"));
                assert_eq!(params, vec!["--read-only", "--buffer-size 64M"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_mount_point_requires_remote() {
        assert!(Cli::try_parse_from(["rmount", "config", "--mount-point", "/x"]).is_err());
    }
}
