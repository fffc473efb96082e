//! Text helpers for the `rclone` command line.

use std::path::Path;

/// Parse `rclone listremotes` output (one `name:` per line).
pub fn parse_listremotes(stdout: &str) -> Vec<String> {
    let mut remotes: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(':').unwrap_or(line).to_string())
        .filter(|name| !name.is_empty())
        .collect();
    remotes.sort();
    remotes.dedup();
    remotes
}

/// Expand stored mount params into argv tokens.
///
/// Params may be stored one token per element (`["--buffer-size", "32M"]`)
/// or as a flag and its value in one string (`"--buffer-size 32M"`); the
/// latter is split at the first run of whitespace. Anything else is passed
/// through verbatim.
pub fn expand_params(params: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(params.len());
    for param in params {
        let trimmed = param.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.split_once(char::is_whitespace) {
            Some((flag, value)) if flag.starts_with('-') => {
                out.push(flag.to_string());
                out.push(value.trim_start().to_string());
            }
            _ => out.push(trimmed.to_string()),
        }
    }
    out
}

/// Arguments for `rclone mount <remote>: <target> <params...> [--daemon]`.
pub fn mount_args(remote: &str, target: &Path, params: &[String], daemon: bool) -> Vec<String> {
    let mut args = vec![
        "mount".to_string(),
        format!("{remote}:"),
        target.display().to_string(),
    ];
    args.extend(expand_params(params));
    if daemon && !args.iter().any(|a| a == "--daemon") {
        args.push("--daemon".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn listremotes_strips_colons_and_blank_lines() {
        let out = "gdrive:\n\nonedrive:\n  s3-backup:  \ngdrive:\n";
        assert_eq!(
            parse_listremotes(out),
            vec!["gdrive", "onedrive", "s3-backup"]
        );
    }

    #[test]
    fn listremotes_empty_output() {
        assert!(parse_listremotes("").is_empty());
        assert!(parse_listremotes("\n:\n").is_empty());
    }

    #[test]
    fn expand_params_splits_flag_value_strings() {
        let params = vec![
            "--vfs-cache-mode full".to_string(),
            "--buffer-size".to_string(),
            "32M".to_string(),
            "--allow-other".to_string(),
        ];
        assert_eq!(
            expand_params(&params),
            vec![
                "--vfs-cache-mode",
                "full",
                "--buffer-size",
                "32M",
                "--allow-other"
            ]
        );
    }

    #[test]
    fn mount_args_appends_daemon_once() {
        let target = PathBuf::from("/home/me/mnt/gdrive");
        let args = mount_args("gdrive", &target, &["--daemon".to_string()], true);
        assert_eq!(
            args,
            vec!["mount", "gdrive:", "/home/me/mnt/gdrive", "--daemon"]
        );

        let args = mount_args("gdrive", &target, &[], false);
        assert_eq!(args, vec!["mount", "gdrive:", "/home/me/mnt/gdrive"]);
    }
}
