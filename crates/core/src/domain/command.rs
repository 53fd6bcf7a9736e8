// Converted input paths and the resulting tool invocation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inputs after conversion into the job's `tmp/` directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedPaths {
    pub half1: PathBuf,
    pub half2: PathBuf,
    pub full: PathBuf,
    pub mask: Option<PathBuf>,
    /// Sampling rate of the full map, passed as `--apix`
    pub sampling_rate: f64,
}

/// Fully rendered invocation of the external tool
///
/// `activation` is the shell prefix that activates the tool's conda
/// environment; when present the runner goes through `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub activation: Option<String>,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Number of arguments that are `flag` or start with `flag=`
    pub fn flag_count(&self, flag: &str) -> usize {
        self.args.iter().filter(|a| matches_flag(a, flag)).count()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flag_count(flag) > 0
    }

    /// Value of the first `flag=value` argument
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args.iter().find_map(|a| {
            a.strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }

    /// `<program> <args...>` with shell quoting applied
    pub fn program_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(shell_quote(&self.program.to_string_lossy()));
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }

    /// Line handed to `sh -c`: `<activation> && <program> <args...>`
    pub fn to_shell_string(&self) -> String {
        match &self.activation {
            Some(activation) if !activation.trim().is_empty() => {
                format!("{} && {}", activation.trim(), self.program_line())
            }
            _ => self.program_line(),
        }
    }
}

fn matches_flag(arg: &str, flag: &str) -> bool {
    arg == flag
        || arg
            .strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='))
}

/// Single-quote `s` unless it only holds shell-safe characters
fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./,:+@%".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
