//! Command-line argument parsing.
//!
//! Kept deliberately small: a URL, an optional poll period, and the usual
//! version/help flags.

use std::time::Duration;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run the console
    Run(RunOptions),
    /// Arguments did not parse
    Invalid(String),
}

/// Options for a console run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Proxy base URL, possibly carrying an `mwi_auth_token` query
    /// parameter.
    pub url: String,
    /// Seconds between status polls.
    pub poll_period: Option<Duration>,
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use proxydeck::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["proxydeck".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut url = None;
    let mut poll_period = None;

    let mut args = args.skip(1); // skip the program name
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--poll-period" => {
                let Some(value) = args.next() else {
                    return CliCommand::Invalid("--poll-period needs a value".to_string());
                };
                match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => poll_period = Some(Duration::from_secs(secs)),
                    _ => {
                        return CliCommand::Invalid(format!(
                            "invalid poll period {value:?}: expected a positive number of seconds"
                        ))
                    }
                }
            }
            other if other.starts_with('-') => {
                return CliCommand::Invalid(format!("unknown flag {other:?}"));
            }
            other => {
                if url.replace(other.to_string()).is_some() {
                    return CliCommand::Invalid("more than one proxy URL given".to_string());
                }
            }
        }
    }

    match url {
        Some(url) => CliCommand::Run(RunOptions { url, poll_period }),
        None => CliCommand::Invalid("missing proxy URL".to_string()),
    }
}

/// Usage text for `--help` and argument errors.
pub fn usage() -> &'static str {
    "Usage: proxydeck [--poll-period SECONDS] PROXY_URL\n\n\
     PROXY_URL may carry an mwi_auth_token query parameter; it is consumed\n\
     on startup and never displayed.\n\n\
     Flags:\n\
       --poll-period SECONDS   status poll period (default 5)\n\
       -V, --version           print version\n\
       -h, --help              this text"
}
