//! Command line argument parsing

use clap::Parser;
use std::path::PathBuf;

/// ryt-js - call a function from player JavaScript source
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JavaScript source file
    pub source: PathBuf,

    /// Name of the function to call
    #[arg(short, long, value_name = "NAME")]
    pub function: String,

    /// Argument as a JSON value, repeat for more arguments
    #[arg(short, long = "arg", value_name = "JSON")]
    pub args: Vec<String>,

    /// JSON file with interpreter options
    #[arg(long, value_name = "PATH")]
    pub options: Option<PathBuf>,

    /// Override the recursion budget
    #[arg(long, value_name = "N")]
    pub recursion_limit: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl VerbosityLevel {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_verbosity_level() {
        let args = Args::default();
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);

        let args = Args {
            quiet: true,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Quiet);

        let args = Args {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);
        assert_eq!(args.verbosity_level().default_filter(), "debug");
    }

    #[test]
    fn test_parse_repeated_args() {
        let args = Args::parse_from(["ryt-js", "player.js", "-f", "sig", "--arg", "\"abc\"", "--arg", "[1,2]"]);
        assert_eq!(args.source, PathBuf::from("player.js"));
        assert_eq!(args.function, "sig");
        assert_eq!(args.args, vec!["\"abc\"".to_string(), "[1,2]".to_string()]);
        assert!(args.options.is_none());
    }
}
