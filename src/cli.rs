//! Command-line surface.
//!
//! Argument-count mistakes are reported by clap (exit code 2) before any
//! state is opened.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Posts shown by `browse` when no limit is given
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

#[derive(Parser, Debug)]
#[command(name = "gator", version, about = "RSS aggregator for the command line")]
pub struct Cli {
    /// Config file to use instead of ~/.gatorconfig.json
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a user and log in as them
    Register { name: String },
    /// Switch to an existing user
    Login { name: String },
    /// Delete every user, feed, follow and post
    Reset,
    /// List users
    Users,
    /// Collect feeds every INTERVAL (e.g. 30s, 1m, 1h30m) until Ctrl-C
    Agg {
        #[arg(value_name = "INTERVAL")]
        time_between_reqs: String,
    },
    /// Add a feed and follow it
    Addfeed { name: String, url: String },
    /// List all feeds
    Feeds,
    /// Follow an existing feed
    Follow { url: String },
    /// List the feeds you follow
    Following,
    /// Stop following a feed
    Unfollow { url: String },
    /// Show the newest posts from the feeds you follow
    Browse {
        #[arg(default_value_t = DEFAULT_BROWSE_LIMIT, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
}

impl Command {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register { .. } => "register",
            Command::Login { .. } => "login",
            Command::Reset => "reset",
            Command::Users => "users",
            Command::Agg { .. } => "agg",
            Command::Addfeed { .. } => "addfeed",
            Command::Feeds => "feeds",
            Command::Follow { .. } => "follow",
            Command::Following => "following",
            Command::Unfollow { .. } => "unfollow",
            Command::Browse { .. } => "browse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind as ClapErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gator").chain(args.iter().copied()))
    }

    #[test]
    fn test_parses_each_command() {
        assert_eq!(
            parse(&["register", "lane"]).unwrap().command,
            Command::Register { name: "lane".into() }
        );
        assert_eq!(parse(&["reset"]).unwrap().command, Command::Reset);
        assert_eq!(
            parse(&["agg", "1m"]).unwrap().command,
            Command::Agg {
                time_between_reqs: "1m".into()
            }
        );
        assert_eq!(
            parse(&["addfeed", "Hacker News", "https://hnrss.org/newest"])
                .unwrap()
                .command,
            Command::Addfeed {
                name: "Hacker News".into(),
                url: "https://hnrss.org/newest".into()
            }
        );
        assert_eq!(
            parse(&["unfollow", "https://hnrss.org/newest"]).unwrap().command,
            Command::Unfollow {
                url: "https://hnrss.org/newest".into()
            }
        );
    }

    #[test]
    fn test_browse_limit() {
        assert_eq!(
            parse(&["browse"]).unwrap().command,
            Command::Browse {
                limit: DEFAULT_BROWSE_LIMIT
            }
        );
        assert_eq!(
            parse(&["browse", "10"]).unwrap().command,
            Command::Browse { limit: 10 }
        );
        assert!(parse(&["browse", "0"]).is_err());
        assert!(parse(&["browse", "many"]).is_err());
    }

    #[test]
    fn test_missing_argument_is_usage_error() {
        let err = parse(&["login"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        assert!(parse(&["agg"]).is_err());
        assert!(parse(&["addfeed", "only-a-name"]).is_err());
    }

    #[test]
    fn test_extra_argument_is_usage_error() {
        let err = parse(&["users", "extra"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::UnknownArgument);
        assert!(parse(&["follow", "a", "b"]).is_err());
    }

    #[test]
    fn test_config_flag() {
        let cli = parse(&["--config", "/tmp/gator.json", "users"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gator.json")));
        let cli = parse(&["feeds", "--config", "/tmp/other.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/other.json")));
    }

    #[test]
    fn test_command_names_match_subcommands() {
        use clap::CommandFactory;
        let cli = Cli::command();
        for args in [
            &["register", "a"][..],
            &["login", "a"],
            &["reset"],
            &["users"],
            &["agg", "1m"],
            &["addfeed", "a", "b"],
            &["feeds"],
            &["follow", "a"],
            &["following"],
            &["unfollow", "a"],
            &["browse"],
        ] {
            let command = parse(args).unwrap().command;
            assert_eq!(command.name(), args[0]);
            assert!(cli.find_subcommand(command.name()).is_some());
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
