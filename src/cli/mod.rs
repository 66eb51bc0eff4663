//! Command-line surface.
//!
//! Commands split into two groups: [`PublicCommand`]s run without a logged-in
//! user, [`MemberCommand`]s need one. [`execute`] resolves the current user
//! once for the member group, so every member handler receives a `&User`.

mod aggregate;
mod feeds;
mod users;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::ingest::parse_interval;
use crate::storage::{Database, User};

#[derive(Parser, Debug)]
#[command(
    name = "gator",
    version,
    about = "RSS aggregator: follow feeds, collect posts on a schedule, browse them"
)]
pub struct Args {
    /// Config file (default: ~/.config/gator/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Public(PublicCommand),
    #[command(flatten)]
    Member(MemberCommand),
}

/// Commands that work without a logged-in user
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum PublicCommand {
    /// Create a user and log in as them
    Register { name: String },
    /// Switch the current user
    Login { name: String },
    /// List all users
    Users,
    /// Delete every user, feed, follow and post
    Reset,
    /// Collect feeds forever, one feed per interval (e.g. 1m, 30s, 1h30m)
    Agg {
        #[arg(value_name = "INTERVAL", value_parser = parse_interval)]
        interval: Duration,
    },
    /// List all feeds and who added them
    Feeds,
}

/// Commands that act on behalf of the current user
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum MemberCommand {
    /// Add a feed and follow it
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },
    /// Follow an existing feed by URL
    Follow { url: String },
    /// List the feeds you follow
    Following,
    /// Stop following a feed by URL
    Unfollow { url: String },
    /// Show the newest posts from feeds you follow
    Browse {
        #[arg(default_value_t = 2)]
        limit: i64,
    },
}

/// Everything a command handler may touch.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub db: Database,
    pub http: reqwest::Client,
}

impl Context {
    /// The logged-in user, or an error telling the caller how to log in.
    pub async fn current_user(&self) -> Result<User> {
        let name = self
            .config
            .current_user_name
            .as_deref()
            .context("No user is logged in. Run `gator register <name>` or `gator login <name>` first.")?;
        self.db
            .get_user(name)
            .await
            .context("Failed to look up current user")?
            .with_context(|| {
                format!(
                    "Current user '{}' no longer exists. Run `gator login <name>` to switch.",
                    name
                )
            })
    }
}

/// Run one command to completion.
pub async fn execute(ctx: &mut Context, command: Command) -> Result<()> {
    match command {
        Command::Public(cmd) => match cmd {
            PublicCommand::Register { name } => users::register(ctx, &name).await,
            PublicCommand::Login { name } => users::login(ctx, &name).await,
            PublicCommand::Users => users::list(ctx).await,
            PublicCommand::Reset => users::reset(ctx).await,
            PublicCommand::Agg { interval } => aggregate::run(ctx, interval).await,
            PublicCommand::Feeds => feeds::list(ctx).await,
        },
        Command::Member(cmd) => {
            let user = ctx.current_user().await?;
            match cmd {
                MemberCommand::AddFeed { name, url } => {
                    feeds::add(ctx, &user, &name, &url).await
                }
                MemberCommand::Follow { url } => feeds::follow(ctx, &user, &url).await,
                MemberCommand::Following => feeds::following(ctx, &user).await,
                MemberCommand::Unfollow { url } => feeds::unfollow(ctx, &user, &url).await,
                MemberCommand::Browse { limit } => feeds::browse(ctx, &user, limit).await,
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Args::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_parse_public_commands() {
        assert_eq!(
            parse(&["gator", "register", "kahya"]),
            Command::Public(PublicCommand::Register {
                name: "kahya".into()
            })
        );
        assert_eq!(
            parse(&["gator", "agg", "1m30s"]),
            Command::Public(PublicCommand::Agg {
                interval: Duration::from_secs(90)
            })
        );
    }

    #[test]
    fn test_parse_member_commands() {
        assert_eq!(
            parse(&["gator", "addfeed", "Hacker News", "https://hnrss.org/newest"]),
            Command::Member(MemberCommand::AddFeed {
                name: "Hacker News".into(),
                url: "https://hnrss.org/newest".into()
            })
        );
        assert_eq!(
            parse(&["gator", "browse"]),
            Command::Member(MemberCommand::Browse { limit: 2 })
        );
        assert_eq!(
            parse(&["gator", "browse", "10"]),
            Command::Member(MemberCommand::Browse { limit: 10 })
        );
    }

    #[test]
    fn test_global_config_flag() {
        let args = Args::try_parse_from(["gator", "users", "--config", "/tmp/g.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/g.toml")));
    }

    #[test]
    fn test_bad_interval_rejected_at_parse_time() {
        for bad in ["abc", "10", "0s", "-1m"] {
            assert!(
                Args::try_parse_from(["gator", "agg", bad]).is_err(),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_missing_arguments_rejected() {
        assert!(Args::try_parse_from(["gator", "login"]).is_err());
        assert!(Args::try_parse_from(["gator", "addfeed", "only-name"]).is_err());
        assert!(Args::try_parse_from(["gator", "nonsense"]).is_err());
    }

    #[tokio::test]
    async fn test_member_command_requires_login() {
        let mut ctx = test_support::context("requires_login").await;
        let err = execute(&mut ctx, Command::Member(MemberCommand::Following))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No user is logged in"));
    }

    #[tokio::test]
    async fn test_member_command_with_deleted_user() {
        let mut ctx = test_support::context("deleted_user").await;
        ctx.config.current_user_name = Some("ghost".into());

        let err = execute(&mut ctx, Command::Member(MemberCommand::Following))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
    }
}
