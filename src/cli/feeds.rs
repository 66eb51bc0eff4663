use anyhow::{bail, Context as _, Result};

use super::Context;
use crate::storage::{DatabaseError, User};
use crate::util::validate_url;

/// Feed URLs are stored in `url::Url` normal form; look them up the same way.
fn normalize(url: &str) -> String {
    url::Url::parse(url.trim())
        .map(String::from)
        .unwrap_or_else(|_| url.trim().to_string())
}

pub async fn list(ctx: &mut Context) -> Result<()> {
    let feeds = ctx.db.get_feeds().await.context("Failed to list feeds")?;
    if feeds.is_empty() {
        println!("No feeds yet. Add one with `gator addfeed <name> <url>`.");
        return Ok(());
    }

    for feed in feeds {
        println!("* {}", feed.feed_name);
        println!("  url:      {}", feed.feed_url);
        println!("  added by: {}", feed.user_name);
    }
    Ok(())
}

/// Create a feed owned by `user` and follow it.
pub async fn add(ctx: &mut Context, user: &User, name: &str, url: &str) -> Result<()> {
    let url = validate_url(url).with_context(|| format!("Refusing feed URL '{}'", url))?;

    let feed = match ctx.db.create_feed(name, url.as_str(), user.id).await {
        Ok(feed) => feed,
        Err(DatabaseError::Duplicate(_)) => {
            bail!("A feed with URL {} already exists; use `gator follow` instead", url)
        }
        Err(e) => return Err(e).context("Failed to create feed"),
    };
    tracing::info!(feed_id = %feed.id, url = %feed.url, user = %user.name, "Added feed");

    let follow = ctx
        .db
        .create_feed_follow(user.id, feed.id)
        .await
        .context("Feed created but following it failed")?;

    println!("Feed added: {}", feed.name);
    println!("  id:  {}", feed.id);
    println!("  url: {}", feed.url);
    println!("{} now follows {}", follow.user_name, follow.feed_name);
    Ok(())
}

pub async fn follow(ctx: &mut Context, user: &User, url: &str) -> Result<()> {
    let url = normalize(url);
    let feed = ctx
        .db
        .get_feed_by_url(&url)
        .await
        .context("Failed to look up feed")?
        .with_context(|| format!("No feed with URL {}; add it with `gator addfeed`", url))?;

    let follow = match ctx.db.create_feed_follow(user.id, feed.id).await {
        Ok(follow) => follow,
        Err(DatabaseError::Duplicate(_)) => bail!("You already follow {}", feed.name),
        Err(e) => return Err(e).context("Failed to follow feed"),
    };

    println!("{} now follows {}", follow.user_name, follow.feed_name);
    Ok(())
}

pub async fn following(ctx: &mut Context, user: &User) -> Result<()> {
    let follows = ctx
        .db
        .get_feed_follows_for_user(user.id)
        .await
        .context("Failed to list follows")?;

    if follows.is_empty() {
        println!("{} is not following any feeds", user.name);
        return Ok(());
    }
    println!("{} follows:", user.name);
    for follow in follows {
        println!("* {}", follow.feed_name);
    }
    Ok(())
}

pub async fn unfollow(ctx: &mut Context, user: &User, url: &str) -> Result<()> {
    let url = normalize(url);
    let removed = ctx
        .db
        .delete_feed_follow(user.id, &url)
        .await
        .context("Failed to unfollow feed")?;
    if removed == 0 {
        bail!("{} is not following {}", user.name, url);
    }
    println!("{} unfollowed {}", user.name, url);
    Ok(())
}

pub async fn browse(ctx: &mut Context, user: &User, limit: i64) -> Result<()> {
    if limit < 1 {
        bail!("Limit must be at least 1");
    }
    let posts = ctx
        .db
        .get_posts_for_user(user.id, limit)
        .await
        .context("Failed to load posts")?;

    if posts.is_empty() {
        println!("No posts yet. Follow some feeds and run `gator agg <interval>`.");
        return Ok(());
    }

    println!("Found {} post(s) for {}:", posts.len(), user.name);
    for post in posts {
        let date = post
            .published_at
            .map(|d| d.format("%a %b %e %Y").to_string())
            .unwrap_or_else(|| "undated".to_string());
        println!();
        println!("{} | {}", date, post.title);
        if let Some(description) = &post.description {
            println!("    {}", description);
        }
        println!("Link: {}", post.url);
        println!("=====================================");
    }
    Ok(())
}
