use anyhow::{bail, Context as _, Result};

use super::Context;
use crate::storage::DatabaseError;

pub async fn register(ctx: &mut Context, name: &str) -> Result<()> {
    let user = match ctx.db.create_user(name).await {
        Ok(user) => user,
        Err(DatabaseError::Duplicate(_)) => bail!("User '{}' already exists", name),
        Err(e) => return Err(e).context("Failed to create user"),
    };

    ctx.config
        .set_user(&user.name, &ctx.config_path)
        .context("Failed to save current user")?;

    tracing::info!(user_id = %user.id, name = %user.name, "Registered user");
    println!("User created: {}", user.name);
    println!("  id:         {}", user.id);
    println!("  created_at: {}", user.created_at.to_rfc3339());
    Ok(())
}

pub async fn login(ctx: &mut Context, name: &str) -> Result<()> {
    let user = ctx
        .db
        .get_user(name)
        .await
        .context("Failed to look up user")?
        .with_context(|| format!("User '{}' does not exist", name))?;

    ctx.config
        .set_user(&user.name, &ctx.config_path)
        .context("Failed to save current user")?;

    println!("Logged in as {}", user.name);
    Ok(())
}

pub async fn list(ctx: &mut Context) -> Result<()> {
    let users = ctx.db.get_users().await.context("Failed to list users")?;
    let current = ctx.config.current_user_name.as_deref();

    for user in users {
        if Some(user.name.as_str()) == current {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}

pub async fn reset(ctx: &mut Context) -> Result<()> {
    let removed = ctx
        .db
        .delete_all_users()
        .await
        .context("Failed to reset database")?;

    tracing::info!(users = removed, "Database reset");
    println!("Database reset: removed {} user(s)", removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::context;
    use crate::config::Config;

    #[tokio::test]
    async fn test_register_sets_current_user() {
        let mut ctx = context("register").await;
        register(&mut ctx, "kahya").await.unwrap();

        assert_eq!(ctx.config.current_user_name.as_deref(), Some("kahya"));
        let saved = Config::load(&ctx.config_path).unwrap();
        assert_eq!(saved.current_user_name.as_deref(), Some("kahya"));
        assert!(ctx.db.get_user("kahya").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let mut ctx = context("register_dup").await;
        register(&mut ctx, "kahya").await.unwrap();

        let err = register(&mut ctx, "kahya").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_login_requires_existing_user() {
        let mut ctx = context("login").await;
        let err = login(&mut ctx, "nobody").await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(ctx.config.current_user_name.is_none());

        ctx.db.create_user("holgith").await.unwrap();
        login(&mut ctx, "holgith").await.unwrap();
        assert_eq!(ctx.config.current_user_name.as_deref(), Some("holgith"));
    }

    #[tokio::test]
    async fn test_reset_removes_users() {
        let mut ctx = context("reset").await;
        register(&mut ctx, "a").await.unwrap();
        register(&mut ctx, "b").await.unwrap();

        reset(&mut ctx).await.unwrap();
        assert!(ctx.db.get_users().await.unwrap().is_empty());
    }
}
