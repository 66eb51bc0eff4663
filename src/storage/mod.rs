//! SQLite persistence for users, feeds, follows and posts.
//!
//! All access goes through [`Database`], whose methods are split across one
//! file per table.

mod feeds;
mod follows;
mod posts;
mod schema;
mod types;
mod users;

pub use schema::Database;
pub use types::{DatabaseError, Feed, FeedFollow, FeedListing, NewPost, Post, User};
