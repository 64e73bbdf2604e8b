use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Settings;
use crate::model::{Comment, Post};

/// Generates a post identifier: the first 8 hex characters of the SHA-256
/// digest of a random UUID.
///
/// Collisions are unlikely but not checked.
pub fn generate_id() -> String {
    let digest = Sha256::digest(Uuid::new_v4().as_bytes());
    hex::encode(&digest[..4])
}

/// Process-local list of posts.
///
/// Lives as long as the hosting process; nothing is persisted.
#[derive(Debug, Default)]
pub struct PostStore {
    posts: Mutex<Vec<Post>>,
}

impl PostStore {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
        }
    }

    /// Store holding the five demo posts.
    pub fn seeded() -> Self {
        Self::new(seed_posts())
    }

    /// Seeded or empty store, as `SEED_POSTS` asks.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.seed_posts {
            Self::seeded()
        } else {
            Self::default()
        }
    }

    // A panic while the lock is held cannot leave the vector half-written,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<Post>> {
        self.posts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every post in insertion order.
    pub fn list(&self) -> Vec<Post> {
        self.lock().clone()
    }

    /// Appends a new post without comments and returns it.
    pub fn create<S: Into<String>>(&self, title: S, content: S) -> Post {
        let post = Post::new(generate_id(), title.into(), content.into());
        self.lock().push(post.clone());
        post
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn seed_posts() -> Vec<Post> {
    vec![
        Post::new("1", "First Post", "This is the content of the first post.").with_comments(
            vec![
                Comment::new("1", "1", "First comment on first post."),
                Comment::new("2", "1", "Second comment on first post."),
            ],
        ),
        Post::new("2", "Second Post", "This is the content of the second post.")
            .with_comments(vec![Comment::new("3", "2", "First comment on second post.")]),
        Post::new("3", "Third Post", "This is the content of the third post."),
        Post::new("4", "Fourth Post", "This is the content of the fourth post.").with_comments(
            vec![
                Comment::new("4", "4", "First comment on fourth post."),
                Comment::new("5", "4", "Second comment on fourth post."),
                Comment::new("6", "4", "Third comment on fourth post."),
            ],
        ),
        Post::new("5", "Fifth Post", "This is the content of the fifth post.")
            .with_comments(vec![Comment::new("7", "5", "First comment on fifth post.")]),
    ]
}
