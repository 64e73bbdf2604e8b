use serde_derive::{Deserialize, Serialize};

///
/// GraphQL type for a comment on a post
///
#[derive(juniper::GraphQLObject, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// unique identification of comment
    pub id: String,
    /// identification of commented post, never checked against existing posts
    pub post_id: String,
    /// text of comment
    pub content: String,
}

impl Comment {
    pub fn new<S: Into<String>>(id: S, post_id: S, content: S) -> Self {
        Self {
            id: id.into(),
            post_id: post_id.into(),
            content: content.into(),
        }
    }
}

///
/// GraphQL type for a blog post
///
#[derive(juniper::GraphQLObject, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// unique identification of post
    pub id: String,
    pub title: String,
    /// body text of post
    pub content: String,
    /// comments in the order they were written
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new<S: Into<String>>(id: S, title: S, content: S) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            comments: Vec::new(),
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }
}
