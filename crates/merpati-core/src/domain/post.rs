use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::tag::{Tag, normalize_tag_names};
use super::user::UserSummary;
use crate::error::DomainError;

// Mirrored in the `PostInput` validation attributes.
pub const TITLE_MIN_CHARS: usize = 20;
pub const CONTENT_MIN_CHARS: usize = 200;

/// Lifecycle status of a post. `Thrash` is the logical trash bin and is
/// independent of soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    #[default]
    Draft,
    Thrash,
}

impl PostStatus {
    pub const ALL: [PostStatus; 3] = [PostStatus::Publish, PostStatus::Draft, PostStatus::Thrash];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
            PostStatus::Thrash => "thrash",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(PostStatus::Publish),
            "draft" => Ok(PostStatus::Draft),
            "thrash" => Ok(PostStatus::Thrash),
            other => Err(DomainError::validation(format!(
                "status must be one of publish, draft, thrash (got '{other}')"
            ))),
        }
    }
}

/// Post entity - an article joined with its author and tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: PostStatus,
    pub featured_image_url: Option<String>,
    pub author_id: Uuid,
    pub author: Option<UserSummary>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// The author-editable fields of a post, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: PostStatus,
    pub featured_image_url: Option<String>,
}

/// Raw create/update input as received from a client.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostInput {
    #[validate(length(min = 20, max = 200, message = "title must be between 20 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 200, message = "content must be at least 200 characters"))]
    pub content: String,
    #[validate(length(min = 3, max = 100, message = "category must be between 3 and 100 characters"))]
    pub category: String,
    pub status: String,
    #[validate(url(message = "featured_image_url must be a valid URL"))]
    pub featured_image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Validated input: fields plus normalized tag names.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub fields: PostFields,
    pub tag_names: Vec<String>,
}

impl PostInput {
    /// Check every field constraint without touching storage.
    pub fn into_draft(mut self) -> Result<PostDraft, DomainError> {
        // An empty image URL means "no image".
        self.featured_image_url = self
            .featured_image_url
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        self.validate()?;

        let status: PostStatus = self.status.parse()?;

        if let Some(url) = &self.featured_image_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DomainError::validation(
                    "featured_image_url must be an http(s) URL",
                ));
            }
        }

        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(DomainError::validation("tags must not be empty"));
        }

        Ok(PostDraft {
            fields: PostFields {
                title: self.title,
                content: self.content,
                category: self.category,
                status,
                featured_image_url: self.featured_image_url,
            },
            tag_names: normalize_tag_names(&self.tags),
        })
    }
}

/// A post ready to be inserted, with its resolved tag identities.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub fields: PostFields,
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(author_id: Uuid, fields: PostFields, tag_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            fields,
            tag_ids,
            created_at: Utc::now(),
        }
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub include_deleted: bool,
}

impl PostFilter {
    pub fn public(status: Option<PostStatus>) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn authored_by(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn admin(status: Option<PostStatus>) -> Self {
        Self {
            status,
            author_id: None,
            include_deleted: true,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        (self.include_deleted || !post.is_deleted())
            && self.status.is_none_or(|s| s == post.status)
            && self.author_id.is_none_or(|a| a == post.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> PostInput {
        PostInput {
            title: "A title that is long enough".to_string(),
            content: "x".repeat(CONTENT_MIN_CHARS),
            category: "tech".to_string(),
            status: "draft".to_string(),
            featured_image_url: None,
            tags: vec!["Go".to_string(), "backend".to_string()],
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let draft = valid_input().into_draft().unwrap();
        assert_eq!(draft.fields.status, PostStatus::Draft);
        assert_eq!(draft.tag_names, vec!["go", "backend"]);
    }

    #[test]
    fn test_content_boundary() {
        let mut input = valid_input();
        input.content = "x".repeat(CONTENT_MIN_CHARS - 1);
        assert!(matches!(input.into_draft(), Err(DomainError::Validation(_))));

        let mut input = valid_input();
        input.content = "é".repeat(CONTENT_MIN_CHARS);
        assert!(input.into_draft().is_ok());
    }

    #[test]
    fn test_title_and_category_minimums() {
        let mut input = valid_input();
        input.title = "x".repeat(TITLE_MIN_CHARS - 1);
        assert!(matches!(
            input.into_draft(),
            Err(DomainError::Validation(msg)) if msg.starts_with("title")
        ));

        let mut input = valid_input();
        input.category = "ab".to_string();
        assert!(input.into_draft().is_err());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut input = valid_input();
        input.status = "archived".to_string();
        assert!(input.into_draft().is_err());
    }

    #[test]
    fn test_image_url_rules() {
        let mut input = valid_input();
        input.featured_image_url = Some("not a url".to_string());
        assert!(input.into_draft().is_err());

        let mut input = valid_input();
        input.featured_image_url = Some("ftp://example.com/a.png".to_string());
        assert!(input.into_draft().is_err());

        let mut input = valid_input();
        input.featured_image_url = Some(String::new());
        assert_eq!(input.into_draft().unwrap().fields.featured_image_url, None);

        let mut input = valid_input();
        input.featured_image_url = Some("https://res.cloudinary.com/x/a.png".to_string());
        assert!(input.into_draft().unwrap().fields.featured_image_url.is_some());
    }

    #[test]
    fn test_blank_tag_rejected() {
        let mut input = valid_input();
        input.tags.push("   ".to_string());
        assert!(input.into_draft().is_err());
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in PostStatus::ALL {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
    }
}
