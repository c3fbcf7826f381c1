//! Domain entities - the core business objects.

mod page;
mod post;
mod tag;
mod user;

pub use page::{DEFAULT_LIMIT, MAX_LIMIT, Page, PageRequest};
pub use post::{
    CONTENT_MIN_CHARS, NewPost, Post, PostDraft, PostFields, PostFilter, PostInput, PostStatus,
    TITLE_MIN_CHARS,
};
pub use tag::{Tag, TagResolution, normalize_tag_name, normalize_tag_names};
pub use user::{Registration, User, UserSummary, mask_email};
