//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use merpati_core::domain::{NewPost, PostStatus};

/// Stored form of [`PostStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum Status {
    #[sea_orm(string_value = "publish")]
    Publish,
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "thrash")]
    Thrash,
}

impl From<Status> for PostStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Publish => PostStatus::Publish,
            Status::Draft => PostStatus::Draft,
            Status::Thrash => PostStatus::Thrash,
        }
    }
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Publish => Status::Publish,
            PostStatus::Draft => Status::Draft,
            PostStatus::Thrash => Status::Thrash,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: String,
    pub status: Status,
    #[sea_orm(column_type = "Text", nullable)]
    pub featured_image_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTag.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from a domain NewPost to a SeaORM ActiveModel.
impl From<&NewPost> for ActiveModel {
    fn from(post: &NewPost) -> Self {
        let created_at: DateTimeWithTimeZone = post.created_at.into();
        Self {
            id: Set(post.id),
            title: Set(post.fields.title.clone()),
            content: Set(post.fields.content.clone()),
            category: Set(post.fields.category.clone()),
            status: Set(post.fields.status.into()),
            featured_image_url: Set(post.fields.featured_image_url.clone()),
            author_id: Set(post.author_id),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            deleted_at: Set(None),
        }
    }
}
