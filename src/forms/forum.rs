//! Forum payloads: categories, threads, posts and moderation.

use serde::Deserialize;
use validator::Validate;

use crate::domain::forum::ThreadModeration;
use crate::domain::types::{CategoryName, PostBody, Slug, ThreadTitle, clean_optional};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/forum/categories`.
pub struct CategoryForm {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Validated category with its derived slug.
#[derive(Debug)]
pub struct CategoryPayload {
    pub name: CategoryName,
    pub slug: Slug,
    pub description: String,
    pub position: i32,
}

impl TryFrom<CategoryForm> for CategoryPayload {
    type Error = FormError;

    fn try_from(form: CategoryForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let name = CategoryName::new(form.name).map_err(FormError::field("name"))?;
        let slug = Slug::from_name(name.as_str()).map_err(FormError::field("name"))?;

        Ok(Self {
            name,
            slug,
            description: clean_optional(form.description.as_deref()).unwrap_or_default(),
            position: form.position.unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/forum/categories/{slug}/threads`.
pub struct ThreadForm {
    #[validate(length(min = 1, max = 160))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

/// Validated thread title and opening post.
#[derive(Debug)]
pub struct ThreadPayload {
    pub title: ThreadTitle,
    pub body: PostBody,
}

impl TryFrom<ThreadForm> for ThreadPayload {
    type Error = FormError;

    fn try_from(form: ThreadForm) -> Result<Self, Self::Error> {
        form.validate()?;

        Ok(Self {
            title: ThreadTitle::new(form.title).map_err(FormError::field("title"))?,
            body: PostBody::new(form.body).map_err(FormError::field("body"))?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Payload of post creation and editing.
pub struct PostForm {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

impl TryFrom<PostForm> for PostBody {
    type Error = FormError;

    fn try_from(form: PostForm) -> Result<Self, Self::Error> {
        form.validate()?;
        PostBody::new(form.body).map_err(FormError::field("body"))
    }
}

#[derive(Debug, Default, Deserialize)]
/// Payload of `PATCH /api/forum/threads/{id}`.
pub struct ModerateThreadForm {
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
}

impl From<ModerateThreadForm> for ThreadModeration {
    fn from(form: ModerateThreadForm) -> Self {
        Self {
            is_pinned: form.is_pinned,
            is_locked: form.is_locked,
        }
    }
}
