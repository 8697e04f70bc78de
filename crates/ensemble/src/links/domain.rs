use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::TeamId;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub String);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkCategoryId(pub String);

impl fmt::Display for LinkCategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCategory {
    pub id: LinkCategoryId,
    pub team_id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub team_id: TeamId,
    pub category_id: Option<LinkCategoryId>,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub is_pinned: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

impl CategoryInput {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validation::required_text("name", &self.name)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub category_id: Option<LinkCategoryId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl NewLink {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: validation::required_text("title", &self.title)?,
            url: validation::http_url("url", &self.url)?,
            category_id: self.category_id,
            description: validation::optional_text("description", self.description.as_deref())?,
            is_pinned: self.is_pinned,
        })
    }
}

/// Partial update. `category_id: null` moves the link out of its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, with = "double_option")]
    pub category_id: Option<Option<LinkCategoryId>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

impl LinkPatch {
    pub fn apply(self, link: &mut Link) -> Result<(), ValidationError> {
        let mut next = link.clone();
        if let Some(title) = self.title {
            next.title = validation::required_text("title", &title)?;
        }
        if let Some(url) = self.url {
            next.url = validation::http_url("url", &url)?;
        }
        if let Some(category_id) = self.category_id {
            next.category_id = category_id;
        }
        if let Some(description) = self.description {
            next.description = validation::optional_text("description", Some(&description))?;
        }
        if let Some(is_pinned) = self.is_pinned {
            next.is_pinned = is_pinned;
        }
        *link = next;
        Ok(())
    }
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
