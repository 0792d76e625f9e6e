use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use keyset_core::Page;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::error::ListingError;

/// One row of `animal_rankings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalRanking {
    pub id: i64,
    pub rank: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimalRankingSortKey {
    #[serde(rename = "ANIMAL_RANK")]
    Rank,
    #[serde(rename = "ANIMAL_NAME")]
    Name,
}

impl AnimalRankingSortKey {
    /// Wire name of the sort key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rank => "ANIMAL_RANK",
            Self::Name => "ANIMAL_NAME",
        }
    }
}

impl fmt::Display for AnimalRankingSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalRankingSortKey {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANIMAL_RANK" => Ok(Self::Rank),
            "ANIMAL_NAME" => Ok(Self::Name),
            _ => Err(ListingError::InvalidColumn {
                column: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceSortKey {
    #[serde(rename = "RESOURCE_CREATED_AT")]
    CreatedAt,
    #[serde(rename = "RESOURCE_NAME")]
    Name,
}

impl ResourceSortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "RESOURCE_CREATED_AT",
            Self::Name => "RESOURCE_NAME",
        }
    }
}

impl fmt::Display for ResourceSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceSortKey {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESOURCE_CREATED_AT" => Ok(Self::CreatedAt),
            "RESOURCE_NAME" => Ok(Self::Name),
            _ => Err(ListingError::InvalidColumn {
                column: s.to_string(),
            }),
        }
    }
}

/// A list call as received from a transport.
///
/// `sort` is the entity's sort key, parsed from its wire name by the
/// transport. `cursor` is the wire form of the last seen sort value and
/// `order` the raw direction string. `filters` maps column names to a scalar
/// (equality) or an array (set membership).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest<K> {
    pub sort: K,
    pub cursor: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default)]
    pub filters: Map<String, JsonValue>,
}

fn default_order() -> String {
    "ASC".to_string()
}

impl<K> ListRequest<K> {
    pub fn new(sort: K, cursor: impl Into<String>) -> Self {
        Self {
            sort,
            cursor: cursor.into(),
            limit: None,
            order: default_order(),
            filters: Map::new(),
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

/// Rows plus the wire-encoded next page key.
pub type ListResponse<T> = Page<T>;
