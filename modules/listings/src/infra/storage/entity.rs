//! Descriptor tables for the listable tables.

use keyset_core::{Value, ValueKind};
use keyset_db::{ColumnDef, KeysetEntity, Record, ScanError, SortColumn};

use crate::contract::model::{AnimalRanking, AnimalRankingSortKey, Resource, ResourceSortKey};

// -------- animal_rankings --------

static RANKING_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", ValueKind::Integer),
    ColumnDef::new("rank", ValueKind::Integer),
    ColumnDef::new("name", ValueKind::Text),
    ColumnDef::new("created_at", ValueKind::Timestamp),
    ColumnDef::new("updated_at", ValueKind::Timestamp),
];

fn ranking_rank(r: &AnimalRanking) -> Value {
    Value::Integer(r.rank)
}

fn ranking_name(r: &AnimalRanking) -> Value {
    Value::Text(r.name.clone())
}

static RANKING_SORT: &[SortColumn<AnimalRankingSortKey, AnimalRanking>] = &[
    SortColumn {
        key: AnimalRankingSortKey::Rank,
        column: ColumnDef::new("rank", ValueKind::Integer),
        extract: ranking_rank,
    },
    SortColumn {
        key: AnimalRankingSortKey::Name,
        column: ColumnDef::new("name", ValueKind::Text),
        extract: ranking_name,
    },
];

impl KeysetEntity for AnimalRanking {
    type SortKey = AnimalRankingSortKey;
    const TABLE: &'static str = "animal_rankings";

    fn columns() -> &'static [ColumnDef] {
        RANKING_COLUMNS
    }

    fn sort_columns() -> &'static [SortColumn<AnimalRankingSortKey, Self>] {
        RANKING_SORT
    }

    // id, rank, name
    fn filter_columns() -> &'static [ColumnDef] {
        &RANKING_COLUMNS[..3]
    }

    fn from_record(record: &Record) -> Result<Self, ScanError> {
        Ok(Self {
            id: record.integer("id")?,
            rank: record.integer("rank")?,
            name: record.text("name")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}

// -------- resources --------

static RESOURCE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", ValueKind::Integer),
    ColumnDef::new("uuid", ValueKind::Text),
    ColumnDef::new("name", ValueKind::Text),
    ColumnDef::new("created_at", ValueKind::Timestamp),
    ColumnDef::new("updated_at", ValueKind::Timestamp),
];

fn resource_created_at(r: &Resource) -> Value {
    Value::Timestamp(r.created_at)
}

fn resource_name(r: &Resource) -> Value {
    Value::Text(r.name.clone())
}

static RESOURCE_SORT: &[SortColumn<ResourceSortKey, Resource>] = &[
    SortColumn {
        key: ResourceSortKey::CreatedAt,
        column: ColumnDef::new("created_at", ValueKind::Timestamp),
        extract: resource_created_at,
    },
    SortColumn {
        key: ResourceSortKey::Name,
        column: ColumnDef::new("name", ValueKind::Text),
        extract: resource_name,
    },
];

impl KeysetEntity for Resource {
    type SortKey = ResourceSortKey;
    const TABLE: &'static str = "resources";

    fn columns() -> &'static [ColumnDef] {
        RESOURCE_COLUMNS
    }

    fn sort_columns() -> &'static [SortColumn<ResourceSortKey, Self>] {
        RESOURCE_SORT
    }

    fn filter_columns() -> &'static [ColumnDef] {
        &RESOURCE_COLUMNS[..4]
    }

    fn from_record(record: &Record) -> Result<Self, ScanError> {
        Ok(Self {
            id: record.integer("id")?,
            uuid: record.text("uuid")?,
            name: record.text("name")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}
