use crate::ancestry::AncestryPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the leisure table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeisureEntity {
    pub id: i64,
    pub name: String,
    pub counter: i64,
    pub ancestry: AncestryPath,
    pub updated: DateTime<Utc>,
}

impl LeisureEntity {
    pub fn depth(&self) -> usize {
        self.ancestry.depth()
    }
}

/// A leisure that has not been stored yet. Storage assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeisure {
    pub name: String,
    pub counter: i64,
    pub ancestry: AncestryPath,
    pub updated: DateTime<Utc>,
}

impl NewLeisure {
    pub fn new(name: impl Into<String>, counter: i64, ancestry: AncestryPath) -> Self {
        NewLeisure {
            name: name.into(),
            counter,
            ancestry,
            updated: Utc::now(),
        }
    }
}

/// What callers outside the engine get to see of a leisure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leisure {
    pub id: i64,
    pub name: String,
    pub counter: i64,
    pub updated: DateTime<Utc>,
    pub depth: usize,
}

impl From<&LeisureEntity> for Leisure {
    fn from(entity: &LeisureEntity) -> Self {
        Leisure {
            id: entity.id,
            name: entity.name.clone(),
            counter: entity.counter,
            updated: entity.updated,
            depth: entity.depth(),
        }
    }
}

impl From<LeisureEntity> for Leisure {
    fn from(entity: LeisureEntity) -> Self {
        let depth = entity.depth();
        Leisure {
            id: entity.id,
            name: entity.name,
            counter: entity.counter,
            updated: entity.updated,
            depth,
        }
    }
}
