use crate::ancestry::AncestryPath;
use crate::db::{LeisureDao, LeisureSubscription};
use crate::error::Result;
use crate::model::{LeisureEntity, NewLeisure};
use std::sync::Arc;

/// The seam between use-case policy and storage mechanics. Implementations
/// forward to storage and make no decisions of their own.
pub trait LeisureRepository {
    fn get_ancestry(&self, id: i64) -> Result<AncestryPath>;
    fn get_leisure_counter(&self, id: i64) -> Result<i64>;
    fn get_lowest_counter(&self, ancestry: &AncestryPath) -> Result<i64>;
    fn count_at(&self, ancestry: &AncestryPath) -> Result<i64>;
    fn add_leisure(&self, leisure: NewLeisure) -> Result<i64>;
    fn get_leisure(&self, id: i64) -> Result<LeisureEntity>;
    fn get_leisures(&self) -> Result<Vec<LeisureEntity>>;
    fn observe_leisures(&self) -> LeisureSubscription;
    fn increment_leisures(&self, ids: &[i64]) -> Result<()>;
    fn remove_leisures(&self, scope: &AncestryPath) -> Result<usize>;
    fn rename_leisure(&self, id: i64, name: &str) -> Result<()>;
}

/// Repository backed by the local SQLite database.
#[derive(Clone)]
pub struct LocalLeisureRepository {
    dao: Arc<LeisureDao>,
}

impl LocalLeisureRepository {
    pub fn new(dao: Arc<LeisureDao>) -> Self {
        LocalLeisureRepository { dao }
    }
}

impl LeisureRepository for LocalLeisureRepository {
    fn get_ancestry(&self, id: i64) -> Result<AncestryPath> {
        self.dao.get_ancestry(id)
    }

    fn get_leisure_counter(&self, id: i64) -> Result<i64> {
        self.dao.get_leisure_counter(id)
    }

    fn get_lowest_counter(&self, ancestry: &AncestryPath) -> Result<i64> {
        self.dao.get_lowest_counter(ancestry)
    }

    fn count_at(&self, ancestry: &AncestryPath) -> Result<i64> {
        self.dao.count_at(ancestry)
    }

    fn add_leisure(&self, leisure: NewLeisure) -> Result<i64> {
        self.dao.add_leisure(&leisure)
    }

    fn get_leisure(&self, id: i64) -> Result<LeisureEntity> {
        self.dao.get_leisure(id)
    }

    fn get_leisures(&self) -> Result<Vec<LeisureEntity>> {
        self.dao.get_leisures()
    }

    fn observe_leisures(&self) -> LeisureSubscription {
        self.dao.subscribe()
    }

    fn increment_leisures(&self, ids: &[i64]) -> Result<()> {
        self.dao.increment_leisures(ids)
    }

    fn remove_leisures(&self, scope: &AncestryPath) -> Result<usize> {
        self.dao.remove_leisures(scope)
    }

    fn rename_leisure(&self, id: i64, name: &str) -> Result<()> {
        self.dao.rename_leisure(id, name)
    }
}
