use super::validate_name;
use crate::ancestry::AncestryPath;
use crate::error::{PriorityError, Result};
use crate::model::NewLeisure;
use crate::repository::LeisureRepository;
use std::sync::Arc;

/// Places a new leisure in the tree and picks its starting counter.
///
/// A new leisure starts tied with the lowest counter among its future
/// siblings. The first child of a parent starts at the parent's counter. A
/// first top-level leisure starts at 0.
pub struct AddLeisureUseCase<R> {
    repo: Arc<R>,
}

impl<R: LeisureRepository> AddLeisureUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        AddLeisureUseCase { repo }
    }

    /// Store a leisure called `name` under `parent_id` (top level when
    /// `None`) and return its id.
    pub fn execute(&self, name: &str, parent_id: Option<i64>) -> Result<i64> {
        let name = validate_name(name)?;

        let ancestry = match parent_id {
            Some(parent) => self.parent_scope(parent)?,
            None => AncestryPath::root(),
        };

        let lowest = self.repo.get_lowest_counter(&ancestry)?;
        // 0 is also what an empty level reports, so only a real first child
        // is seeded from its parent.
        let first_child =
            parent_id.is_some() && lowest == 0 && self.repo.count_at(&ancestry)? == 0;
        let counter = match parent_id {
            Some(parent) if first_child => self
                .repo
                .get_leisure_counter(parent)
                .map_err(|e| parent_error(parent, e))?,
            _ => lowest,
        };

        let id = self
            .repo
            .add_leisure(NewLeisure::new(name, counter, ancestry))?;
        log::debug!("Added leisure {id} under {parent_id:?} with counter {counter}");
        Ok(id)
    }

    fn parent_scope(&self, parent: i64) -> Result<AncestryPath> {
        let ancestry = self
            .repo
            .get_ancestry(parent)
            .map_err(|e| parent_error(parent, e))?;
        Ok(ancestry.child(parent))
    }
}

fn parent_error(parent: i64, err: PriorityError) -> PriorityError {
    match err {
        PriorityError::NotFound { .. } => PriorityError::ParentNotFound { id: parent },
        other => other,
    }
}
