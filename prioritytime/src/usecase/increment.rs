use crate::error::Result;
use crate::repository::LeisureRepository;
use std::sync::Arc;

/// Bumps a leisure and every one of its ancestors in one batch, so a
/// parent's counter always reflects activity anywhere below it.
pub struct IncrementLeisureUseCase<R> {
    repo: Arc<R>,
}

impl<R: LeisureRepository> IncrementLeisureUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        IncrementLeisureUseCase { repo }
    }

    /// Returns the ids that were incremented, root first, ending with `id`.
    pub fn execute(&self, id: i64) -> Result<Vec<i64>> {
        let ancestry = self.repo.get_ancestry(id)?;

        let mut ids = Vec::with_capacity(ancestry.depth() + 1);
        ids.extend_from_slice(ancestry.ids());
        ids.push(id);

        self.repo.increment_leisures(&ids)?;
        Ok(ids)
    }
}
