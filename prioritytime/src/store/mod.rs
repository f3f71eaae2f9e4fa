use crate::config::Config;
use crate::db::LeisureDao;
use crate::error::{PriorityError, Result};
use crate::migration::{self, TABLE};
use crate::model::Leisure;
use crate::repository::{LeisureRepository, LocalLeisureRepository};
use crate::tree::{build_forest, TreeNode};
use crate::usecase::{
    AddLeisureUseCase, GetLeisuresUseCase, IncrementLeisureUseCase, LeisureObserver,
    RemoveLeisureUseCase, RenameLeisureUseCase,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main entry point.
/// Opens a data directory, reads its config, opens and migrates the
/// database, and wires storage, repository and use cases together once.
pub struct Store {
    root: PathBuf,
    config: Config,
    db_path: Option<PathBuf>,
    dao: Arc<LeisureDao>,
    repo: Arc<LocalLeisureRepository>,
    add: AddLeisureUseCase<LocalLeisureRepository>,
    increment: IncrementLeisureUseCase<LocalLeisureRepository>,
    remove: RemoveLeisureUseCase<LocalLeisureRepository>,
    rename: RenameLeisureUseCase<LocalLeisureRepository>,
    get: GetLeisuresUseCase<LocalLeisureRepository>,
}

impl Store {
    /// Open the store in the given data directory.
    pub fn open(path: &str) -> Result<Self> {
        let root = PathBuf::from(path);
        if !root.is_dir() {
            return Err(PriorityError::Other(format!(
                "Data directory does not exist: {}",
                root.display()
            )));
        }

        let config = Config::load(&root)?;
        let db_path = root.join(&config.database);
        let dao = LeisureDao::open(&db_path, &config.dao_options())?;
        log::info!("Opened leisure store at {}", db_path.display());

        Ok(Self::assemble(root, config, Some(db_path), dao))
    }

    /// A store backed by an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let dao = LeisureDao::open_in_memory()?;
        Ok(Self::assemble(PathBuf::from("."), Config::default(), None, dao))
    }

    fn assemble(root: PathBuf, config: Config, db_path: Option<PathBuf>, dao: LeisureDao) -> Self {
        let dao = Arc::new(dao);
        let repo = Arc::new(LocalLeisureRepository::new(Arc::clone(&dao)));
        Store {
            root,
            config,
            db_path,
            add: AddLeisureUseCase::new(Arc::clone(&repo)),
            increment: IncrementLeisureUseCase::new(Arc::clone(&repo)),
            remove: RemoveLeisureUseCase::new(Arc::clone(&repo)),
            rename: RenameLeisureUseCase::new(Arc::clone(&repo)),
            get: GetLeisuresUseCase::new(Arc::clone(&repo)),
            dao,
            repo,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ── Use cases ────────────────────────────────────────────────────

    /// Add a leisure, at the top level when `parent_id` is `None`.
    pub fn add_leisure(&self, name: &str, parent_id: Option<i64>) -> Result<i64> {
        self.add.execute(name, parent_id)
    }

    /// Increment a leisure and all its ancestors. Returns the touched ids.
    pub fn increment_leisure(&self, id: i64) -> Result<Vec<i64>> {
        self.increment.execute(id)
    }

    /// Remove a leisure and its subtree. Returns how many rows went.
    pub fn remove_leisure(&self, id: i64) -> Result<usize> {
        self.remove.execute(id)
    }

    pub fn rename_leisure(&self, id: i64, name: &str) -> Result<()> {
        self.rename.execute(id, name)
    }

    pub fn leisures(&self) -> Result<Vec<Leisure>> {
        self.get.execute()
    }

    pub fn leisure(&self, id: i64) -> Result<Leisure> {
        self.get.get(id)
    }

    pub fn observe(&self) -> LeisureObserver {
        self.get.observe()
    }

    pub fn observe_leisure(&self, id: i64) -> LeisureObserver {
        self.get.observe_leisure(id)
    }

    /// The whole forest, nested.
    pub fn forest(&self) -> Result<Vec<TreeNode>> {
        Ok(build_forest(&self.repo.get_leisures()?))
    }

    /// The subtree rooted at `id`: exactly what removing `id` would delete.
    pub fn subtree(&self, id: i64) -> Result<TreeNode> {
        let target = self.repo.get_leisure(id)?;
        let rows: Vec<_> = self
            .repo
            .get_leisures()?
            .into_iter()
            .filter(|e| e.id == id || e.ancestry.descends_from(&target.ancestry, id))
            .collect();

        build_forest(&rows)
            .into_iter()
            .find(|node| node.leisure.id == id)
            .ok_or(PriorityError::NotFound { id })
    }

    /// Pick up commits other processes made to the same database file.
    /// Observers are notified when something changed.
    pub fn process_external_changes(&self) -> Result<bool> {
        self.dao.refresh()
    }

    // ── Dynamic API for the CLI ─────────────────────────────────────

    pub fn get_dynamic(&self, id: i64) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.leisure(id)?)?)
    }

    pub fn list_dynamic(&self, nested: bool) -> Result<serde_json::Value> {
        if nested {
            Ok(serde_json::to_value(self.forest()?)?)
        } else {
            Ok(serde_json::to_value(self.leisures()?)?)
        }
    }

    /// Schema version, table, row count and database location.
    pub fn status(&self) -> Result<serde_json::Value> {
        let migrations: Vec<serde_json::Value> = self
            .dao
            .migration_history()?
            .into_iter()
            .map(|(version, description)| {
                serde_json::json!({ "version": version, "description": description })
            })
            .collect();

        Ok(serde_json::json!({
            "schema_version": self.dao.schema_version()?,
            "latest_version": migration::LATEST_VERSION,
            "migrations": migrations,
            "table": TABLE,
            "count": self.dao.count()?,
            "database": self
                .db_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string()),
        }))
    }
}
