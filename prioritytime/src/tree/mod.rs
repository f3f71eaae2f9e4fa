use crate::model::{Leisure, LeisureEntity};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A leisure with its children nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub leisure: Leisure,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of leisures in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Visit this subtree parent first.
    pub fn pre_order(&self) -> Vec<&Leisure> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_pre_order(&mut out);
        out
    }

    fn collect_pre_order<'a>(&'a self, out: &mut Vec<&'a Leisure>) {
        out.push(&self.leisure);
        for child in &self.children {
            child.collect_pre_order(out);
        }
    }
}

/// Nest a flat listing. Siblings keep the order they had in `entities`.
/// A row whose parent is not in the listing is placed at the top level
/// rather than dropped.
pub fn build_forest(entities: &[LeisureEntity]) -> Vec<TreeNode> {
    let present: HashSet<i64> = entities.iter().map(|e| e.id).collect();

    let mut children: HashMap<i64, Vec<&LeisureEntity>> = HashMap::new();
    let mut roots = Vec::new();
    for entity in entities {
        match entity.ancestry.parent_id() {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(entity)
            }
            _ => roots.push(entity),
        }
    }

    roots
        .into_iter()
        .map(|root| nest(root, &children))
        .collect()
}

fn nest(entity: &LeisureEntity, children: &HashMap<i64, Vec<&LeisureEntity>>) -> TreeNode {
    let nested = children
        .get(&entity.id)
        .map(|kids| kids.iter().map(|kid| nest(kid, children)).collect())
        .unwrap_or_default();
    TreeNode {
        leisure: Leisure::from(entity),
        children: nested,
    }
}
