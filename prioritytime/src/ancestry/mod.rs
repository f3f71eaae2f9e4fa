//! Ancestry paths: the slash-delimited chain of ancestor IDs stored with every
//! leisure, e.g. `/2/7/` for a node whose parent is 7 and grandparent is 2.
//!
//! The canonical string is what gets persisted, indexed and compared, so every
//! path that leaves this module is rendered with a leading and trailing
//! delimiter, single delimiters between IDs and no zero padding. The root path
//! (no ancestors) is rendered as `/`.

use crate::error::{PriorityError, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DELIMITER: char = '/';

/// An ordered chain of ancestor IDs, from the top-level node down to the
/// immediate parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AncestryPath {
    ids: Vec<i64>,
}

impl AncestryPath {
    /// The path of a top-level node.
    pub fn root() -> Self {
        AncestryPath { ids: Vec::new() }
    }

    /// Build a path directly from ancestor IDs, root first. IDs are storage
    /// row ids and must not be negative.
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let ids: Vec<i64> = ids.into_iter().collect();
        debug_assert!(ids.iter().all(|&id| id >= 0), "negative id in {ids:?}");
        AncestryPath { ids }
    }

    /// Parse a stored path. Accepts the empty string and `/` as the root
    /// sentinel; anything else must be canonical.
    pub fn from_existing(path: &str) -> Result<Self> {
        if path.is_empty() || path == "/" {
            return Ok(Self::root());
        }

        let inner = path
            .strip_prefix(DELIMITER)
            .and_then(|p| p.strip_suffix(DELIMITER))
            .ok_or_else(|| {
                PriorityError::format(path, "path must start and end with '/'")
            })?;

        let mut ids = Vec::new();
        for segment in inner.split(DELIMITER) {
            ids.push(parse_segment(path, segment)?);
        }

        Ok(AncestryPath { ids })
    }

    /// A new path with `parent_id` appended as the last ancestor. `self` is
    /// left untouched. `parent_id` must not be negative.
    pub fn child(&self, parent_id: i64) -> Self {
        debug_assert!(parent_id >= 0, "negative parent id {parent_id}");
        let mut ids = Vec::with_capacity(self.ids.len() + 1);
        ids.extend_from_slice(&self.ids);
        ids.push(parent_id);
        AncestryPath { ids }
    }

    /// Ancestor IDs, root first.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    pub fn is_root(&self) -> bool {
        self.ids.is_empty()
    }

    /// The immediate parent's ID, if any.
    pub fn parent_id(&self) -> Option<i64> {
        self.ids.last().copied()
    }

    /// The ancestry of the immediate parent. `None` for the root path.
    pub fn parent(&self) -> Option<AncestryPath> {
        let (_, rest) = self.ids.split_last()?;
        Some(AncestryPath { ids: rest.to_vec() })
    }

    /// Whether a node with this ancestry lives in the subtree rooted at the
    /// node `ancestor_id`, whose own ancestry is `ancestor`.
    pub fn descends_from(&self, ancestor: &AncestryPath, ancestor_id: i64) -> bool {
        self.to_string()
            .starts_with(&ancestor.child(ancestor_id).to_string())
    }
}

fn parse_segment(path: &str, segment: &str) -> Result<i64> {
    if segment.is_empty() {
        return Err(PriorityError::format(path, "empty segment"));
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PriorityError::format(
            path,
            format!("segment '{segment}' is not a numeric id"),
        ));
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return Err(PriorityError::format(
            path,
            format!("segment '{segment}' is zero padded"),
        ));
    }
    segment
        .parse()
        .map_err(|e| PriorityError::format(path, format!("segment '{segment}': {e}")))
}

impl fmt::Display for AncestryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DELIMITER}")?;
        for id in &self.ids {
            write!(f, "{id}{DELIMITER}")?;
        }
        Ok(())
    }
}

impl FromStr for AncestryPath {
    type Err = PriorityError;

    fn from_str(s: &str) -> Result<Self> {
        AncestryPath::from_existing(s)
    }
}

impl TryFrom<String> for AncestryPath {
    type Error = PriorityError;

    fn try_from(value: String) -> Result<Self> {
        AncestryPath::from_existing(&value)
    }
}

impl From<AncestryPath> for String {
    fn from(path: AncestryPath) -> Self {
        path.to_string()
    }
}

impl ToSql for AncestryPath {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for AncestryPath {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        AncestryPath::from_existing(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_renders_single_delimiter() {
        assert_eq!(AncestryPath::root().to_string(), "/");
        assert_eq!(AncestryPath::root().depth(), 0);
    }

    #[test]
    fn test_parse_root_sentinels() {
        assert!(AncestryPath::from_existing("").unwrap().is_root());
        assert!(AncestryPath::from_existing("/").unwrap().is_root());
    }

    #[test]
    fn test_parse_nested_path() {
        let path = AncestryPath::from_existing("/2/7/").unwrap();
        assert_eq!(path.ids(), &[2, 7]);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.parent_id(), Some(7));
    }

    #[test]
    fn test_round_trip() {
        for ids in [vec![], vec![1], vec![2, 7], vec![10, 3, 4000, 12]] {
            let path = AncestryPath::from_ids(ids);
            let parsed: AncestryPath = path.to_string().parse().unwrap();
            assert_eq!(parsed, path);
        }
    }

    #[test]
    fn test_child_appends_and_leaves_original() {
        let parent = AncestryPath::from_existing("/2/").unwrap();
        let child = parent.child(7);

        assert_eq!(child.to_string(), "/2/7/");
        assert_eq!(parent.to_string(), "/2/");
        assert_eq!(AncestryPath::root().child(5).to_string(), "/5/");
    }

    #[test]
    fn test_parent_drops_last_segment() {
        let path = AncestryPath::from_existing("/2/7/").unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "/2/");
        assert!(AncestryPath::root().parent().is_none());
    }

    #[test]
    fn test_malformed_paths_are_rejected() {
        for raw in ["2/7/", "/2/7", "/2//7/", "/a/", "//", "/-1/", "/02/", "/1 /"] {
            let err = AncestryPath::from_existing(raw).unwrap_err();
            assert!(
                matches!(err, PriorityError::Format { .. }),
                "expected format error for {raw:?}, got {err}"
            );
        }
    }

    #[test]
    fn test_descends_from_uses_terminal_id() {
        let b = AncestryPath::from_existing("/2/").unwrap();
        let under_b = AncestryPath::from_existing("/2/7/9/").unwrap();
        let sibling_prefix = AncestryPath::from_existing("/2/70/").unwrap();

        assert!(under_b.descends_from(&b, 7));
        assert!(!sibling_prefix.descends_from(&b, 7));
        assert!(!b.descends_from(&b, 7));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "negative parent id")]
    fn test_child_rejects_negative_id() {
        AncestryPath::root().child(-1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "negative id")]
    fn test_from_ids_rejects_negative_id() {
        AncestryPath::from_ids([3, -4]);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let path = AncestryPath::from_ids([3, 4]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/3/4/\"");

        let back: AncestryPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<AncestryPath>("\"nope\"").is_err());
    }
}
