//! Turns a change set into the minimal tree write against a base commit.
//!
//! Writes are diffed against the base commit's content so byte-identical
//! blobs are never written. Deletions cannot be expressed on top of a
//! `base_tree` (unmentioned paths survive layering), so when anything is
//! deleted the new tree is sent as a complete listing built from the
//! recursive listing of the base tree, minus the deleted paths.
use futures_util::future::try_join_all;
use log::*;
use std::collections::BTreeSet;

use crate::{
    Result,
    engine::{
        content::ContentAccessor,
        types::{ChangedFile, FileOperation},
    },
    forge::{
        config::TREE_TREE_TYPE,
        request::{CreateTreeRequest, GitCommit, RepoId, TreeEntry},
        traits::GitHost,
    },
};

/// The tree write computed for one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePlan {
    pub request: CreateTreeRequest,
    /// Paths receiving new content
    pub written: Vec<String>,
    /// Paths removed from the tree
    pub deleted: Vec<String>,
}

impl TreePlan {
    /// Number of paths this plan actually changes.
    pub fn changed_files(&self) -> usize {
        self.written.len() + self.deleted.len()
    }
}

pub struct TreeBuilder<'a> {
    host: &'a dyn GitHost,
    repo: &'a RepoId,
    base: &'a GitCommit,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        host: &'a dyn GitHost,
        repo: &'a RepoId,
        base: &'a GitCommit,
    ) -> Self {
        Self { host, repo, base }
    }

    /// Compute the tree write for `changes`, or `None` when nothing differs
    /// from the base commit.
    pub async fn plan(&self, changes: &[ChangedFile]) -> Result<Option<TreePlan>> {
        let (to_delete, to_write): (Vec<&ChangedFile>, Vec<&ChangedFile>) =
            changes.iter().partition(|c| c.is_deletion());

        let accessor = ContentAccessor::new(self.host, self.repo, &self.base.sha);

        let writes = self.diff_writes(&accessor, &to_write).await?;

        let requested_writes: BTreeSet<&str> =
            to_write.iter().map(|c| c.path.as_str()).collect();

        // writes win over deletions of the same path
        let to_delete: Vec<&ChangedFile> = to_delete
            .into_iter()
            .filter(|c| !requested_writes.contains(c.path.as_str()))
            .collect();

        let deletions = self.existing_deletions(&accessor, &to_delete).await?;

        if writes.is_empty() && deletions.is_empty() {
            info!("no changes differ from {} in {}", self.base.sha, self.repo);
            return Ok(None);
        }

        let written: Vec<String> = writes.iter().map(|e| e.path.clone()).collect();

        if deletions.is_empty() {
            return Ok(Some(TreePlan {
                request: CreateTreeRequest {
                    base_tree: Some(self.base.tree_sha.clone()),
                    tree: writes,
                },
                written,
                deleted: vec![],
            }));
        }

        let tree = self.rebuild_without(&deletions, &written, writes).await?;

        Ok(Some(TreePlan {
            request: CreateTreeRequest {
                base_tree: None,
                tree,
            },
            written,
            deleted: deletions.into_iter().collect(),
        }))
    }

    async fn diff_writes(
        &self,
        accessor: &ContentAccessor<'_>,
        to_write: &[&ChangedFile],
    ) -> Result<Vec<TreeEntry>> {
        let current = try_join_all(
            to_write.iter().map(|c| accessor.get_content(&c.path)),
        )
        .await?;

        let mut entries = vec![];

        for (change, current) in to_write.iter().zip(current) {
            if current.exists
                && current.content.as_deref() == Some(change.content.as_str())
            {
                debug!("skipping unchanged file: {}", change.path);
                continue;
            }

            if !current.exists
                && matches!(change.operation, Some(FileOperation::Updated))
            {
                debug!("update target {} does not exist: creating", change.path);
            }

            debug!(
                "{} file: {}",
                if current.exists { "updating" } else { "creating" },
                change.path
            );
            entries.push(TreeEntry::blob(&change.path, &change.content));
        }

        Ok(entries)
    }

    async fn existing_deletions(
        &self,
        accessor: &ContentAccessor<'_>,
        to_delete: &[&ChangedFile],
    ) -> Result<BTreeSet<String>> {
        let current = try_join_all(
            to_delete.iter().map(|c| accessor.get_content(&c.path)),
        )
        .await?;

        let mut deletions = BTreeSet::new();

        for (change, current) in to_delete.iter().zip(current) {
            if current.exists {
                debug!("deleting file: {}", change.path);
                deletions.insert(change.path.clone());
            } else {
                debug!("nothing to delete at: {}", change.path);
            }
        }

        Ok(deletions)
    }

    /// Complete listing of the base tree without `deletions` and without the
    /// `written` paths, followed by the new `writes`. Unchanged writes are
    /// carried over from the listing like any other untouched path.
    async fn rebuild_without(
        &self,
        deletions: &BTreeSet<String>,
        written: &[String],
        writes: Vec<TreeEntry>,
    ) -> Result<Vec<TreeEntry>> {
        let listing = self
            .host
            .get_tree_recursive(self.repo, &self.base.tree_sha)
            .await?;

        let mut tree: Vec<TreeEntry> = listing
            .iter()
            // directories are implied by the paths below them
            .filter(|e| e.kind != TREE_TREE_TYPE)
            .filter(|e| !deletions.contains(&e.path))
            .filter(|e| !written.contains(&e.path))
            .map(TreeEntry::carried)
            .collect();

        tree.extend(writes);

        Ok(tree)
    }
}
