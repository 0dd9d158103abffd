use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::ResourceKind;

/// One hop in a resource path: the node kind plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathSegment {
    pub kind: ResourceKind,
    pub name: String,
}

/// Display-name path of a node from the root of the hierarchy.
///
/// Paths identify resources for every lookup the coordinator performs. Storage keys
/// are assigned by the store and never derived from a path here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// `/org:<name>`
    pub fn org(name: impl Into<String>) -> Self {
        Self::root().child(ResourceKind::Org, name)
    }

    /// `/org:<org>/folder:<folder>/project:<name>`
    pub fn project(
        org: impl Into<String>,
        folder: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::org(org)
            .child(ResourceKind::Folder, folder)
            .child(ResourceKind::Project, name)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(
        &self,
        kind: ResourceKind,
        name: impl Into<String>,
    ) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment {
            kind,
            name: name.into(),
        });
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Kind of the addressed node; `None` for the root.
    pub fn kind(&self) -> Option<ResourceKind> {
        self.leaf().map(|s| s.kind)
    }

    /// Display name of the addressed node; empty for the root.
    pub fn name(&self) -> &str {
        self.leaf().map(|s| s.name.as_str()).unwrap_or("")
    }

    /// True if `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(
        &self,
        ancestor: &ResourcePath,
    ) -> bool {
        self.segments.len() > ancestor.segments.len() && self.segments.starts_with(&ancestor.segments)
    }

    /// Name of the closest ancestor (or self) of the given kind.
    pub fn ancestor_name(
        &self,
        kind: ResourceKind,
    ) -> Option<&str> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.kind == kind)
            .map(|s| s.name.as_str())
    }

    /// Mirrors a config-tree path into the runtime tree, segment by segment.
    pub fn to_runtime(&self) -> Option<Self> {
        self.map_segments(ResourceKind::runtime_counterpart)
    }

    /// Maps a runtime-tree path back to the config tree.
    pub fn to_config(&self) -> Option<Self> {
        self.map_segments(ResourceKind::config_counterpart)
    }

    fn map_segments(
        &self,
        f: impl Fn(ResourceKind) -> Option<ResourceKind>,
    ) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let segments = self
            .segments
            .iter()
            .map(|s| {
                f(s.kind).map(|kind| PathSegment {
                    kind,
                    name: s.name.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { segments })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for s in &self.segments {
            write!(f, "/{}:{}", s.kind, s.name)?;
        }
        Ok(())
    }
}
