//! Paths of nodes (groups and datasets) within a hierarchy.

use derive_more::Display;
use thiserror::Error;

/// An invalid node path error.
#[derive(Debug, Error)]
#[error("invalid node path {_0:?}")]
pub struct NodePathError(String);

/// The path of a node within a hierarchy.
///
/// The root is `/`. Any other path begins with `/`, has no trailing `/`, and
/// no empty components.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodePath(String);

impl NodePath {
    /// Create a node path from a string.
    ///
    /// # Errors
    /// Returns a [`NodePathError`] if the string is not a valid node path.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if path == "/" {
            return Ok(Self::root());
        }
        if path.starts_with('/')
            && !path.ends_with('/')
            && !path.split('/').skip(1).any(str::is_empty)
        {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self('/'.to_string())
    }

    /// The path as a string, including the leading `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path relative to the root, without a leading `/`. Empty for the
    /// root itself.
    #[must_use]
    pub fn as_key_prefix(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    /// The path of a direct child of this node.
    ///
    /// # Errors
    /// Returns a [`NodePathError`] if `name` is empty or contains `/`.
    pub fn child(&self, name: &str) -> Result<Self, NodePathError> {
        if name.is_empty() || name.contains('/') {
            return Err(NodePathError(name.to_string()));
        }
        if self.0 == "/" {
            Self::new(&format!("/{name}"))
        } else {
            Self::new(&format!("{}/{name}", self.0))
        }
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}
