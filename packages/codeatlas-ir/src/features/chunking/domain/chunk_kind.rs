//! Chunk kind enumeration
//!
//! Core hierarchy: Repo → Project → Module → File → Class → Function.
//! Extended kinds carry framework roles; the graph layer decides them and
//! the chunk builder derives the chunk kind from the graph node kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::models::GraphNodeKind;

/// Chunk kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Repository root (top-level)
    Repo,
    /// Project within repository (for monorepos)
    Project,
    /// Module (directory/package structure)
    Module,
    /// Source file
    File,
    /// Class/interface/struct
    Class,
    /// Function/method (leaf chunks)
    Function,

    // Extended kinds (framework/architecture roles)
    /// API route endpoint
    Route,
    /// Service layer
    Service,
    /// Data access layer
    Repository,
    /// Configuration
    Config,
    /// Background job/task
    Job,
    /// Middleware component
    Middleware,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Repo => "repo",
            ChunkKind::Project => "project",
            ChunkKind::Module => "module",
            ChunkKind::File => "file",
            ChunkKind::Class => "class",
            ChunkKind::Function => "function",
            ChunkKind::Route => "route",
            ChunkKind::Service => "service",
            ChunkKind::Repository => "repository",
            ChunkKind::Config => "config",
            ChunkKind::Job => "job",
            ChunkKind::Middleware => "middleware",
        }
    }

    /// Hierarchy level (0 = repo, 5 = function); extended kinds sit at the
    /// class level
    pub fn hierarchy_level(&self) -> usize {
        match self {
            ChunkKind::Repo => 0,
            ChunkKind::Project => 1,
            ChunkKind::Module => 2,
            ChunkKind::File => 3,
            ChunkKind::Class
            | ChunkKind::Route
            | ChunkKind::Service
            | ChunkKind::Repository
            | ChunkKind::Config
            | ChunkKind::Job
            | ChunkKind::Middleware => 4,
            ChunkKind::Function => 5,
        }
    }

    /// Structural kinds have no backing symbol of their own
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChunkKind::Repo | ChunkKind::Project | ChunkKind::Module | ChunkKind::File
        )
    }

    /// Class-like kinds: the chunk maps to a symbol plus its public methods
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            ChunkKind::Class
                | ChunkKind::Route
                | ChunkKind::Service
                | ChunkKind::Repository
                | ChunkKind::Config
                | ChunkKind::Job
                | ChunkKind::Middleware
        )
    }

    /// Derive the chunk kind from a graph node kind
    ///
    /// The graph layer is the single source of truth for semantic kinds;
    /// this is the fixed mapping the chunk builder applies.
    pub fn from_graph_kind(kind: GraphNodeKind) -> Option<ChunkKind> {
        match kind {
            GraphNodeKind::Service => Some(ChunkKind::Service),
            GraphNodeKind::Repository => Some(ChunkKind::Repository),
            GraphNodeKind::Route => Some(ChunkKind::Route),
            GraphNodeKind::Config => Some(ChunkKind::Config),
            GraphNodeKind::Job => Some(ChunkKind::Job),
            GraphNodeKind::Middleware => Some(ChunkKind::Middleware),
            GraphNodeKind::Class => Some(ChunkKind::Class),
            GraphNodeKind::Function | GraphNodeKind::Method => Some(ChunkKind::Function),
            GraphNodeKind::File => Some(ChunkKind::File),
            GraphNodeKind::Module => Some(ChunkKind::Module),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repo" => Ok(ChunkKind::Repo),
            "project" => Ok(ChunkKind::Project),
            "module" => Ok(ChunkKind::Module),
            "file" => Ok(ChunkKind::File),
            "class" => Ok(ChunkKind::Class),
            "function" => Ok(ChunkKind::Function),
            "route" => Ok(ChunkKind::Route),
            "service" => Ok(ChunkKind::Service),
            "repository" => Ok(ChunkKind::Repository),
            "config" => Ok(ChunkKind::Config),
            "job" => Ok(ChunkKind::Job),
            "middleware" => Ok(ChunkKind::Middleware),
            _ => Err(format!("Unknown chunk kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_level() {
        assert_eq!(ChunkKind::Repo.hierarchy_level(), 0);
        assert_eq!(ChunkKind::Module.hierarchy_level(), 2);
        assert_eq!(ChunkKind::Service.hierarchy_level(), 4);
        assert_eq!(ChunkKind::Function.hierarchy_level(), 5);
    }

    #[test]
    fn test_from_graph_kind_fixed_mapping() {
        assert_eq!(
            ChunkKind::from_graph_kind(GraphNodeKind::Service),
            Some(ChunkKind::Service)
        );
        assert_eq!(
            ChunkKind::from_graph_kind(GraphNodeKind::Method),
            Some(ChunkKind::Function)
        );
        assert_eq!(ChunkKind::from_graph_kind(GraphNodeKind::Variable), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("repo".parse::<ChunkKind>().unwrap(), ChunkKind::Repo);
        assert_eq!(
            "middleware".parse::<ChunkKind>().unwrap(),
            ChunkKind::Middleware
        );
        assert!("invalid".parse::<ChunkKind>().is_err());
    }
}
