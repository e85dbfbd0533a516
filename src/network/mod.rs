//! Topology model of an electrical distribution network.
//!
//! Flat records (power sources, panels, breakers, loads) are turned into a
//! typed graph by [`builder::build`]. [`traversal`] walks it,
//! [`visibility`] derives what is currently shown, [`highlight`] paints the
//! paths through a selected node and [`tree`] nests panels for the nav tree.
//! [`session::DiagramSession`] ties them together for one UI session.

pub mod builder;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod records;
pub mod session;
pub mod traversal;
pub mod tree;
pub mod visibility;

pub use builder::build;
pub use error::NetworkError;
pub use graph::{Edge, EdgeId, Graph, Node, NodeId, NodeKind, Relation};
pub use highlight::{HighlightClass, HighlightSet, PathSummary, SelectionHighlighter};
pub use records::NetworkRecords;
pub use session::{DiagramSession, DiagramView, ViewEdge, ViewNode};
pub use tree::{PanelForest, TreeNode, assemble};
pub use visibility::{Visibility, VisibilityController, VisibilityState};
