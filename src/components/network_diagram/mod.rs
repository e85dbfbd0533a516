mod component;
mod render;
mod state;
mod types;

pub use component::NetworkDiagramCanvas;
pub use types::DiagramData;
