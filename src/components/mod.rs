pub mod network_diagram;
pub mod panel_tree;
