pub mod time_group_graph;

pub use time_group_graph::TimeGroupGraph;
