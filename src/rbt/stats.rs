use std::{fmt, result};

#[allow(unused_imports)]
use crate::rbt::Index;
use crate::rbt::Depth;

/// Statistic type, for [Index] type.
pub struct Stats {
    pub name: String,
    pub node_size: usize,
    pub n_count: usize,
    pub n_nodes: usize,
    pub n_versions: u64,
    pub n_roots: usize,
    pub blacks: Option<usize>,
    pub depths: Option<Depth>,
}

impl Stats {
    pub(crate) fn new(name: &str) -> Stats {
        Stats {
            name: name.to_string(),
            node_size: Default::default(),
            n_count: Default::default(),
            n_nodes: Default::default(),
            n_versions: Default::default(),
            n_roots: Default::default(),
            blacks: None,
            depths: None,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let none = "none".to_string();
        let b = self.blacks.as_ref().map_or(none.clone(), |x| x.to_string());
        let d = self.depths.as_ref().map_or(none, |x| x.to_string());
        writeln!(f, "rbt.name = {}", self.name)?;
        writeln!(
            f,
            "rbt = {{ n_count={}, n_nodes={}, node_size={}, blacks={} }}",
            self.n_count, self.n_nodes, self.node_size, b,
        )?;
        writeln!(
            f,
            "rbt = {{ n_versions={}, n_roots={} }}",
            self.n_versions, self.n_roots
        )?;
        writeln!(f, "rbt.depths = {}", d)
    }
}
