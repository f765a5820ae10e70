//! Module implement a partially persistent red-black tree over `i32`
//! keys, using per-node modification logs and node copying, so that
//! the tree can be searched, walked and serialized at any version of
//! its mutation history.

mod arena;
mod depth;
mod index;
mod node;
mod op;
mod stats;
mod versions;

pub use arena::NodeId;
pub use depth::Depth;
pub use index::{Index, Iter};
pub use node::Color;
pub use op::{run, Op};
pub use stats::Stats;
