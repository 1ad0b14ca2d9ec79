pub mod block;
pub mod branch;
pub mod ids;
pub mod node;
pub mod snapshot;
