pub mod filter;
pub mod inclusion;
pub mod order;

pub use filter::*;
pub use inclusion::*;
pub use order::*;
