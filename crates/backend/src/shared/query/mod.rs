pub mod builder;
pub mod date;
pub mod params;
pub mod populate;
pub mod predicate;
pub mod sql;

pub use builder::*;
pub use params::*;
pub use populate::*;
pub use predicate::*;
