pub mod lower;
pub mod nodes;

pub use lower::lower_program;
pub use nodes::*;
