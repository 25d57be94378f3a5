pub mod extract;
pub mod parse;
pub mod project;
pub mod resolve;
pub mod respond;

pub use extract::*;
pub use parse::*;
pub use project::*;
pub use resolve::*;
pub use respond::*;
