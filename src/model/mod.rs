pub mod entities;
pub mod events;
pub mod field;
pub mod field_set;
pub mod projection;
pub mod query;
pub mod schema;
pub mod value;

pub use entities::*;
pub use events::*;
pub use field::*;
pub use field_set::*;
pub use projection::*;
pub use query::*;
pub use schema::*;
pub use value::*;
