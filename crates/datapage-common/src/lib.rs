pub mod error;
pub mod schema;
pub mod value;

pub use error::*;
pub use schema::*;
pub use value::*;
