pub mod schema;
pub mod table;
pub mod upload;
pub mod value;

pub use schema::*;
pub use table::*;
pub use upload::*;
pub use value::*;
