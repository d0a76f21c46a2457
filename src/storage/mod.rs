pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryReadStore;
pub use sqlite::SqliteReadStore;
pub use traits::{
    columns, AnnotatedRead, AnnotationFilter, ColumnValue, Columns, ReadStore,
};
