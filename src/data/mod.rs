//! Data access: typed input records and the sources that supply them

pub mod records;
pub mod source;
pub mod validate;

pub use records::{
    ActivityLink, Connection, ConnectionKind, ContentRecord, Profile, Relationship,
    PERSON_PROFILE_TYPE,
};
pub use source::{read_table, DataError, DataResult, DataSource, InMemorySource, InputPaths, JsonTableSource};
pub use validate::{validate_content, validate_record, validate_rows, ContentBatch, ValidationError, REQUIRED_CONTENT_FIELDS};
