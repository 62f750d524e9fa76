//! Fixed collection schema used by the remote store.
//!
//! - `id`: primary key, externally generated UUID
//! - `text`: document content
//! - `vector`: float vector of the configured dimension
//! - `metadata`: document metadata as a JSON blob

use vecdex_core::api::CollectionField;

pub const ID_FIELD: &str = "id";
pub const TEXT_FIELD: &str = "text";
pub const VECTOR_FIELD: &str = "vector";
pub const METADATA_FIELD: &str = "metadata";

pub const ID_MAX_LENGTH: usize = 64;
pub const TEXT_MAX_LENGTH: usize = 65_535;

pub fn collection_schema(dimension: usize) -> Vec<CollectionField> {
    vec![
        CollectionField::primary_key(ID_FIELD, ID_MAX_LENGTH),
        CollectionField::varchar(TEXT_FIELD, TEXT_MAX_LENGTH),
        CollectionField::float_vector(VECTOR_FIELD, dimension),
        CollectionField::json(METADATA_FIELD),
    ]
}

/// Fields requested back from a search.
pub fn output_fields() -> Vec<String> {
    vec![TEXT_FIELD.to_string(), METADATA_FIELD.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecdex_core::api::FieldType;

    #[test]
    fn test_collection_schema_valid() {
        let schema = collection_schema(1536);
        assert_eq!(schema.len(), 4);

        let primary: Vec<_> = schema.iter().filter(|f| f.is_primary).collect();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].name, ID_FIELD);

        let vector = schema.iter().find(|f| f.name == VECTOR_FIELD).unwrap();
        assert_eq!(vector.field_type, FieldType::FloatVector { dim: 1536 });
    }
}
