//! Compile a `MetadataFilter` into a server-side boolean expression.
//!
//! Every predicate becomes `metadata["key"] == <literal>` and predicates are
//! joined with `and`. Keys outside `[A-Za-z0-9_.-]` are rejected so they never
//! need escaping inside the JSON path.

use vecdex_core::api::{FilterValue, MetadataFilter, Result, VectorError};

use super::schema::METADATA_FIELD;

pub fn compile_filter(filter: &MetadataFilter) -> Result<Option<String>> {
    if filter.is_empty() {
        return Ok(None);
    }

    let mut clauses = Vec::with_capacity(filter.len());
    for (key, value) in filter.iter() {
        validate_key(key)?;
        let literal = match value {
            FilterValue::String(s) => quote(s),
            FilterValue::Int(i) => i.to_string(),
            FilterValue::Float(f) => {
                if !f.is_finite() {
                    return Err(VectorError::invalid_filter(key, "non-finite number"));
                }
                format_float(*f)
            }
            FilterValue::Bool(b) => b.to_string(),
        };
        clauses.push(format!(r#"{}["{}"] == {}"#, METADATA_FIELD, key, literal));
    }
    Ok(Some(clauses.join(" and ")))
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(VectorError::invalid_filter(key, "empty key"));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(VectorError::invalid_filter(
            key,
            format!("unsupported character {:?}", bad),
        ));
    }
    Ok(())
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Always render a decimal point so the server parses a float literal.
fn format_float(f: f64) -> String {
    let s = f.to_string();
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_filter_compiles_to_none() {
        assert_eq!(compile_filter(&MetadataFilter::new()).unwrap(), None);
    }

    #[test]
    fn test_typed_literals_joined_with_and() {
        let mut filter = MetadataFilter::new()
            .eq("source", "notes/a.md")
            .eq("page", 3i64)
            .eq("draft", false);
        filter.insert("score", FilterValue::Float(2.0));
        let expr = compile_filter(&filter).unwrap().unwrap();
        assert_eq!(
            expr,
            r#"metadata["draft"] == false and metadata["page"] == 3 and metadata["score"] == 2.0 and metadata["source"] == "notes/a.md""#
        );
    }

    #[test]
    fn test_string_values_escaped() {
        let filter = MetadataFilter::new().eq("title", r#"say "hi" \ bye"#);
        let expr = compile_filter(&filter).unwrap().unwrap();
        assert_eq!(expr, r#"metadata["title"] == "say \"hi\" \\ bye""#);
    }

    #[test]
    fn test_unsafe_keys_rejected() {
        let filter = MetadataFilter::new().eq(r#"a"] == 1 or metadata["b"#, "x");
        let err = compile_filter(&filter).unwrap_err();
        assert!(matches!(err, VectorError::InvalidFilter { .. }));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut filter = MetadataFilter::new();
        filter.insert("ratio", FilterValue::Float(f64::NAN));
        assert!(compile_filter(&filter).is_err());
    }
}
