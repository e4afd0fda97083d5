//! Canonical fully-qualified object names.
//!
//! A qualified name is 1-3 dot-separated quoted components, e.g.
//! `"DB"."SCHEMA"."OBJECT"`. Stage and external-location references keep a
//! leading `@` as the very first character of the final string, outside all
//! quoting. Components that were not quoted in the source SQL are folded to
//! upper case before quoting, matching warehouse identifier semantics.

/// Builds the canonical fully-qualified name for a raw object reference.
///
/// One- and two-part names are completed from the statement's ambient
/// `database`/`schema` context. Names with four or more parts pass through
/// permissively after the per-part quoting pass; this function is total over
/// any input and never fails.
pub fn qualify(database: &str, schema: &str, raw: &str) -> String {
    if raw.starts_with('@') {
        let name = raw.trim_start_matches('@');
        format!("@{}", quote_parts(&complete(database, schema, name)))
    } else {
        quote_parts(&complete(database, schema, raw))
    }
}

/// Completes a name to three parts using the ambient database/schema.
fn complete(database: &str, schema: &str, name: &str) -> String {
    match name.split('.').count() {
        1 => format!("{database}.{schema}.{name}"),
        2 => format!("{database}.{name}"),
        _ => name.to_string(),
    }
}

/// Upper-cases unquoted parts, then re-wraps every part in double quotes.
fn quote_parts(name: &str) -> String {
    name.split('.')
        .map(|part| {
            let folded = if part.starts_with('"') {
                part.to_string()
            } else {
                part.to_uppercase()
            };
            format!("\"{}\"", folded.trim_matches('"'))
        })
        .collect::<Vec<_>>()
        .join(".")
}
