// schemadrift-core/src/statement.rs
//! Create-index statement rendering
//!
//! When repair is not authorized, indexes missing from the target are
//! reported as a mongo shell statement the operator can run by hand:
//!
//! ```text
//! db.getCollection("users").createIndex({ email: 1 }, { name: "idx_email", unique: true })
//! ```
//!
//! [`parse`] reads such a statement back into an [`IndexDefinition`].

use serde_json::{Map, Value};

use crate::error::{DriftError, Result};
use crate::index::IndexDefinition;

/// Render the shell statement that creates `index` on `collection`
///
/// Options appear in the order name, unique, sparse, expireAfterSeconds,
/// partialFilterExpression, collation; absent options are left out and
/// explicit `false` values are kept.
pub fn render(collection: &str, index: &IndexDefinition) -> String {
    let mut options = vec![format!("name: {}", Value::String(index.name.clone()))];

    if let Some(unique) = index.unique {
        options.push(format!("unique: {}", unique));
    }
    if let Some(sparse) = index.sparse {
        options.push(format!("sparse: {}", sparse));
    }
    if let Some(seconds) = index.expire_after_seconds {
        options.push(format!("expireAfterSeconds: {}", seconds));
    }
    if let Some(filter) = &index.partial_filter_expression {
        options.push(format!("partialFilterExpression: {}", filter));
    }
    if let Some(collation) = &index.collation {
        options.push(format!("collation: {}", collation));
    }

    format!(
        "db.getCollection({}).createIndex({}, {{ {} }})",
        Value::String(collection.to_string()),
        index.keys,
        options.join(", ")
    )
}

/// Parse a create-index statement back into `(collection, definition)`
///
/// Accepts both `db.getCollection("c").createIndex(...)` and the short
/// `db.c.createIndex(...)` form, with bare or quoted field names.
pub fn parse(statement: &str) -> Result<(String, IndexDefinition)> {
    let statement = statement.trim();
    let rest = statement
        .strip_prefix("db.")
        .ok_or_else(|| invalid("statement must start with 'db.'"))?;

    let (collection, rest) = match rest.strip_prefix("getCollection(") {
        Some(quoted) => {
            let mut stream = serde_json::Deserializer::from_str(quoted).into_iter::<String>();
            let collection = stream
                .next()
                .ok_or_else(|| invalid("missing collection name"))?
                .map_err(|e| invalid(&format!("bad collection name: {}", e)))?;
            let after = quoted[stream.byte_offset()..]
                .trim_start()
                .strip_prefix(')')
                .ok_or_else(|| invalid("unterminated getCollection call"))?;
            (collection, after)
        }
        None => {
            let end = rest
                .find(".createIndex(")
                .ok_or_else(|| invalid("missing createIndex call"))?;
            (rest[..end].to_string(), &rest[end..])
        }
    };

    let args = rest
        .strip_prefix(".createIndex(")
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid("malformed createIndex call"))?;

    let json = format!("[{}]", quote_bare_keys(args));
    let values: Vec<Value> =
        serde_json::from_str(&json).map_err(|e| invalid(&format!("bad arguments: {}", e)))?;

    let mut args = values.into_iter();
    let keys = args
        .next()
        .filter(Value::is_object)
        .ok_or_else(|| invalid("key argument must be a document"))?;
    let mut record = match args.next() {
        Some(Value::Object(options)) => options,
        Some(_) => return Err(invalid("options argument must be a document")),
        None => Map::new(),
    };
    if args.next().is_some() {
        return Err(invalid("too many arguments to createIndex"));
    }
    record.insert("key".to_string(), keys);

    let index = IndexDefinition::from_raw(&Value::Object(record))
        .map_err(|e| invalid(&e.to_string()))?;
    Ok((collection, index))
}

fn invalid(msg: &str) -> DriftError {
    DriftError::InvalidStatement(msg.to_string())
}

/// Turn shell object literals into JSON by quoting bare field names
///
/// A bare word is a field name when the next non-space character is `:`;
/// other bare words (`true`, `false`, `null`) are copied through.
fn quote_bare_keys(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            // copy the string literal, escapes included
            out.push(c);
            i += 1;
            while i < chars.len() {
                out.push(chars[i]);
                if chars[i] == '\\' && i + 1 < chars.len() {
                    out.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                i += 1;
                if chars[i - 1] == '"' {
                    break;
                }
            }
        } else if is_word_char(c) && !c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && chars[j] == ':' {
                out.push_str(&Value::String(word).to_string());
            } else {
                out.push_str(&word);
            }
        } else {
            out.push(c);
            i += 1;
        }
    }

    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::diff_index;
    use crate::index::KeyPattern;
    use serde_json::json;

    fn keys(doc: Value) -> KeyPattern {
        KeyPattern::from_document(doc.as_object().unwrap())
    }

    #[test]
    fn test_render_unique_email() {
        let index = IndexDefinition::new("idx_email", keys(json!({"email": 1}))).with_unique(true);
        assert_eq!(
            render("users", &index),
            r#"db.getCollection("users").createIndex({ email: 1 }, { name: "idx_email", unique: true })"#
        );
    }

    #[test]
    fn test_render_option_order_and_explicit_false() {
        let index = IndexDefinition::new("full", keys(json!({"a": 1, "b.c": -1})))
            .with_collation(json!({"locale": "hu", "strength": 2}))
            .with_partial_filter(json!({"a": {"$exists": true}}))
            .with_expire_after_seconds(3600)
            .with_sparse(false)
            .with_unique(true);

        assert_eq!(
            render("events", &index),
            concat!(
                r#"db.getCollection("events").createIndex({ a: 1, "b.c": -1 }, "#,
                r#"{ name: "full", unique: true, sparse: false, expireAfterSeconds: 3600, "#,
                r#"partialFilterExpression: {"a":{"$exists":true}}, collation: {"locale":"hu","strength":2} })"#
            )
        );
    }

    #[test]
    fn test_render_is_total_for_odd_input() {
        let index = IndexDefinition::new("we\"ird", KeyPattern::default());
        let statement = render("odd \"coll\"", &index);
        assert!(statement.starts_with(r#"db.getCollection("odd \"coll\"").createIndex({}, "#));
    }

    #[test]
    fn test_round_trip() {
        let index = IndexDefinition::new("full", keys(json!({"z": 1, "$**": 1, "a.b": "text"})))
            .with_unique(false)
            .with_sparse(true)
            .with_expire_after_seconds(7)
            .with_partial_filter(json!({"status": {"$in": ["a", "b: c"]}}))
            .with_collation(json!({"locale": "en", "caseLevel": true}));

        let (collection, parsed) = parse(&render("my.coll", &index)).unwrap();
        assert_eq!(collection, "my.coll");
        assert!(diff_index(&index, &parsed).is_empty());
        assert_eq!(parsed, index);
    }

    #[test]
    fn test_parse_short_form() {
        let (collection, index) =
            parse(r#"db.users.createIndex({ email: 1 }, { name: "idx_email", unique: true })"#).unwrap();
        assert_eq!(collection, "users");
        assert_eq!(index.name, "idx_email");
        assert_eq!(index.unique, Some(true));
        assert_eq!(index.keys, keys(json!({"email": 1})));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("createIndex({a: 1})").is_err());
        assert!(parse(r#"db.users.find({})"#).is_err());
        assert!(parse(r#"db.users.createIndex({ a: 1 })"#).is_err());
        assert!(parse(r#"db.users.createIndex([1], { name: "x" })"#).is_err());
        assert!(parse(r#"db.getCollection("users".createIndex({ a: 1 }, { name: "x" })"#).is_err());
    }

    #[test]
    fn test_quote_bare_keys() {
        assert_eq!(
            quote_bare_keys(r#"{ a: 1, "b": true, c : null, d: "e: f" }"#),
            r#"{ "a": 1, "b": true, "c" : null, "d": "e: f" }"#
        );
        assert_eq!(quote_bare_keys(r#"{ s: "quote \" x: y" }"#), r#"{ "s": "quote \" x: y" }"#);
    }
}
