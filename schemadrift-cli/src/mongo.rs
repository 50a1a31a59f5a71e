// schemadrift-cli/src/mongo.rs
//! MongoDB implementation of the collection driver

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Database};
use serde_json::Value;

use schemadrift_core::{CollectionDriver, DriftError, IndexDefinition, Result};

/// Server error codes for a missing and an already existing namespace
const NAMESPACE_NOT_FOUND: i32 = 26;
const NAMESPACE_EXISTS: i32 = 48;

/// A driver bound to one database of one deployment
pub struct MongoDriver {
    database: Database,
}

impl MongoDriver {
    /// Connect to `uri` and check the deployment answers a ping
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await.map_err(driver_error)?;
        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(driver_error)?;
        Ok(Self { database })
    }
}

#[async_trait]
impl CollectionDriver for MongoDriver {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.database.list_collection_names(None).await.map_err(driver_error)
    }

    async fn count_documents(&self, collection: &str, filter: &Value) -> Result<u64> {
        let filter = json_to_document(filter).map_err(|e| DriftError::InvalidFilter(e.to_string()))?;
        self.database
            .collection::<Document>(collection)
            .count_documents(filter, None)
            .await
            .map_err(|e| collection_error(collection, e))
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<Value>> {
        let cursor = self
            .database
            .run_cursor_command(doc! { "listIndexes": collection }, None)
            .await
            .map_err(|e| collection_error(collection, e))?;
        let records: Vec<Document> = cursor.try_collect().await.map_err(driver_error)?;

        Ok(records.into_iter().map(record_to_json).collect())
    }

    async fn create_collection(&self, collection: &str) -> Result<()> {
        match self.database.create_collection(collection, None).await {
            Ok(()) => Ok(()),
            Err(e) if command_code(&e) == Some(NAMESPACE_EXISTS) => Ok(()),
            Err(e) => Err(driver_error(e)),
        }
    }

    async fn create_index(&self, collection: &str, index: &IndexDefinition) -> Result<()> {
        let index = json_to_document(&index.to_document()?)?;
        self.database
            .run_command(doc! { "createIndexes": collection, "indexes": [index] }, None)
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    async fn drop_index(&self, collection: &str, name: &str) -> Result<()> {
        self.database
            .collection::<Document>(collection)
            .drop_index(name, None)
            .await
            .map_err(driver_error)
    }
}

/// Convert an extended JSON object into a BSON document
pub fn json_to_document(value: &Value) -> Result<Document> {
    match Bson::try_from(value.clone()) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(DriftError::Serialization(format!(
            "expected a document, got {}",
            other
        ))),
        Err(e) => Err(DriftError::Serialization(e.to_string())),
    }
}

fn driver_error(e: mongodb::error::Error) -> DriftError {
    DriftError::Driver(e.to_string())
}

/// Raw index record as relaxed extended JSON, every field kept
fn record_to_json(record: Document) -> Value {
    Bson::Document(record).into_relaxed_extjson()
}

fn command_code(e: &mongodb::error::Error) -> Option<i32> {
    match e.kind.as_ref() {
        ErrorKind::Command(cmd) => Some(cmd.code),
        _ => None,
    }
}

fn collection_error(collection: &str, e: mongodb::error::Error) -> DriftError {
    if command_code(&e) == Some(NAMESPACE_NOT_FOUND) {
        return DriftError::CollectionNotFound(collection.to_string());
    }
    driver_error(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemadrift_core::KeyPattern;
    use serde_json::json;

    #[test]
    fn test_extended_json_filter() {
        let document = json_to_document(&json!({
            "_id": {"$oid": "507f1f77bcf86cd799439011"},
            "age": {"$gt": 21}
        }))
        .unwrap();
        assert!(matches!(document.get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(document.get_document("age").unwrap().get_i32("$gt").unwrap(), 21);
    }

    #[test]
    fn test_legacy_background_field_keeps_record() {
        let record = doc! { "v": 2, "key": { "b": 1 }, "name": "b_1", "background": 1 };
        let json = record_to_json(record);
        assert_eq!(json["background"], json!(1));

        let def = IndexDefinition::from_raw(&json).unwrap();
        assert_eq!(def.name, "b_1");
        assert_eq!(def.keys.fields()[0].field, "b");
    }

    #[test]
    fn test_double_ttl_is_read() {
        let record = doc! { "v": 2, "key": { "t": 1 }, "name": "ttl", "expireAfterSeconds": 3600.0 };
        let def = IndexDefinition::from_raw(&record_to_json(record)).unwrap();
        assert_eq!(def.name, "ttl");
        assert_eq!(def.expire_after_seconds, Some(3600));
    }

    #[test]
    fn test_collation_fields_survive() {
        let record = doc! {
            "v": 2,
            "key": { "name": 1 },
            "name": "name_ci",
            "unique": true,
            "collation": { "locale": "en", "strength": 2, "version": "57.1" },
        };
        let def = IndexDefinition::from_raw(&record_to_json(record)).unwrap();
        assert_eq!(def.unique, Some(true));
        assert_eq!(
            def.collation,
            Some(json!({"locale": "en", "strength": 2, "version": "57.1"}))
        );
    }

    #[test]
    fn test_non_document_rejected() {
        assert!(json_to_document(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_index_document_keeps_key_order() {
        let keys = KeyPattern::from_document(json!({"b": 1, "a": -1}).as_object().unwrap());
        let index = IndexDefinition::new("b_a", keys).with_unique(true);
        let document = json_to_document(&index.to_document().unwrap()).unwrap();

        let fields: Vec<&String> = document.get_document("key").unwrap().keys().collect();
        assert_eq!(fields, vec!["b", "a"]);
        assert_eq!(document.get_str("name").unwrap(), "b_a");
        assert!(document.get_bool("unique").unwrap());
    }
}
