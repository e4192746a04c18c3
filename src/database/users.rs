//! `UserStore` backed by the `users` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ReturnDocument,
    Collection,
};
use serde::{Deserialize, Serialize};
use std::future::IntoFuture;
use tracing::{info_span, Instrument, Span};

use super::USERS_COLLECTION;
use crate::{
    auth::{
        models::{NewUser, Role, UserRecord, UserUpdate},
        store::{email_in_use, UserStore},
    },
    errors::AppError,
    shared::validation::normalize_email,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    email: String,
    password: String,
    name: String,
    role: Role,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

impl UserDocument {
    fn into_record(self) -> UserRecord {
        UserRecord {
            id: self.id.to_hex(),
            email: self.email,
            password_hash: self.password,
            name: self.name,
            role: self.role,
            created_at: to_chrono(self.created_at),
            updated_at: to_chrono(self.updated_at),
        }
    }
}

fn to_chrono(value: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// True for unique-index violations, reported either as a write error or as a
/// command error depending on the operation.
pub(crate) fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn db_error(operation: &str, err: &MongoError) -> AppError {
    AppError::internal(format!("users.{operation} failed: {err}"))
}

/// Writes that hit the unique email index surface as `email_in_use()`.
fn write_error(operation: &str, err: &MongoError) -> AppError {
    if is_duplicate_key(err) {
        email_in_use()
    } else {
        db_error(operation, err)
    }
}

fn query_span(operation: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "mongodb",
        db.operation = operation,
        db.collection = USERS_COLLECTION
    )
}

fn update_document(update: UserUpdate, now: BsonDateTime) -> Document {
    let mut set = doc! { "updatedAt": now };
    if let Some(email) = update.email {
        set.insert("email", normalize_email(&email));
    }
    if let Some(name) = update.name {
        set.insert("name", name.trim());
    }
    if let Some(hash) = update.password_hash {
        set.insert("password", hash);
    }
    if let Some(role) = update.role {
        set.insert("role", role.as_str());
    }
    doc! { "$set": set }
}

#[derive(Clone, Debug)]
pub struct MongoUserStore {
    users: Collection<UserDocument>,
}

impl MongoUserStore {
    pub(super) fn new(users: Collection<UserDocument>) -> Self {
        Self { users }
    }

    async fn find_one(&self, filter: Document) -> Result<Option<UserRecord>, AppError> {
        self.users
            .find_one(filter)
            .into_future()
            .instrument(query_span("findOne"))
            .await
            .map(|found| found.map(UserDocument::into_record))
            .map_err(|err| db_error("findOne", &err))
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        self.find_one(doc! { "email": normalize_email(email) }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let Some(id) = parse_object_id(id) else {
            return Ok(None);
        };
        self.find_one(doc! { "_id": id }).await
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let now = BsonDateTime::now();
        let document = UserDocument {
            id: ObjectId::new(),
            email: normalize_email(&user.email),
            password: user.password_hash,
            name: user.name.trim().to_string(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        match self
            .users
            .insert_one(&document)
            .into_future()
            .instrument(query_span("insertOne"))
            .await
        {
            Ok(_) => Ok(document.into_record()),
            Err(err) => Err(write_error("insertOne", &err)),
        }
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<UserRecord, AppError> {
        let id = parse_object_id(id).ok_or_else(|| AppError::not_found("User"))?;

        let result = self
            .users
            .find_one_and_update(doc! { "_id": id }, update_document(update, BsonDateTime::now()))
            .return_document(ReturnDocument::After)
            .into_future()
            .instrument(query_span("findOneAndUpdate"))
            .await;

        match result {
            Ok(Some(document)) => Ok(document.into_record()),
            Ok(None) => Err(AppError::not_found("User")),
            Err(err) => Err(write_error("findOneAndUpdate", &err)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_object_id(id).ok_or_else(|| AppError::not_found("User"))?;
        let result = self
            .users
            .delete_one(doc! { "_id": id })
            .into_future()
            .instrument(query_span("deleteOne"))
            .await
            .map_err(|err| db_error("deleteOne", &err))?;
        if result.deleted_count == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::store::EMAIL_IN_USE;
    use mongodb::{
        bson,
        error::{CommandError, WriteError},
    };

    fn write_failure(code: i32) -> MongoError {
        let write: WriteError =
            bson::from_document(doc! { "code": code, "errmsg": "write failed" }).unwrap();
        MongoError::from(ErrorKind::Write(WriteFailure::WriteError(write)))
    }

    fn command_failure(code: i32) -> MongoError {
        let command: CommandError = bson::from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: tourmate.users index: email_1",
        })
        .unwrap();
        MongoError::from(ErrorKind::Command(command))
    }

    #[test]
    fn duplicate_key_is_detected_for_writes_and_commands() {
        assert!(is_duplicate_key(&write_failure(DUPLICATE_KEY)));
        assert!(is_duplicate_key(&command_failure(DUPLICATE_KEY)));
        assert!(!is_duplicate_key(&write_failure(121)));
        assert!(!is_duplicate_key(&command_failure(50)));
    }

    #[test]
    fn duplicate_key_maps_to_email_conflict() {
        let err = write_error("insertOne", &write_failure(DUPLICATE_KEY));
        assert_eq!(
            err.field_errors().and_then(|errors| errors.get("email")).cloned(),
            Some(vec![EMAIL_IN_USE.to_string()])
        );

        let err = write_error("findOneAndUpdate", &command_failure(DUPLICATE_KEY));
        assert!(err.field_errors().is_some_and(|errors| errors.contains_key("email")));

        assert!(matches!(
            write_error("insertOne", &write_failure(121)),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn malformed_ids_are_absent() {
        assert!(parse_object_id("not-an-object-id").is_none());
        assert!(parse_object_id("65f0c0ffee0000000000abcd").is_some());
    }

    #[test]
    fn document_uses_stored_field_names() {
        let document = UserDocument {
            id: ObjectId::new(),
            email: "ada@example.com".to_string(),
            password: "$argon2id$hash".to_string(),
            name: "Ada".to_string(),
            role: Role::Guide,
            created_at: BsonDateTime::from_millis(1_700_000_000_000),
            updated_at: BsonDateTime::from_millis(1_700_000_000_000),
        };
        let raw = bson::to_document(&document).unwrap();
        assert!(raw.contains_key("_id"));
        assert!(raw.contains_key("createdAt"));
        assert_eq!(raw.get_str("role").unwrap(), "guide");

        let id = document.id.to_hex();
        let record = document.into_record();
        assert_eq!(record.id, id);
        assert_eq!(record.password_hash, "$argon2id$hash");
        assert_eq!(record.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn update_sets_only_present_fields() {
        let now = BsonDateTime::from_millis(0);
        let update = update_document(
            UserUpdate {
                email: Some(" New@Example.com ".to_string()),
                role: Some(Role::Admin),
                ..UserUpdate::default()
            },
            now,
        );
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("email").unwrap(), "new@example.com");
        assert_eq!(set.get_str("role").unwrap(), "admin");
        assert!(!set.contains_key("name"));
        assert!(!set.contains_key("password"));
        assert!(set.contains_key("updatedAt"));
    }
}
