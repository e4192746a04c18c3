//! `MongoUserStore` against a live MongoDB.
//!
//! Set `TOURMATE_TEST_MONGODB_URI` and run with `--ignored`. Each run uses a
//! fresh database which is dropped afterwards.

use anyhow::{Context, Result};
use mongodb::Client;
use tourmate::{
    auth::{
        models::{NewUser, Role, UserUpdate},
        store::EMAIL_IN_USE,
        UserStore,
    },
    config::DatabaseConfig,
    database::Database,
};
use ulid::Ulid;

const URI_ENV: &str = "TOURMATE_TEST_MONGODB_URI";

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        name: "Race Tester".to_string(),
        role: Role::User,
    }
}

fn email_conflict(result: &Result<impl Sized, tourmate::errors::AppError>) -> bool {
    result.as_ref().err().is_some_and(|err| {
        err.field_errors()
            .and_then(|errors| errors.get("email"))
            .is_some_and(|messages| messages.iter().any(|m| m == EMAIL_IN_USE))
    })
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn unique_index_rejects_concurrent_duplicates() -> Result<()> {
    let Ok(uri) = std::env::var(URI_ENV) else {
        eprintln!("Skipping: {URI_ENV} is not set");
        return Ok(());
    };
    let db_name = format!("tourmate_test_{}", Ulid::new().to_string().to_lowercase());
    let database = Database::connect(&DatabaseConfig {
        uri: uri.clone().into(),
        db_name: db_name.clone(),
    })
    .await?;
    let users = database.users();

    let (first, second) = tokio::join!(
        users.create(new_user("race@example.com")),
        users.create(new_user("RACE@example.com")),
    );
    assert!(first.is_ok() != second.is_ok(), "exactly one create must win");
    assert!(email_conflict(&first) || email_conflict(&second));

    let other = users.create(new_user("other@example.com")).await?;
    let moved = users
        .update(
            &other.id,
            UserUpdate {
                email: Some("race@example.com".to_string()),
                ..UserUpdate::default()
            },
        )
        .await;
    assert!(email_conflict(&moved));

    database.disconnect().await;
    Client::with_uri_str(&uri)
        .await?
        .database(&db_name)
        .drop()
        .await
        .context("failed to drop test database")?;
    Ok(())
}
