use anyhow::{bail, Context};
use serde_json::json;

use crate::auth::password::hash_password_blocking;
use crate::auth::Role;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::config;
use crate::database::{DatabaseManager, PgStore, Store};
use crate::filter::FieldValue;
use crate::models::StaffRegistration;
use crate::resources::STAFF;

pub async fn hash_password(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    let hash = hash_password_blocking(password.to_string()).await?;
    output_success(output_format, "Password hashed", Some(json!({ "hash": hash })))
}

/// Admins are only ever minted here; staff registration over HTTP always yields `staff`
pub async fn create_admin(
    name: String,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let registration = StaffRegistration { name, email, password };
    registration.validate().finish()?;

    let pool = DatabaseManager::connect(&config().database)
        .await
        .context("create-admin needs a reachable DATABASE_URL")?;
    if config().database.sync_schema {
        DatabaseManager::sync_schema(&pool).await?;
    }
    let store = PgStore::new(pool.clone());

    let email = registration.email.trim().to_string();
    if store
        .find_one_by(&STAFF, "email", FieldValue::Text(email.clone()))
        .await?
        .is_some()
    {
        bail!("A staff account with email {} already exists", email);
    }

    let hash = hash_password_blocking(registration.password.clone()).await?;
    let row = store.create(&STAFF, registration.into_record(hash, Role::Admin)).await?;
    DatabaseManager::close(pool).await;

    tracing::info!("Created admin account {}", email);
    output_success(
        output_format,
        "Admin account created",
        Some(json!({ "staffId": row.get("staffId"), "email": email })),
    )
}
