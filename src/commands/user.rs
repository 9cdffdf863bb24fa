//! User record management.

use anyhow::{Result, bail};
use std::path::Path;

use crate::model::{NewUser, User, fields};
use crate::store::Filter;

/// Insert a user without a password credential and print its id.
///
/// Handles are unique; adding a duplicate handle fails.
pub async fn add(config_path: Option<&Path>, name: &str, handle: &str, email: &str) -> Result<()> {
    let config = super::load_config(config_path)?;

    if name.trim().is_empty() || handle.trim().is_empty() {
        bail!("Name and handle cannot be empty");
    }

    let (records, _) = super::open_stores(&config)?;

    let existing = records.count::<User>(&Filter::eq(fields::HANDLE, handle)).await?;
    if existing > 0 {
        bail!("User handle already taken: {handle}");
    }

    let id = records
        .insert(&NewUser {
            name: name.to_string(),
            handle: handle.to_string(),
            email: email.to_string(),
            password_hash: None,
        })
        .await?;

    println!("{id}");
    Ok(())
}
