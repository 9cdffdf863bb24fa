//! Mint session tokens for development and scripting.

use anyhow::{Context, Result};
use std::path::Path;

use crate::auth::JwtCodec;
use crate::model::{RecordId, User};
use crate::store::Filter;

/// Print a signed session token for `user_id`.
pub async fn execute(config_path: Option<&Path>, user_id: &str) -> Result<()> {
    let config = super::load_config(config_path)?;
    let id: RecordId = user_id
        .parse()
        .with_context(|| format!("Invalid user id: {user_id}"))?;

    let codec = JwtCodec::new(config.auth.secret()?.as_bytes(), config.auth.token_ttl());
    let (records, _) = super::open_stores(&config)?;

    let user = records
        .find_one::<User>(&Filter::eq(crate::model::fields::ID, id))
        .await?
        .with_context(|| format!("User not found: {id}"))?;

    let (token, expires) = codec.issue(&user)?;
    println!("{token}");
    eprintln!("Expires: {}", expires.to_rfc3339());
    eprintln!(
        "Use as cookie '{}' or 'Authorization: Bearer <token>'",
        config.auth.cookie_name
    );
    Ok(())
}
