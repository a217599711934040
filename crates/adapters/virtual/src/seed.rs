//! JSON seed files for the in-memory stores.
//!
//! - rules: an object mapping rule ids to rule documents
//! - users: an array of user records (`uid`, `email`, `tokens`)
//! - realtime: any JSON value, written at the root of the tree

use std::collections::BTreeMap;
use std::path::Path;

use alerthub_domain::id::RuleId;
use alerthub_domain::rule::RuleDocument;
use alerthub_domain::user::UserRecord;
use serde_json::Value;

use crate::error::VirtualError;

fn read(path: &Path) -> Result<String, VirtualError> {
    std::fs::read_to_string(path).map_err(|source| VirtualError::SeedRead {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a rules seed document.
///
/// # Errors
///
/// Returns [`VirtualError::SeedFormat`] when `raw` is not a JSON object.
pub fn parse_rules(raw: &str) -> Result<Vec<RuleDocument>, VirtualError> {
    let rules: BTreeMap<String, Value> = serde_json::from_str(raw)?;
    Ok(rules
        .into_iter()
        .map(|(id, data)| RuleDocument::new(RuleId::new(id), data))
        .collect())
}

/// Parse a users seed document.
///
/// # Errors
///
/// Returns [`VirtualError::SeedFormat`] when `raw` is not an array of users.
pub fn parse_users(raw: &str) -> Result<Vec<UserRecord>, VirtualError> {
    Ok(serde_json::from_str(raw)?)
}

/// Load rule documents from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_rules(path: &Path) -> Result<Vec<RuleDocument>, VirtualError> {
    parse_rules(&read(path)?)
}

/// Load user records from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_users(path: &Path) -> Result<Vec<UserRecord>, VirtualError> {
    parse_users(&read(path)?)
}

/// Load the initial realtime tree from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_realtime(path: &Path) -> Result<Value, VirtualError> {
    Ok(serde_json::from_str(&read(path)?)?)
}
