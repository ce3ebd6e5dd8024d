// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response documents of the login item API, in JSON:API
//! shape (`{"data": {"id", "type", "attributes"}}`), plus the request
//! validation rules.
//!
//! ## Validation
//!
//! Request bodies are validated as raw JSON so that every problem is
//! reported at once, each with a JSON pointer to the offending member:
//!
//! | Attribute | Rule |
//! |-----------|------|
//! | `title`, `username`, `secret` | 1-50 printable ASCII characters, no spaces |
//! | `path` | 1-50 characters, starting with `/` |
//! | `note` | 1-1000 characters |
//!
//! All attributes are required and unknown members are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use crate::storage::{LoginItem, LoginItemData, RepositoryError};

/// Resource type of login items.
pub const LOGIN_ITEM_TYPE: &str = "logins";

const SHORT_TEXT_MAX: usize = 50;
const NOTE_MAX: usize = 1000;

// =============================================================================
// Responses
// =============================================================================

/// A login item as returned by the API, with decrypted attributes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoginItemApi {
    /// 21 character alphanumeric id.
    #[schema(example = "TWOD0FCXdBFGOVUXVgdq1")]
    pub id: String,
    /// Always `logins`.
    #[serde(rename = "type")]
    pub item_type: String,
    pub attributes: LoginItemAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginItemAttributes {
    /// Starts at 1, incremented by every content change.
    pub version: u64,
    pub last_modified_date: DateTime<Utc>,
    pub title: String,
    pub path: String,
    pub username: String,
    pub secret: String,
    pub note: String,
}

impl TryFrom<&LoginItem> for LoginItemApi {
    type Error = RepositoryError;

    fn try_from(item: &LoginItem) -> Result<Self, Self::Error> {
        let data = item.decrypted_data()?;
        Ok(Self {
            id: item.id.clone(),
            item_type: LOGIN_ITEM_TYPE.to_string(),
            attributes: LoginItemAttributes {
                version: item.version,
                last_modified_date: item.last_modified_date,
                title: data.title,
                path: data.path,
                username: data.username,
                secret: data.secret,
                note: data.note,
            },
        })
    }
}

/// Single item response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginItemDocument {
    pub data: LoginItemApi,
}

/// List response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginItemListDocument {
    pub data: Vec<LoginItemApi>,
}

// =============================================================================
// Requests
// =============================================================================

/// Attributes accepted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginItemInput {
    #[schema(example = "GitHub", min_length = 1, max_length = 50)]
    pub title: String,
    #[schema(example = "/work", min_length = 1, max_length = 50)]
    pub path: String,
    #[schema(example = "octocat", min_length = 1, max_length = 50)]
    pub username: String,
    #[schema(min_length = 1, max_length = 50)]
    pub secret: String,
    #[schema(min_length = 1, max_length = 1000)]
    pub note: String,
}

/// Body of `POST /logins`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLoginItemRequest {
    pub data: NewLoginItemResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewLoginItemResource {
    /// Must be `logins`.
    #[serde(rename = "type")]
    pub item_type: String,
    pub attributes: LoginItemInput,
}

/// Body of `PATCH /logins/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateLoginItemRequest {
    pub data: LoginItemResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginItemResource {
    /// Must be `logins`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Must equal the id in the URL.
    pub id: String,
    pub attributes: LoginItemInput,
}

/// Query of `GET /logins/{id}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VersionQuery {
    /// Version to read. Non-numeric or zero values select the latest version.
    pub version: Option<String>,
}

impl VersionQuery {
    pub fn requested_version(&self) -> Option<u64> {
        self.version
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// One validation problem: JSON pointer and message.
pub type ValidationIssue = (String, String);

/// Validate a create document and extract the item content.
pub fn validate_create(body: &Value) -> Result<LoginItemData, Vec<ValidationIssue>> {
    validate_document(body, None)
}

/// Validate an update document for the item `url_id`.
pub fn validate_update(body: &Value, url_id: &str) -> Result<LoginItemData, Vec<ValidationIssue>> {
    validate_document(body, Some(url_id))
}

fn validate_document(
    body: &Value,
    url_id: Option<&str>,
) -> Result<LoginItemData, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let Some(root) = body.as_object() else {
        return Err(vec![("/".to_string(), "\"value\" must be of type object".to_string())]);
    };
    reject_unknown(root, &["data"], "", &mut issues);

    let Some(data) = required_object(root, "data", "", &mut issues) else {
        return Err(issues);
    };

    let allowed: &[&str] = match url_id {
        Some(_) => &["type", "id", "attributes"],
        None => &["type", "attributes"],
    };
    reject_unknown(data, allowed, "/data", &mut issues);

    match data.get("type") {
        None => issues.push(required("/data", "type")),
        Some(Value::String(t)) if t == LOGIN_ITEM_TYPE => {}
        Some(_) => issues.push((
            "/data/type".to_string(),
            format!("\"data.type\" must be [{LOGIN_ITEM_TYPE}]"),
        )),
    }

    if let Some(url_id) = url_id {
        match data.get("id") {
            None => issues.push(required("/data", "id")),
            Some(Value::String(id)) if id == url_id => {}
            Some(_) => issues.push((
                "/data/id".to_string(),
                "\"data.id\" must be equal to id in URL".to_string(),
            )),
        }
    }

    let content = required_object(data, "attributes", "/data", &mut issues)
        .map(|attributes| validate_attributes(attributes, &mut issues));

    match content {
        Some(content) if issues.is_empty() => Ok(content),
        _ => Err(issues),
    }
}

fn validate_attributes(attributes: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> LoginItemData {
    const BASE: &str = "/data/attributes";
    reject_unknown(
        attributes,
        &["title", "path", "username", "secret", "note"],
        BASE,
        issues,
    );

    let mut field = |name: &str, max: usize, rule: fn(&str) -> Option<&'static str>| {
        let pointer = format!("{BASE}/{name}");
        match attributes.get(name) {
            None => {
                issues.push(required(BASE, name));
                String::new()
            }
            Some(Value::String(value)) => {
                let length = value.chars().count();
                if length == 0 {
                    issues.push((pointer, format!("\"{name}\" is not allowed to be empty")));
                } else if length > max {
                    issues.push((
                        pointer,
                        format!("\"{name}\" length must be less than or equal to {max} characters long"),
                    ));
                } else if let Some(problem) = rule(value) {
                    issues.push((pointer, format!("\"{name}\" {problem}")));
                }
                value.clone()
            }
            Some(_) => {
                issues.push((pointer, format!("\"{name}\" must be a string")));
                String::new()
            }
        }
    };

    LoginItemData {
        title: field("title", SHORT_TEXT_MAX, printable_token),
        path: field("path", SHORT_TEXT_MAX, absolute_path),
        username: field("username", SHORT_TEXT_MAX, printable_token),
        secret: field("secret", SHORT_TEXT_MAX, printable_token),
        note: field("note", NOTE_MAX, |_| None),
        otp: String::new(),
    }
}

fn printable_token(value: &str) -> Option<&'static str> {
    (!value.chars().all(|c| c.is_ascii_graphic())).then_some("fails to match the required pattern")
}

fn absolute_path(value: &str) -> Option<&'static str> {
    (!value.starts_with('/')).then_some("must start with \"/\"")
}

fn required(base: &str, name: &str) -> ValidationIssue {
    (format!("{base}/{name}"), format!("\"{name}\" is required"))
}

fn required_object<'a>(
    parent: &'a Map<String, Value>,
    name: &str,
    base: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a Map<String, Value>> {
    match parent.get(name) {
        None => {
            issues.push(required(base, name));
            None
        }
        Some(Value::Object(object)) => Some(object),
        Some(_) => {
            issues.push((
                format!("{base}/{name}"),
                format!("\"{name}\" must be of type object"),
            ));
            None
        }
    }
}

fn reject_unknown(
    object: &Map<String, Value>,
    allowed: &[&str],
    base: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for key in object.keys().filter(|k| !allowed.contains(&k.as_str())) {
        issues.push((format!("{base}/{key}"), format!("\"{key}\" is not allowed")));
    }
}
