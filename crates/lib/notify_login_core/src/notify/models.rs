//! JSON:API documents exchanged with the notify service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::token::format_created;

const USERS_TYPE: &str = "users";
const TOKENS_TYPE: &str = "tokens";

/// Top-level `{ "data": ... }` wrapper used by every request and response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// An account in the notify service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotifyUser {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub attributes: UserAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserAttributes {
    pub username: Option<String>,
    #[serde(rename = "internalID")]
    pub internal_id: Option<i64>,
    pub bot: Option<bool>,
}

/// An access token record as returned by `POST /tokens`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessToken {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    pub attributes: TokenAttributes,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenAttributes {
    pub token: String,
    pub created: Option<String>,
    pub origin: Option<String>,
}

/// Account to provision.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotifyUser {
    pub username: String,
    pub internal_id: i64,
    pub bot: bool,
}

/// Token to issue for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccessToken {
    pub token: String,
    pub created: DateTime<Utc>,
    pub origin: String,
    /// Notify account id the token belongs to.
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreateUserData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: CreateUserAttributes<'a>,
}

#[derive(Debug, Serialize)]
struct CreateUserAttributes<'a> {
    username: &'a str,
    #[serde(rename = "internalID")]
    internal_id: i64,
    bot: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: CreateTokenAttributes<'a>,
    relationships: TokenRelationships<'a>,
}

#[derive(Debug, Serialize)]
struct CreateTokenAttributes<'a> {
    token: &'a str,
    created: String,
    origin: &'a str,
}

#[derive(Debug, Serialize)]
struct TokenRelationships<'a> {
    user: Document<ResourceRef<'a>>,
}

#[derive(Debug, Serialize)]
struct ResourceRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

impl NewNotifyUser {
    /// Body for `POST /users`.
    pub fn to_document(&self) -> Document<CreateUserData<'_>> {
        Document {
            data: CreateUserData {
                kind: USERS_TYPE,
                attributes: CreateUserAttributes {
                    username: &self.username,
                    internal_id: self.internal_id,
                    bot: self.bot,
                },
            },
        }
    }
}

impl NewAccessToken {
    /// Body for `POST /tokens`.
    pub fn to_document(&self) -> Document<CreateTokenData<'_>> {
        Document {
            data: CreateTokenData {
                kind: TOKENS_TYPE,
                attributes: CreateTokenAttributes {
                    token: &self.token,
                    created: format_created(self.created),
                    origin: &self.origin,
                },
                relationships: TokenRelationships {
                    user: Document {
                        data: ResourceRef {
                            kind: USERS_TYPE,
                            id: &self.user_id,
                        },
                    },
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Resource ids
// ---------------------------------------------------------------------------

/// JSON:API ids are strings, but some backends emit numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
