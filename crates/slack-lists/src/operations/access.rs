//! Permissões de acesso a uma lista

use super::ListOperations;
use crate::error::{Result, SlackListsError};
use crate::retry::Idempotency;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Nível de acesso (`owner` só vale para usuários)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Owner,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetAccessRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAccessRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

/// Alvo do acesso: usuários XOR canais
enum Grantees<'a> {
    Users(&'a [String]),
    Channels(&'a [String]),
}

impl<'a> Grantees<'a> {
    fn from_ids(user_ids: &'a [String], channel_ids: &'a [String]) -> Result<Self> {
        match (user_ids.is_empty(), channel_ids.is_empty()) {
            (false, true) => Ok(Self::Users(user_ids)),
            (true, false) => Ok(Self::Channels(channel_ids)),
            (true, true) => Err(SlackListsError::ValidationError(
                "Either user_ids or channel_ids must be provided".to_string(),
            )),
            (false, false) => Err(SlackListsError::ValidationError(
                "Cannot specify both user_ids and channel_ids".to_string(),
            )),
        }
    }

    fn apply(&self, body: &mut Value) {
        match self {
            Self::Users(ids) => body["user_ids"] = json!(ids),
            Self::Channels(ids) => body["channel_ids"] = json!(ids),
        }
    }
}

impl ListOperations {
    /// `slackLists.access.set`
    pub async fn set_access(&self, request: SetAccessRequest) -> Result<Value> {
        let list_id = self.list_id(request.list_id.as_deref())?;
        let grantees = Grantees::from_ids(&request.user_ids, &request.channel_ids)?;

        if request.access_level == AccessLevel::Owner && matches!(grantees, Grantees::Channels(_)) {
            return Err(SlackListsError::ValidationError(
                "'owner' access level only works with user_ids".to_string(),
            ));
        }

        let mut body = json!({ "list_id": list_id, "access_level": request.access_level });
        grantees.apply(&mut body);

        self.invoke("slackLists.access.set", Idempotency::Idempotent, body)
            .await?;

        tracing::info!("🔐 Acesso '{}' concedido na lista {}", request.access_level, list_id);
        Ok(json!({ "success": true, "list_id": list_id, "access_level": request.access_level }))
    }

    /// `slackLists.access.delete`
    pub async fn delete_access(&self, request: DeleteAccessRequest) -> Result<Value> {
        let list_id = self.list_id(request.list_id.as_deref())?;
        let grantees = Grantees::from_ids(&request.user_ids, &request.channel_ids)?;

        let mut body = json!({ "list_id": list_id });
        grantees.apply(&mut body);

        self.invoke("slackLists.access.delete", Idempotency::Idempotent, body)
            .await?;

        tracing::info!("🔐 Acesso revogado na lista {}", list_id);
        Ok(json!({ "success": true, "list_id": list_id }))
    }
}
