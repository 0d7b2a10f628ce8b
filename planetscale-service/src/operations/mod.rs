//! Typed `(resource, operation)` dispatch onto the PlanetScale API.
//!
//! Names arrive as camelCase strings and are parsed once, before any item is
//! processed, so an unknown resource or operation never reaches the network.

pub mod branch;
pub mod database;
pub mod deploy_request;
pub mod organization;
pub mod params;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::ExecutionItem;
use crate::services::metrics::record_operation;
use crate::services::{JsonObject, PlanetScaleClient, ServiceError};

pub use branch::{BackupOperation, BranchOperation, PasswordOperation};
pub use database::{DatabaseOperation, DeployQueueOperation, WebhookOperation};
pub use deploy_request::DeployRequestOperation;
pub use organization::{
    MemberOperation, OrganizationOperation, RegionOperation, ServiceTokenOperation, UserOperation,
};
pub use params::Parameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Organization,
    Database,
    Branch,
    DeployRequest,
    DeployQueue,
    Password,
    Backup,
    ServiceToken,
    Webhook,
    OrganizationMember,
    Region,
    User,
}

impl Resource {
    pub fn parse(name: &str) -> Result<Self, ServiceError> {
        from_name(name).ok_or_else(|| ServiceError::UnsupportedResource(name.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Organization => "organization",
            Resource::Database => "database",
            Resource::Branch => "branch",
            Resource::DeployRequest => "deployRequest",
            Resource::DeployQueue => "deployQueue",
            Resource::Password => "password",
            Resource::Backup => "backup",
            Resource::ServiceToken => "serviceToken",
            Resource::Webhook => "webhook",
            Resource::OrganizationMember => "organizationMember",
            Resource::Region => "region",
            Resource::User => "user",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Organization(OrganizationOperation),
    Database(DatabaseOperation),
    Branch(BranchOperation),
    DeployRequest(DeployRequestOperation),
    DeployQueue(DeployQueueOperation),
    Password(PasswordOperation),
    Backup(BackupOperation),
    ServiceToken(ServiceTokenOperation),
    Webhook(WebhookOperation),
    OrganizationMember(MemberOperation),
    Region(RegionOperation),
    User(UserOperation),
}

impl Operation {
    pub fn parse(resource: &str, operation: &str) -> Result<Self, ServiceError> {
        let resource = Resource::parse(resource)?;

        let parsed = match resource {
            Resource::Organization => from_name(operation).map(Operation::Organization),
            Resource::Database => from_name(operation).map(Operation::Database),
            Resource::Branch => from_name(operation).map(Operation::Branch),
            Resource::DeployRequest => from_name(operation).map(Operation::DeployRequest),
            Resource::DeployQueue => from_name(operation).map(Operation::DeployQueue),
            Resource::Password => from_name(operation).map(Operation::Password),
            Resource::Backup => from_name(operation).map(Operation::Backup),
            Resource::ServiceToken => from_name(operation).map(Operation::ServiceToken),
            Resource::Webhook => from_name(operation).map(Operation::Webhook),
            Resource::OrganizationMember => {
                from_name(operation).map(Operation::OrganizationMember)
            }
            Resource::Region => from_name(operation).map(Operation::Region),
            Resource::User => from_name(operation).map(Operation::User),
        };

        parsed.ok_or_else(|| ServiceError::UnsupportedOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
        })
    }

    pub fn resource(&self) -> Resource {
        match self {
            Operation::Organization(_) => Resource::Organization,
            Operation::Database(_) => Resource::Database,
            Operation::Branch(_) => Resource::Branch,
            Operation::DeployRequest(_) => Resource::DeployRequest,
            Operation::DeployQueue(_) => Resource::DeployQueue,
            Operation::Password(_) => Resource::Password,
            Operation::Backup(_) => Resource::Backup,
            Operation::ServiceToken(_) => Resource::ServiceToken,
            Operation::Webhook(_) => Resource::Webhook,
            Operation::OrganizationMember(_) => Resource::OrganizationMember,
            Operation::Region(_) => Resource::Region,
            Operation::User(_) => Resource::User,
        }
    }
}

fn from_name<T: DeserializeOwned>(name: &str) -> Option<T> {
    serde_json::from_value(Value::String(name.to_string())).ok()
}

/// Runs one operation for one item.
pub async fn execute(
    client: &PlanetScaleClient,
    operation: Operation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    match operation {
        Operation::Organization(op) => organization::organization(client, op, params).await,
        Operation::Database(op) => database::database(client, op, params).await,
        Operation::Branch(op) => branch::branch(client, op, params).await,
        Operation::DeployRequest(op) => deploy_request::deploy_request(client, op, params).await,
        Operation::DeployQueue(op) => database::deploy_queue(client, op, params).await,
        Operation::Password(op) => branch::password(client, op, params).await,
        Operation::Backup(op) => branch::backup(client, op, params).await,
        Operation::ServiceToken(op) => organization::service_token(client, op, params).await,
        Operation::Webhook(op) => database::webhook(client, op, params).await,
        Operation::OrganizationMember(op) => organization::member(client, op, params).await,
        Operation::Region(op) => organization::region(client, op, params).await,
        Operation::User(op) => organization::user(client, op).await,
    }
}

/// Runs `operation` for every item in order and flattens the responses.
///
/// With `continue_on_fail`, a failing item contributes `{"error": message}`
/// and the batch continues; otherwise the first failure is returned.
pub async fn execute_batch(
    client: &PlanetScaleClient,
    operation: Operation,
    items: &[Parameters],
    continue_on_fail: bool,
) -> Result<Vec<ExecutionItem>, ServiceError> {
    let mut output = Vec::with_capacity(items.len());

    let resource = operation.resource();

    for (index, params) in items.iter().enumerate() {
        let result = execute(client, operation, params).await;
        record_operation(
            resource.as_str(),
            if result.is_ok() { "success" } else { "error" },
        );

        match result {
            Ok(Value::Array(values)) => {
                output.extend(values.into_iter().map(|json| ExecutionItem {
                    json,
                    paired_item: index,
                }));
            }
            Ok(json) => output.push(ExecutionItem {
                json,
                paired_item: index,
            }),
            Err(e) if continue_on_fail => {
                tracing::warn!(
                    resource = %resource,
                    item = index,
                    error = %e,
                    "Operation failed, continuing"
                );
                output.push(ExecutionItem {
                    json: json!({ "error": e.to_string() }),
                    paired_item: index,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(output)
}

/// Listing shared by every `getMany`-style operation.
///
/// `returnAll` walks every page; otherwise one page of `limit` items is
/// fetched and its `data` array returned.
pub(crate) async fn list(
    client: &PlanetScaleClient,
    endpoint: &str,
    params: &Parameters,
    mut query: JsonObject,
) -> Result<Value, ServiceError> {
    if params.bool_or("returnAll", false) {
        let items = client
            .request_all_items(Method::GET, endpoint, None, Some(&query))
            .await?;
        return Ok(Value::Array(items));
    }

    query.insert("limit".to_string(), json!(params.limit()?));
    let response = client
        .request(Method::GET, endpoint, None, Some(&query))
        .await?;

    Ok(match response {
        Value::Object(mut page) => match page.remove("data") {
            Some(Value::Array(data)) => Value::Array(data),
            _ => Value::Array(Vec::new()),
        },
        _ => Value::Array(Vec::new()),
    })
}

pub(crate) fn deleted(id: &str) -> Value {
    json!({ "success": true, "deleted": id })
}

/// Merges `extra` over `base`, then drops `null` and empty-string values.
pub(crate) fn body_with(base: JsonObject, extra: JsonObject) -> JsonObject {
    let mut merged = base;
    merged.extend(extra);
    crate::utils::clean_object(&merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_pairs() {
        assert_eq!(
            Operation::parse("organization", "getMany").unwrap(),
            Operation::Organization(OrganizationOperation::GetMany)
        );
        assert_eq!(
            Operation::parse("deployRequest", "skipRevertPeriod").unwrap(),
            Operation::DeployRequest(DeployRequestOperation::SkipRevertPeriod)
        );
        assert_eq!(
            Operation::parse("organizationMember", "invite").unwrap(),
            Operation::OrganizationMember(MemberOperation::Invite)
        );
        assert_eq!(
            Operation::parse("branch", "enableSafeMigrations").unwrap(),
            Operation::Branch(BranchOperation::EnableSafeMigrations)
        );
        assert_eq!(
            Operation::parse("user", "getCurrent").unwrap().resource(),
            Resource::User
        );
    }

    #[test]
    fn unknown_operation_names_resource() {
        let err = Operation::parse("branch", "explode").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The operation \"explode\" is not supported for branch resource"
        );

        let err = Operation::parse("user", "getMany").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The operation \"getMany\" is not supported for user resource"
        );
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!(matches!(
            Operation::parse("cluster", "get"),
            Err(ServiceError::UnsupportedResource(name)) if name == "cluster"
        ));
    }

    #[test]
    fn operation_names_are_case_sensitive() {
        assert!(Operation::parse("Branch", "get").is_err());
        assert!(Operation::parse("branch", "GetMany").is_err());
    }

    #[test]
    fn body_with_merges_and_cleans() {
        let base = json!({"name": "db", "region": ""}).as_object().cloned().unwrap();
        let extra = json!({"region": "us-east", "notes": null})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(
            Value::Object(body_with(base, extra)),
            json!({"name": "db", "region": "us-east"})
        );
    }
}
