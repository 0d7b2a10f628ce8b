//! Database-scoped operations: databases, the deploy queue and webhooks.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{body_with, deleted, list, Parameters};
use crate::services::{JsonObject, PlanetScaleClient, ServiceError};
use crate::utils::{build_endpoint, clean_object, validate_database_name, validate_organization_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseOperation {
    GetMany,
    Create,
    Get,
    Update,
    Delete,
    ListRegions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployQueueOperation {
    Get,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WebhookOperation {
    GetMany,
    Create,
    Get,
    Update,
    Delete,
    Test,
}

/// `(organization, database)` from `organizationName` and `databaseName`.
pub(crate) fn database_path(params: &Parameters) -> Result<(String, String), ServiceError> {
    let org = validate_organization_name(&params.string("organizationName")?)?;
    let db = validate_database_name(&params.string("databaseName")?)?;
    Ok((org, db))
}

pub async fn database(
    client: &PlanetScaleClient,
    operation: DatabaseOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let org = validate_organization_name(&params.string("organizationName")?)?;
    let databases = build_endpoint(&["organizations", &org, "databases"]);

    match operation {
        DatabaseOperation::GetMany => list(client, &databases, params, JsonObject::new()).await,
        DatabaseOperation::Create => {
            let mut base = JsonObject::new();
            base.insert("name".to_string(), json!(params.string("name")?));
            let body = body_with(base, params.collection("additionalFields")?);
            client
                .request(Method::POST, &databases, Some(&body), None)
                .await
        }
        DatabaseOperation::Get => {
            let db = validate_database_name(&params.string("databaseName")?)?;
            let endpoint = build_endpoint(&["organizations", &org, "databases", &db]);
            client.request(Method::GET, &endpoint, None, None).await
        }
        DatabaseOperation::Update => {
            let db = validate_database_name(&params.string("databaseName")?)?;
            let endpoint = build_endpoint(&["organizations", &org, "databases", &db]);
            let body = clean_object(&params.collection("updateFields")?);
            client
                .request(Method::PATCH, &endpoint, Some(&body), None)
                .await
        }
        DatabaseOperation::Delete => {
            let db = validate_database_name(&params.string("databaseName")?)?;
            let endpoint = build_endpoint(&["organizations", &org, "databases", &db]);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&db))
        }
        DatabaseOperation::ListRegions => {
            let db = validate_database_name(&params.string("databaseName")?)?;
            let endpoint = build_endpoint(&["organizations", &org, "databases", &db, "regions"]);
            list(client, &endpoint, params, JsonObject::new()).await
        }
    }
}

pub async fn deploy_queue(
    client: &PlanetScaleClient,
    operation: DeployQueueOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let (org, db) = database_path(params)?;
    let endpoint = build_endpoint(&["organizations", &org, "databases", &db, "deploy-queue"]);

    match operation {
        DeployQueueOperation::Get | DeployQueueOperation::List => {
            client.request(Method::GET, &endpoint, None, None).await
        }
    }
}

pub async fn webhook(
    client: &PlanetScaleClient,
    operation: WebhookOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let (org, db) = database_path(params)?;
    let webhooks = build_endpoint(&["organizations", &org, "databases", &db, "webhooks"]);

    match operation {
        WebhookOperation::GetMany => list(client, &webhooks, params, JsonObject::new()).await,
        WebhookOperation::Create => {
            let mut base = JsonObject::new();
            base.insert("url".to_string(), json!(params.string("url")?));
            base.insert("events".to_string(), json!(params.string_list("events")?));
            let body = body_with(base, params.collection("additionalFields")?);
            client
                .request(Method::POST, &webhooks, Some(&body), None)
                .await
        }
        WebhookOperation::Get => {
            let id = params.identifier("webhookId")?;
            let endpoint = format!("{}/{}", webhooks, id);
            client.request(Method::GET, &endpoint, None, None).await
        }
        WebhookOperation::Update => {
            let id = params.identifier("webhookId")?;
            let endpoint = format!("{}/{}", webhooks, id);
            let body = clean_object(&params.collection("updateFields")?);
            client
                .request(Method::PATCH, &endpoint, Some(&body), None)
                .await
        }
        WebhookOperation::Delete => {
            let id = params.identifier("webhookId")?;
            let endpoint = format!("{}/{}", webhooks, id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&id))
        }
        WebhookOperation::Test => {
            let id = params.identifier("webhookId")?;
            let endpoint = format!("{}/{}/test", webhooks, id);
            client.request(Method::POST, &endpoint, None, None).await
        }
    }
}
