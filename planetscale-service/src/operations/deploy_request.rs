use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::database::database_path;
use super::{body_with, list, Parameters};
use crate::services::{JsonObject, PlanetScaleClient, ServiceError};
use crate::utils::{build_endpoint, clean_object};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployRequestOperation {
    GetMany,
    Create,
    Get,
    Update,
    Close,
    Deploy,
    Queue,
    GetDeployOperations,
    SkipRevertPeriod,
    GetDeploymentDiff,
}

impl DeployRequestOperation {
    /// Path suffix for the state-transition actions, all issued as POST.
    fn action(&self) -> Option<&'static str> {
        match self {
            DeployRequestOperation::Close => Some("close"),
            DeployRequestOperation::Deploy => Some("deploy"),
            DeployRequestOperation::Queue => Some("queue"),
            DeployRequestOperation::SkipRevertPeriod => Some("skip-revert-period"),
            _ => None,
        }
    }
}

pub async fn deploy_request(
    client: &PlanetScaleClient,
    operation: DeployRequestOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let (org, db) = database_path(params)?;
    let requests = build_endpoint(&["organizations", &org, "databases", &db, "deploy-requests"]);

    let numbered = |suffix: &str| -> Result<String, ServiceError> {
        let number = params.identifier("deployRequestNumber")?;
        Ok(format!("{}/{}{}", requests, number, suffix))
    };

    match operation {
        DeployRequestOperation::GetMany => {
            let query = clean_object(&params.collection("filters")?);
            list(client, &requests, params, query).await
        }
        DeployRequestOperation::Create => {
            let mut base = JsonObject::new();
            base.insert("branch".to_string(), json!(params.string("branch")?));
            base.insert("into_branch".to_string(), json!(params.string("intoBranch")?));
            let body = body_with(base, params.collection("additionalFields")?);
            client
                .request(Method::POST, &requests, Some(&body), None)
                .await
        }
        DeployRequestOperation::Get => {
            client
                .request(Method::GET, &numbered("")?, None, None)
                .await
        }
        DeployRequestOperation::Update => {
            let body = clean_object(&params.collection("updateFields")?);
            client
                .request(Method::PATCH, &numbered("")?, Some(&body), None)
                .await
        }
        DeployRequestOperation::GetDeployOperations => {
            list(client, &numbered("/operations")?, params, JsonObject::new()).await
        }
        DeployRequestOperation::GetDeploymentDiff => {
            client
                .request(Method::GET, &numbered("/diff")?, None, None)
                .await
        }
        DeployRequestOperation::Close
        | DeployRequestOperation::Deploy
        | DeployRequestOperation::Queue
        | DeployRequestOperation::SkipRevertPeriod => {
            let suffix = format!("/{}", operation.action().unwrap_or_default());
            client
                .request(Method::POST, &numbered(&suffix)?, None, None)
                .await
        }
    }
}
