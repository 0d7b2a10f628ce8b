//! Branch-scoped operations: branches, passwords and backups.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::database::database_path;
use super::{body_with, deleted, list, Parameters};
use crate::services::{JsonObject, PlanetScaleClient, ServiceError};
use crate::utils::{build_endpoint, clean_object, validate_branch_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchOperation {
    GetMany,
    Create,
    Get,
    Delete,
    Promote,
    Demote,
    EnableSafeMigrations,
    DisableSafeMigrations,
    GetSchema,
    LintSchema,
    GetDiff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PasswordOperation {
    GetMany,
    Create,
    Get,
    Delete,
    Renew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackupOperation {
    GetMany,
    Create,
    Get,
    Delete,
    Restore,
}

fn branches_endpoint(params: &Parameters) -> Result<String, ServiceError> {
    let (org, db) = database_path(params)?;
    Ok(build_endpoint(&["organizations", &org, "databases", &db, "branches"]))
}

pub async fn branch(
    client: &PlanetScaleClient,
    operation: BranchOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let branches = branches_endpoint(params)?;

    let branch_endpoint = |suffix: &str| -> Result<String, ServiceError> {
        let name = validate_branch_name(&params.string("branchName")?)?;
        Ok(format!("{}/{}{}", branches, name, suffix))
    };

    match operation {
        BranchOperation::GetMany => {
            let query = clean_object(&params.collection("filters")?);
            list(client, &branches, params, query).await
        }
        BranchOperation::Create => {
            let mut base = JsonObject::new();
            base.insert("name".to_string(), json!(params.string("name")?));
            base.insert(
                "parent_branch".to_string(),
                json!(params.string("parentBranch")?),
            );
            let body = body_with(base, params.collection("additionalFields")?);
            client
                .request(Method::POST, &branches, Some(&body), None)
                .await
        }
        BranchOperation::Get => {
            client
                .request(Method::GET, &branch_endpoint("")?, None, None)
                .await
        }
        BranchOperation::Delete => {
            let name = validate_branch_name(&params.string("branchName")?)?;
            let endpoint = format!("{}/{}", branches, name);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&name))
        }
        BranchOperation::Promote => {
            client
                .request(Method::POST, &branch_endpoint("/promote")?, None, None)
                .await
        }
        BranchOperation::Demote => {
            client
                .request(Method::POST, &branch_endpoint("/demote")?, None, None)
                .await
        }
        BranchOperation::EnableSafeMigrations => {
            client
                .request(Method::POST, &branch_endpoint("/safe-migrations")?, None, None)
                .await
        }
        BranchOperation::DisableSafeMigrations => {
            client
                .request(Method::DELETE, &branch_endpoint("/safe-migrations")?, None, None)
                .await
        }
        BranchOperation::GetSchema => {
            let query = clean_object(&params.collection("options")?);
            client
                .request(Method::GET, &branch_endpoint("/schema")?, None, Some(&query))
                .await
        }
        BranchOperation::LintSchema => {
            client
                .request(Method::GET, &branch_endpoint("/schema/lint")?, None, None)
                .await
        }
        BranchOperation::GetDiff => {
            let source = params.identifier("sourceBranch")?;
            let target = params.identifier("targetBranch")?;
            let endpoint = format!("{}/{}/diff", branches, source);

            let mut query = JsonObject::new();
            query.insert("branch".to_string(), json!(target));
            client
                .request(Method::GET, &endpoint, None, Some(&query))
                .await
        }
    }
}

fn branch_child_endpoint(params: &Parameters, collection: &str) -> Result<String, ServiceError> {
    let branches = branches_endpoint(params)?;
    let name = validate_branch_name(&params.string("branchName")?)?;
    Ok(format!("{}/{}/{}", branches, name, collection))
}

pub async fn password(
    client: &PlanetScaleClient,
    operation: PasswordOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let passwords = branch_child_endpoint(params, "passwords")?;

    match operation {
        PasswordOperation::GetMany => list(client, &passwords, params, JsonObject::new()).await,
        PasswordOperation::Create => {
            let body = clean_object(&params.collection("additionalFields")?);
            client
                .request(Method::POST, &passwords, Some(&body), None)
                .await
        }
        PasswordOperation::Get => {
            let id = params.identifier("passwordId")?;
            let endpoint = format!("{}/{}", passwords, id);
            client.request(Method::GET, &endpoint, None, None).await
        }
        PasswordOperation::Delete => {
            let id = params.identifier("passwordId")?;
            let endpoint = format!("{}/{}", passwords, id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&id))
        }
        PasswordOperation::Renew => {
            let id = params.identifier("passwordId")?;
            let endpoint = format!("{}/{}/renew", passwords, id);
            let body = clean_object(&params.collection("options")?);
            client
                .request(Method::POST, &endpoint, Some(&body), None)
                .await
        }
    }
}

pub async fn backup(
    client: &PlanetScaleClient,
    operation: BackupOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let backups = branch_child_endpoint(params, "backups")?;

    match operation {
        BackupOperation::GetMany => list(client, &backups, params, JsonObject::new()).await,
        BackupOperation::Create => {
            let body = clean_object(&params.collection("additionalFields")?);
            client
                .request(Method::POST, &backups, Some(&body), None)
                .await
        }
        BackupOperation::Get => {
            let id = params.identifier("backupId")?;
            let endpoint = format!("{}/{}", backups, id);
            client.request(Method::GET, &endpoint, None, None).await
        }
        BackupOperation::Delete => {
            let id = params.identifier("backupId")?;
            let endpoint = format!("{}/{}", backups, id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&id))
        }
        BackupOperation::Restore => {
            // Restoring creates a new branch seeded from the backup.
            let id = params.identifier("backupId")?;
            let mut body = JsonObject::new();
            body.insert("name".to_string(), json!(params.string("newBranchName")?));
            body.insert("backup_id".to_string(), json!(id));

            let branches = branches_endpoint(params)?;
            client
                .request(Method::POST, &branches, Some(&body), None)
                .await
        }
    }
}
