//! Organization-scoped and account-level operations: organizations, members,
//! service tokens, regions and the current user.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::split_list;
use super::{body_with, deleted, list, Parameters};
use crate::services::{JsonObject, PlanetScaleClient, ServiceError};
use crate::utils::{build_endpoint, clean_object, validate_organization_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrganizationOperation {
    GetMany,
    Get,
    ListRegions,
    ListAuditLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberOperation {
    GetMany,
    Invite,
    Get,
    Update,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceTokenOperation {
    GetMany,
    Create,
    Get,
    Delete,
    ListAccesses,
    AddAccess,
    DeleteAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionOperation {
    GetMany,
    Get,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserOperation {
    GetCurrent,
}

fn organization_name(params: &Parameters) -> Result<String, ServiceError> {
    validate_organization_name(&params.string("organizationName")?)
}

pub async fn organization(
    client: &PlanetScaleClient,
    operation: OrganizationOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    match operation {
        OrganizationOperation::GetMany => {
            list(client, "/organizations", params, JsonObject::new()).await
        }
        OrganizationOperation::Get => {
            let org = organization_name(params)?;
            let endpoint = build_endpoint(&["organizations", &org]);
            client.request(Method::GET, &endpoint, None, None).await
        }
        OrganizationOperation::ListRegions => {
            let org = organization_name(params)?;
            let endpoint = build_endpoint(&["organizations", &org, "regions"]);
            list(client, &endpoint, params, JsonObject::new()).await
        }
        OrganizationOperation::ListAuditLogs => {
            let org = organization_name(params)?;
            let endpoint = build_endpoint(&["organizations", &org, "audit-logs"]);
            let query = clean_object(&params.collection("filters")?);
            list(client, &endpoint, params, query).await
        }
    }
}

pub async fn member(
    client: &PlanetScaleClient,
    operation: MemberOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let org = organization_name(params)?;
    let members = build_endpoint(&["organizations", &org, "members"]);

    match operation {
        MemberOperation::GetMany => list(client, &members, params, JsonObject::new()).await,
        MemberOperation::Invite => {
            let mut additional = params.collection("additionalFields")?;
            if let Some(Value::String(team_ids)) = additional.get("team_ids") {
                let team_ids = split_list(team_ids);
                additional.insert("team_ids".to_string(), json!(team_ids));
            }

            let mut base = JsonObject::new();
            base.insert("email".to_string(), json!(params.string("email")?));

            let endpoint = build_endpoint(&["organizations", &org, "invitations"]);
            let body = body_with(base, additional);
            client
                .request(Method::POST, &endpoint, Some(&body), None)
                .await
        }
        MemberOperation::Get => {
            let id = params.identifier("memberId")?;
            let endpoint = format!("{}/{}", members, id);
            client.request(Method::GET, &endpoint, None, None).await
        }
        MemberOperation::Update => {
            let id = params.identifier("memberId")?;
            let endpoint = format!("{}/{}", members, id);
            let body = clean_object(&params.collection("updateFields")?);
            client
                .request(Method::PATCH, &endpoint, Some(&body), None)
                .await
        }
        MemberOperation::Remove => {
            let id = params.identifier("memberId")?;
            let endpoint = format!("{}/{}", members, id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(json!({ "success": true, "removed": id }))
        }
    }
}

pub async fn service_token(
    client: &PlanetScaleClient,
    operation: ServiceTokenOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    let org = organization_name(params)?;
    let tokens = build_endpoint(&["organizations", &org, "service-tokens"]);

    match operation {
        ServiceTokenOperation::GetMany => list(client, &tokens, params, JsonObject::new()).await,
        ServiceTokenOperation::Create => {
            let mut body = JsonObject::new();
            body.insert("name".to_string(), json!(params.string("name")?));
            client
                .request(Method::POST, &tokens, Some(&body), None)
                .await
        }
        ServiceTokenOperation::Get => {
            let id = params.identifier("serviceTokenId")?;
            let endpoint = format!("{}/{}", tokens, id);
            client.request(Method::GET, &endpoint, None, None).await
        }
        ServiceTokenOperation::Delete => {
            let id = params.identifier("serviceTokenId")?;
            let endpoint = format!("{}/{}", tokens, id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&id))
        }
        ServiceTokenOperation::ListAccesses => {
            let id = params.identifier("serviceTokenId")?;
            let endpoint = format!("{}/{}/accesses", tokens, id);
            list(client, &endpoint, params, JsonObject::new()).await
        }
        ServiceTokenOperation::AddAccess => {
            let id = params.identifier("serviceTokenId")?;
            let endpoint = format!("{}/{}/accesses", tokens, id);

            let mut body = JsonObject::new();
            body.insert("resource".to_string(), json!(params.string("resourceType")?));
            body.insert(
                "resource_name".to_string(),
                json!(params.string("resourceName")?),
            );
            body.insert("accesses".to_string(), json!(params.string_list("accesses")?));

            client
                .request(Method::POST, &endpoint, Some(&body), None)
                .await
        }
        ServiceTokenOperation::DeleteAccess => {
            let id = params.identifier("serviceTokenId")?;
            let access_id = params.identifier("accessId")?;
            let endpoint = format!("{}/{}/accesses/{}", tokens, id, access_id);
            client.request(Method::DELETE, &endpoint, None, None).await?;
            Ok(deleted(&access_id))
        }
    }
}

pub async fn region(
    client: &PlanetScaleClient,
    operation: RegionOperation,
    params: &Parameters,
) -> Result<Value, ServiceError> {
    match operation {
        RegionOperation::GetMany => {
            let query = clean_object(&params.collection("filters")?);
            list(client, "/regions", params, query).await
        }
        RegionOperation::Get => {
            let slug = params.identifier("regionSlug")?;
            let endpoint = build_endpoint(&["regions", &slug]);
            client.request(Method::GET, &endpoint, None, None).await
        }
    }
}

pub async fn user(
    client: &PlanetScaleClient,
    operation: UserOperation,
) -> Result<Value, ServiceError> {
    match operation {
        UserOperation::GetCurrent => client.request(Method::GET, "/user", None, None).await,
    }
}
