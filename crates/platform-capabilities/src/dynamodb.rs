//! DynamoDB tables.
//!
//! Grants `dynamodb:*` on the declared tables and their indexes and streams
//! to the ECS task role and the agent runtime role, whichever exist.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{ResourceKind, ResourceRequest};
use platform_utils::error::EngineError;

use crate::foundation::role;
use crate::iam::{attach_policy, scoped_to_arns};
use crate::keys;
use crate::names::DYNAMODB;
use crate::section::Section;

pub const TABLE_ARNS_KEY: &str = "dynamodb.table_arns";

pub fn register(registry: &mut Registry) {
    registry.register(DYNAMODB, Phase::Infrastructure, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(DYNAMODB, section)?;
    let tables = section.entries("tables")?;
    if tables.is_empty() {
        ctx.export("dynamodb_table_names", Vec::<String>::new());
        return Ok(());
    }

    let service = ctx.service_name().to_string();
    let mut names = Vec::with_capacity(tables.len());
    let mut arns = Vec::with_capacity(tables.len());

    for table in &tables {
        let name = table.required_str("name")?;
        let partition_key = table.required_str("partitionKey")?;
        let mut request =
            ResourceRequest::new(ResourceKind::DynamoDbTable, format!("{service}_{name}_table"))
                .property("name", format!("{service}-{name}"))
                .property("partition_key", partition_key)
                .property("partition_key_type", table.str_or("partitionKeyType", "S")?)
                .property("billing_mode", table.str_or("billingMode", "PAY_PER_REQUEST")?);
        if let Some(sort_key) = table.opt_str("sortKey")? {
            request = request
                .property("sort_key", sort_key)
                .property("sort_key_type", table.str_or("sortKeyType", "S")?);
        }
        if let Some(ttl) = table.opt_str("ttlAttribute")? {
            request = request.property("ttl_attribute", ttl);
        }

        let created = ctx.provision(request)?;
        ctx.set(format!("dynamodb.tables.{name}.arn"), created.arn.clone());
        ctx.set(format!("dynamodb.tables.{name}.name"), created.name.clone());
        ctx.export(format!("dynamodb_table_{}", name.replace('-', "_")), created.name);
        names.push(name.to_string());
        arns.push(created.arn);
    }

    ctx.export("dynamodb_table_names", names);

    if let Some(task_role) = role(ctx, keys::TASK_ROLE).cloned() {
        let document = scoped_to_arns(&["dynamodb:*"], &arns);
        attach_policy(ctx, &task_role, format!("{service}_dynamodb_policy"), document)?;
    }
    if let Some(runtime_role) = role(ctx, keys::AGENTCORE_RUNTIME_ROLE).cloned() {
        let document = scoped_to_arns(&["dynamodb:*"], &arns);
        attach_policy(
            ctx,
            &runtime_role,
            format!("{service}_dynamodb_agentcore_policy"),
            document,
        )?;
    }
    ctx.set(TABLE_ARNS_KEY, arns);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{info, provider};
    use platform_resources::Resource;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn role_resource(logical: &str, name: &str) -> Resource {
        Resource {
            kind: ResourceKind::IamRole,
            logical_name: logical.to_string(),
            id: format!("role-{logical}"),
            arn: format!("arn:aws:iam::123456789012:role/{name}"),
            name: name.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_zero_tables() {
        let mut p = provider();
        {
            let mut ctx = Context::new(info(), &mut p);
            ctx.set(keys::TASK_ROLE, role_resource("task", "orders-ecs-task"));
            handle(&json!({}), &mut ctx).unwrap();
            assert_eq!(ctx.exports()["dynamodb_table_names"], json!([]));
        }
        assert!(p.planned().is_empty());
    }

    #[test]
    fn test_tables_and_both_role_grants() {
        let mut p = provider();
        {
            let mut ctx = Context::new(info(), &mut p);
            ctx.set(keys::TASK_ROLE, role_resource("task", "orders-ecs-task"));
            ctx.set(
                keys::AGENTCORE_RUNTIME_ROLE,
                role_resource("rt", "orders-agentcore-runtime"),
            );
            let section = json!({"tables": [
                {"name": "jobs", "partitionKey": "pk", "sortKey": "sk", "ttlAttribute": "expires"},
                {"name": "agent-sessions", "partitionKey": "id", "partitionKeyType": "N"},
            ]});
            handle(&section, &mut ctx).unwrap();

            let exports = ctx.exports();
            assert_eq!(exports["dynamodb_table_jobs"], "orders-jobs");
            assert_eq!(exports["dynamodb_table_agent_sessions"], "orders-agent-sessions");
            assert_eq!(exports["dynamodb_table_names"], json!(["jobs", "agent-sessions"]));
            assert_eq!(ctx.get::<Vec<String>>(TABLE_ARNS_KEY).unwrap().len(), 2);
        }

        let jobs = p.find("orders_jobs_table").unwrap();
        assert_eq!(jobs.properties["sort_key_type"], "S");
        assert_eq!(jobs.properties["billing_mode"], "PAY_PER_REQUEST");
        let sessions = p.find("orders_agent-sessions_table").unwrap();
        assert!(!sessions.properties.contains_key("sort_key"));
        assert_eq!(sessions.properties["partition_key_type"], "N");

        let policies: Vec<_> = p.of_kind(ResourceKind::IamRolePolicy).collect();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].properties["role"], "orders-ecs-task");
        assert_eq!(policies[1].properties["role"], "orders-agentcore-runtime");
        let resources = policies[0].properties["policy"]["Statement"][0]["Resource"]
            .as_array()
            .unwrap();
        assert_eq!(resources.len(), 4);
    }

    #[test]
    fn test_partition_key_required() {
        let mut p = provider();
        let mut ctx = Context::new(info(), &mut p);
        let err = handle(&json!({"tables": [{"name": "jobs"}]}), &mut ctx).unwrap_err();
        assert!(err.to_string().contains("partitionKey"));
    }
}
