//! EFS filesystem and access point.

use serde_json::{Value, json};

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{PolicyDocument, ResourceKind, ResourceRequest, Statement};
use platform_utils::error::EngineError;

use crate::foundation::role;
use crate::iam::attach_policy;
use crate::keys;
use crate::names::STORAGE;
use crate::section::Section;

pub const FILESYSTEM_ID_KEY: &str = "storage.efs.filesystem_id";

pub fn register(registry: &mut Registry) {
    registry.register(STORAGE, Phase::Infrastructure, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(STORAGE, section)?;
    let sg_id = ctx.require::<String>(keys::EFS_SG_ID)?.clone();
    let service = ctx.service_name().to_string();
    let efs = section.child("efs")?;
    let ap_section = efs.child("accessPoint")?;

    let filesystem = ctx.provision(
        ResourceRequest::new(ResourceKind::EfsFileSystem, format!("{service}_efs"))
            .property("name", format!("{service}-efs"))
            .property("encrypted", efs.bool_or("encrypted", true)?)
            .property("lifecycle_policy", efs.str_or("lifecycle", "AFTER_30_DAYS")?)
            .property("subnet_ids", ctx.infrastructure().private_subnet_ids.clone())
            .property("security_group_id", sg_id),
    )?;

    let uid = ap_section.u64_or("uid", 1000)?;
    let gid = ap_section.u64_or("gid", 1000)?;
    let access_point = ctx.provision(
        ResourceRequest::new(ResourceKind::EfsAccessPoint, format!("{service}_efs_ap"))
            .property("file_system_id", filesystem.id.clone())
            .property("path", ap_section.str_or("path", "/data")?)
            .property("posix_user", json!({"uid": uid, "gid": gid})),
    )?;

    ctx.set(FILESYSTEM_ID_KEY, filesystem.id.clone());
    ctx.set(keys::EFS_ACCESS_POINT_ARN, access_point.arn.clone());
    ctx.export("efs_filesystem_id", filesystem.id.clone());

    if let Some(task_role) = role(ctx, keys::TASK_ROLE).cloned() {
        let document = PolicyDocument::new(vec![Statement::allow(
            [
                "elasticfilesystem:ClientMount",
                "elasticfilesystem:ClientWrite",
                "elasticfilesystem:ClientRootAccess",
            ],
            [filesystem.arn.clone()],
        )]);
        attach_policy(ctx, &task_role, format!("{service}_efs_task_policy"), document)?;
    }
    Ok(())
}
