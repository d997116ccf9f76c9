use intop_core::{MountResource, StorageType};
use k8s_openapi::api::core::v1::{PodSpec, Volume, VolumeMount};
use serde_json::json;

use crate::catalog::Trait;
use crate::environment::Environment;
use crate::error::TraitError;

pub(crate) const ID: &str = "mount";

const CONFIGMAPS_MOUNT_PATH: &str = "/etc/intop/conf.d/_configmaps";
const SECRETS_MOUNT_PATH: &str = "/etc/intop/conf.d/_secrets";

/// Mounts configmaps and secrets into the integration container.
pub struct MountTrait;

impl Trait for MountTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1610
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &[super::container::ID]
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        env.integration
            .spec
            .traits
            .mount
            .as_ref()
            .is_some_and(|m| m.enabled != Some(false) && m.all_entries().next().is_some())
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let Some(mount) = env.integration.spec.traits.mount.clone() else {
            return Ok(());
        };

        let mut volumes = Vec::new();
        let mut mounts = Vec::new();
        for entry in mount.all_entries() {
            let resource =
                MountResource::parse(entry).map_err(|e| TraitError::invalid_configuration(ID, e))?;
            if resource.storage_type() == StorageType::File {
                tracing::debug!(
                    integration = %env.integration.name(),
                    entry = %entry,
                    "Skipping file entry, files are shipped with the image"
                );
                continue;
            }

            let (volume, volume_mount) = volume_for(&resource)?;
            if !volumes.iter().any(|v: &Volume| v.name == volume.name) {
                volumes.push(volume);
            }
            mounts.push(volume_mount);
        }

        let container_name = env.integration_container_name().to_string();
        env.resources.visit_pod_specs(|pod_spec| {
            add_mounts(pod_spec, &container_name, &volumes, &mounts)
        })
    }
}

fn volume_for(resource: &MountResource) -> Result<(Volume, VolumeMount), TraitError> {
    let (volume, base) = match resource.storage_type() {
        StorageType::Secret => (
            json!({
                "name": format!("secret-{}", resource.name()),
                "secret": { "secretName": resource.name() },
            }),
            SECRETS_MOUNT_PATH,
        ),
        _ => (
            json!({
                "name": format!("configmap-{}", resource.name()),
                "configMap": { "name": resource.name() },
            }),
            CONFIGMAPS_MOUNT_PATH,
        ),
    };
    let volume: Volume = serde_json::from_value(volume)?;

    let mount_path = match (resource.destination(), resource.key()) {
        (Some(destination), _) => destination.to_string(),
        (None, Some(key)) => format!("{base}/{}/{key}", resource.name()),
        (None, None) => format!("{base}/{}", resource.name()),
    };
    let volume_mount = VolumeMount {
        name: volume.name.clone(),
        mount_path,
        sub_path: resource.key().map(str::to_string),
        read_only: Some(true),
        ..Default::default()
    };
    Ok((volume, volume_mount))
}

fn add_mounts(
    pod_spec: &mut PodSpec,
    container_name: &str,
    volumes: &[Volume],
    mounts: &[VolumeMount],
) -> Result<(), TraitError> {
    let container = pod_spec
        .containers
        .iter_mut()
        .find(|c| c.name == container_name)
        .ok_or_else(|| {
            TraitError::failed(ID, format!("unable to find integration container {container_name}"))
        })?;

    let container_mounts = container.volume_mounts.get_or_insert_with(Vec::new);
    for mount in mounts {
        if !container_mounts.iter().any(|m| m.mount_path == mount.mount_path) {
            container_mounts.push(mount.clone());
        }
    }

    let pod_volumes = pod_spec.volumes.get_or_insert_with(Vec::new);
    for volume in volumes {
        if !pod_volumes.iter().any(|v| v.name == volume.name) {
            pod_volumes.push(volume.clone());
        }
    }
    Ok(())
}
