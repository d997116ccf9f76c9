//! Kit lookup and priority based selection.

use std::collections::BTreeSet;

use intop_client::{ClientError, ListOptions, PlatformClient};
use intop_core::labels::{KIT_TYPE_EXTERNAL, KIT_TYPE_LABEL, KIT_TYPE_PLATFORM};
use intop_core::{CoreError, Integration, IntegrationKit, KitPhase, LabelSelector};

/// Lists the kits of `namespace` an Integration could run from.
///
/// `selector` is merged with the kit type requirement. Kits in error, built
/// for another runtime or with another dependency set are filtered out.
pub async fn lookup_kits_for_integration(
    client: &dyn PlatformClient,
    integration: &Integration,
    namespace: &str,
    selector: LabelSelector,
) -> Result<Vec<IntegrationKit>, ClientError> {
    let options = ListOptions::new()
        .with_labels(
            LabelSelector::new().with_in(KIT_TYPE_LABEL, [KIT_TYPE_PLATFORM, KIT_TYPE_EXTERNAL]),
        )
        .with_labels(selector);

    let kits = client.list_integration_kits(namespace, &options).await?;
    Ok(kits
        .into_iter()
        .filter(|kit| kit_matches(integration, kit))
        .collect())
}

fn kit_matches(integration: &Integration, kit: &IntegrationKit) -> bool {
    if kit.status.phase == KitPhase::Error {
        return false;
    }
    if integration.status.runtime_version != kit.status.runtime_version
        || integration.status.runtime_provider != kit.status.runtime_provider
    {
        return false;
    }
    let wanted: BTreeSet<&String> = integration.status.dependencies.iter().collect();
    let built: BTreeSet<&String> = kit.spec.dependencies.iter().collect();
    wanted == built
}

/// Picks the ready kit with the greatest priority strictly above `floor`.
///
/// Among equal priorities the first kit wins. A malformed priority label on a
/// ready kit is an error.
pub fn find_highest_priority_ready_kit(
    kits: &[IntegrationKit],
    floor: i64,
) -> Result<Option<&IntegrationKit>, CoreError> {
    let mut selected = None;
    let mut priority = floor;
    for kit in kits.iter().filter(|k| k.is_ready()) {
        let p = kit.priority_value()?;
        if p > priority {
            selected = Some(kit);
            priority = p;
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_client::InMemoryPlatformClient;
    use intop_core::labels::KIT_PRIORITY_LABEL;

    fn kit(name: &str, priority: &str, phase: KitPhase) -> IntegrationKit {
        let mut kit = IntegrationKit::new("default", name);
        kit.metadata.labels = Some(
            [
                (KIT_PRIORITY_LABEL.to_string(), priority.to_string()),
                (KIT_TYPE_LABEL.to_string(), KIT_TYPE_PLATFORM.to_string()),
            ]
            .into(),
        );
        kit.status.phase = phase;
        kit
    }

    #[test]
    fn test_highest_priority_wins() {
        let kits = vec![
            kit("k0", "0", KitPhase::Ready),
            kit("k5", "5", KitPhase::Ready),
            kit("k3", "3", KitPhase::Ready),
        ];
        let selected = find_highest_priority_ready_kit(&kits, 0).unwrap();
        assert_eq!(selected.map(|k| k.name()), Some("k5"));
    }

    #[test]
    fn test_never_selects_at_or_below_floor() {
        let kits = vec![kit("k2", "2", KitPhase::Ready), kit("k3", "3", KitPhase::Ready)];
        assert!(find_highest_priority_ready_kit(&kits, 3).unwrap().is_none());
        assert!(find_highest_priority_ready_kit(&[], 0).unwrap().is_none());
    }

    #[test]
    fn test_ignores_kits_not_ready() {
        let kits = vec![
            kit("building", "9", KitPhase::BuildRunning),
            kit("ready", "4", KitPhase::Ready),
        ];
        let selected = find_highest_priority_ready_kit(&kits, 0).unwrap();
        assert_eq!(selected.map(|k| k.name()), Some("ready"));
    }

    #[test]
    fn test_ties_keep_first() {
        let kits = vec![kit("first", "5", KitPhase::Ready), kit("second", "5", KitPhase::Ready)];
        let selected = find_highest_priority_ready_kit(&kits, 0).unwrap();
        assert_eq!(selected.map(|k| k.name()), Some("first"));
    }

    #[test]
    fn test_malformed_priority_is_an_error() {
        let kits = vec![kit("bad", "high", KitPhase::Ready)];
        let err = find_highest_priority_ready_kit(&kits, 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPriority { .. }));
    }

    #[tokio::test]
    async fn test_lookup_filters_on_runtime_and_dependencies() {
        let client = InMemoryPlatformClient::new();
        let mut it = Integration::new("default", "hello");
        it.status.runtime_version = Some("3.2.0".into());
        it.status.dependencies = vec!["timer".into(), "log".into()];

        let mut good = kit("good", "1", KitPhase::Ready);
        good.status.runtime_version = Some("3.2.0".into());
        good.spec.dependencies = vec!["log".into(), "timer".into()];

        let mut other_runtime = good.clone();
        other_runtime.metadata.name = Some("other-runtime".into());
        other_runtime.status.runtime_version = Some("2.0.0".into());

        let mut failed = good.clone();
        failed.metadata.name = Some("failed".into());
        failed.status.phase = KitPhase::Error;

        let mut synthetic = good.clone();
        synthetic.metadata.name = Some("synthetic".into());
        synthetic
            .metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert(KIT_TYPE_LABEL.to_string(), "synthetic".to_string());

        for k in [good, other_runtime, failed, synthetic] {
            client.add_kit(k).await;
        }

        let kits = lookup_kits_for_integration(&client, &it, "default", LabelSelector::new())
            .await
            .unwrap();
        let names: Vec<&str> = kits.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["good"]);
    }
}
