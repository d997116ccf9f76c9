use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Read helpers over platform object metadata.
pub trait MetaExt {
    fn name_or_empty(&self) -> &str;
    fn namespace_or_empty(&self) -> &str;
    fn label(&self, key: &str) -> Option<&str>;
    fn annotation(&self, key: &str) -> Option<&str>;
    fn is_terminating(&self) -> bool;
}

impl MetaExt for ObjectMeta {
    fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn namespace_or_empty(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }

    fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}
