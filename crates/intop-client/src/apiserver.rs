//! Probe proxy going through the API server's pod proxy subresource.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{ClientError, ProbeError};
use crate::traits::{ProbeProxy, ProbeRequest};

pub struct ApiServerProbeProxy {
    http_client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl ApiServerProbeProxy {
    pub fn new(base_url: Url) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            bearer_token: None,
        }
    }

    /// Builds a proxy with its own HTTP client.
    pub fn with_tls_options(base_url: Url, accept_invalid_certs: bool) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::connection(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// `{api}/api/v1/namespaces/{ns}/pods/[https:]{pod}:{port}/proxy/{path}`
    pub fn proxy_url(&self, request: &ProbeRequest) -> Result<Url, ProbeError> {
        let target = if request.is_https() {
            format!("https:{}:{}", request.pod, request.port)
        } else {
            format!("{}:{}", request.pod, request.port)
        };
        let url = format!(
            "{}/api/v1/namespaces/{}/pods/{}/proxy/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.namespace,
            target,
            request.path.trim_start_matches('/'),
        );
        Url::parse(&url).map_err(ProbeError::transport)
    }
}

#[async_trait]
impl ProbeProxy for ApiServerProbeProxy {
    async fn get(&self, request: &ProbeRequest) -> Result<Vec<u8>, ProbeError> {
        let url = self.proxy_url(request)?;

        let mut builder = self.http_client.get(url).timeout(request.timeout);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        tracing::debug!(
            namespace = %request.namespace,
            pod = %request.pod,
            status = status.as_u16(),
            "Proxied probe answered with a non-success status"
        );

        if status == StatusCode::SERVICE_UNAVAILABLE {
            Err(ProbeError::ServiceUnavailable {
                body: body.to_vec(),
            })
        } else {
            Err(ProbeError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::DeadlineExceeded
    } else {
        ProbeError::transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(scheme: &str) -> ProbeRequest {
        ProbeRequest {
            namespace: "default".into(),
            pod: "hello-abc".into(),
            scheme: scheme.into(),
            port: 8080,
            path: "/q/health/ready".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_proxy_url() {
        let proxy = ApiServerProbeProxy::new(Url::parse("https://api.cluster:6443/").unwrap());
        assert_eq!(
            proxy.proxy_url(&request("HTTP")).unwrap().as_str(),
            "https://api.cluster:6443/api/v1/namespaces/default/pods/hello-abc:8080/proxy/q/health/ready"
        );
        assert_eq!(
            proxy.proxy_url(&request("HTTPS")).unwrap().as_str(),
            "https://api.cluster:6443/api/v1/namespaces/default/pods/https:hello-abc:8080/proxy/q/health/ready"
        );
    }
}
