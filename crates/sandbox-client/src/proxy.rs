use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use sandbox_protocol::{ACTION_FIELD, Action, LaunchInfo, StatusResponse};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;
use url::form_urlencoded;

use crate::error::ClientError;

/// Client for the proxy's action-dispatch endpoint.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    ajax_url: Url,
    cookie: Option<String>,
}

impl ProxyClient {
    pub fn new(http: Client, ajax_url: Url, cookie: Option<String>) -> Self {
        Self {
            http,
            ajax_url,
            cookie,
        }
    }

    /// Persists provisioning output. The payload is forwarded as-is with only
    /// the `action` field set.
    pub async fn save_config(&self, data: &Map<String, Value>) -> Result<(), ClientError> {
        self.post_action(Action::ConfigSave, &config_pairs(data))
            .await
            .map(|_| ())
    }

    pub async fn reset(&self) -> Result<(), ClientError> {
        self.post_action(Action::Reset, &[]).await.map(|_| ())
    }

    pub async fn launch_info(&self) -> Result<LaunchInfo, ClientError> {
        let resp = self.post_action(Action::Launch, &[]).await?;
        self.decode(resp).await
    }

    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let resp = self.post_action(Action::Status, &[]).await?;
        self.decode(resp).await
    }

    async fn post_action(
        &self,
        action: Action,
        pairs: &[(String, String)],
    ) -> Result<reqwest::Response, ClientError> {
        let body = encode_form(action, pairs);
        let mut req = self
            .http
            .post(self.ajax_url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        if let Some(cookie) = &self.cookie {
            req = req.header(COOKIE, cookie.as_str());
        }
        let url = self.ajax_url.to_string();
        let resp = req.send().await.map_err(|source| ClientError::Request {
            url: url.clone(),
            source,
        })?;
        if !resp.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: resp.status(),
            });
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, ClientError> {
        resp.json::<T>()
            .await
            .map_err(|source| ClientError::Request {
                url: self.ajax_url.to_string(),
                source,
            })
    }
}

/// Flattens a poll payload into form pairs. Strings go verbatim; other JSON
/// values use their JSON text, `null` becomes empty. A stray `action` key is
/// dropped since the dispatch field overrides it.
pub(crate) fn config_pairs(data: &Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .filter(|(key, _)| key.as_str() != ACTION_FIELD)
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

fn encode_form(action: Action, pairs: &[(String, String)]) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        form.append_pair(key, value);
    }
    form.append_pair(ACTION_FIELD, action.as_str());
    form.finish()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn config_pairs_keep_payload_and_stringify_scalars() {
        let data = json!({
            "ide_url": "https://ide.example/",
            "isc_port": 51773,
            "note": null,
            "action": "spoofed",
        });
        let mut pairs = config_pairs(data.as_object().unwrap());
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("ide_url".to_string(), "https://ide.example/".to_string()),
                ("isc_port".to_string(), "51773".to_string()),
                ("note".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn form_ends_with_action() {
        let body = encode_form(
            Action::ConfigSave,
            &[("username".to_string(), "a b&c".to_string())],
        );
        assert_eq!(body, "username=a+b%26c&action=sandbox_config_cb");
    }
}
