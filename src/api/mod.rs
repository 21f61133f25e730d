//! Remote collection resource: record schema and the HTTP client.
//!
//! The resource is a plain REST collection under `<base>/users`. Responses are
//! decoded into [`UserRecord`] at this boundary; anything that does not have the
//! expected shape becomes [`RequestError::Decode`] instead of leaking half-filled
//! records into the rest of the crate.
//!
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::error::RequestError;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// One user as stored by the remote resource.
///
/// Extra fields returned by the server (jsonplaceholder sends `username`,
/// `address`, ...) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "id_from_int_or_str")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// JSON body for create (`id` omitted) and update (`id` present).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

fn id_from_int_or_str<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }
    match RawId::deserialize(d)? {
        RawId::Int(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("id is not an integer: {s:?}"))),
    }
}

/// The remote collection resource.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// `GET /users`
    async fn list(&self) -> Result<Vec<UserRecord>, RequestError>;
    /// `POST /users`
    async fn create(&self, payload: &UserPayload) -> Result<UserRecord, RequestError>;
    /// `PUT /users/{id}`
    async fn update(&self, id: i64, payload: &UserPayload) -> Result<UserRecord, RequestError>;
    /// `DELETE /users/{id}`; any 2xx status counts as success.
    async fn delete(&self, id: i64) -> Result<(), RequestError>;
}

/// [`UserApi`] over HTTP using `reqwest`.
pub struct HttpUserApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(RequestError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("usrapi-manager/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/users/{}", self.base_url, id)
    }
}

/// Check the status, then decode the body as `T`.
async fn decode_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RequestError> {
    let resp = ensure_success(resp)?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(RequestError::decode)
}

fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, RequestError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(RequestError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list(&self) -> Result<Vec<UserRecord>, RequestError> {
        let resp = self.client.get(self.collection_url()).send().await?;
        decode_body(resp).await
    }

    async fn create(&self, payload: &UserPayload) -> Result<UserRecord, RequestError> {
        let resp = self
            .client
            .post(self.collection_url())
            .json(payload)
            .send()
            .await?;
        decode_body(resp).await
    }

    async fn update(&self, id: i64, payload: &UserPayload) -> Result<UserRecord, RequestError> {
        let resp = self.client.put(self.item_url(id)).json(payload).send().await?;
        decode_body(resp).await
    }

    async fn delete(&self, id: i64) -> Result<(), RequestError> {
        let resp = self.client.delete(self.item_url(id)).send().await?;
        ensure_success(resp).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_string_id_and_ignores_extra_fields() {
        let raw = r#"{"id":"7","name":"Kurtis","username":"k","email":"k@x.io","phone":"1-2","address":{"city":"x"}}"#;
        let rec: UserRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.id, 7);
        assert_eq!(rec.name, "Kurtis");
        assert_eq!(rec.phone, "1-2");
    }

    #[test]
    fn record_rejects_missing_or_mistyped_fields() {
        assert!(serde_json::from_str::<UserRecord>(r#"{"id":1,"name":"a","email":"b"}"#).is_err());
        assert!(serde_json::from_str::<UserRecord>(r#"{"id":"x1","name":"a","email":"b","phone":"c"}"#).is_err());
        assert!(serde_json::from_str::<UserRecord>(r#"{"id":1,"name":5,"email":"b","phone":"c"}"#).is_err());
    }

    #[test]
    fn create_payload_omits_id() {
        let body = UserPayload {
            id: None,
            name: "A".into(),
            email: "a@x.com".into(),
            phone: "123".into(),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"name":"A","email":"a@x.com","phone":"123"}));

        let with_id = UserPayload { id: Some(3), ..body };
        assert_eq!(serde_json::to_value(&with_id).unwrap()["id"], 3);
    }

    #[test]
    fn base_url_is_trimmed_and_validated() {
        let api = HttpUserApi::new("http://localhost:1234/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:1234");
        assert_eq!(api.item_url(4), "http://localhost:1234/users/4");
        assert!(matches!(
            HttpUserApi::new("localhost", Duration::from_secs(1)),
            Err(RequestError::InvalidUrl(_))
        ));
    }
}
