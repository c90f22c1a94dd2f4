//! JSON fetch helpers for the backend endpoints. Failures are returned to
//! the caller, which logs and drops them; there is no retry and no timeout,
//! a hung request just never resolves its message.

use seed::fetch;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub async fn get_json<T>(url: String) -> Result<T, LoadError>
where
    T: DeserializeOwned,
{
    let response = fetch::fetch(url).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

pub async fn post_json<B, T>(url: String, body: B) -> Result<T, LoadError>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let request = fetch::Request::new(url)
        .method(fetch::Method::Post)
        .json(&body)?;
    let response = fetch::fetch(request).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[derive(Debug)]
pub enum LoadError {
    FetchError(fetch::FetchError),
    JsonError(serde_json::Error),
}

impl From<fetch::FetchError> for LoadError {
    fn from(error: fetch::FetchError) -> Self {
        Self::FetchError(error)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonError(error)
    }
}
