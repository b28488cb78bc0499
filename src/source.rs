use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::domain::JVError;
use crate::table::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(Vec<Record>),
    Failed(String),
}

/// Issues a single GET against `url` and decodes the body as an array of objects.
pub async fn fetch_records(client: &Client, url: &str) -> Result<Vec<Record>, JVError> {
    let start_time = Instant::now();
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        error!("GET {url} returned {status}");
        return Err(JVError::BadStatus(status.as_u16()));
    }

    let records = match response.json::<Value>().await? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(JVError::DecodeFailed(format!(
                    "element {idx} is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<Record>, JVError>>()?,
        _ => return Err(JVError::DecodeFailed("expected a JSON array".into())),
    };

    info!(
        "Fetched {} records from {url} in {}ms",
        records.len(),
        start_time.elapsed().as_millis()
    );
    Ok(records)
}

/// Runs the fetch and folds its outcome into a [`LoadState`].
pub async fn load(client: &Client, url: &str) -> LoadState {
    debug!("Loading {url} ...");
    match fetch_records(client, url).await {
        Ok(records) => LoadState::Ready(records),
        Err(e) => {
            error!("Loading {url} failed: {e:?}");
            LoadState::Failed(e.to_string())
        }
    }
}
