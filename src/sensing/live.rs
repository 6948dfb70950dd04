use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{RawSample, SensorSource};
use crate::error::SensorUnavailable;

/// Largest response body accepted from the sensor.
pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024;

/// JSON document served by the sensor device, e.g.
/// `{"distance_cm": 87, "timestamp": "2024-05-01T10:00:00", "ip": "192.168.1.40"}`.
#[derive(Debug, Deserialize)]
struct SensorPayload {
    distance_cm: f64,
    timestamp: SensorTimestamp,
    #[serde(default)]
    ip: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SensorTimestamp {
    Text(String),
    Integer(i64),
}

impl SensorPayload {
    fn into_sample(self) -> Result<RawSample, SensorUnavailable> {
        let sensor_timestamp = match self.timestamp {
            SensorTimestamp::Text(text) => text.trim().to_string(),
            SensorTimestamp::Integer(value) => value.to_string(),
        };
        if sensor_timestamp.is_empty() {
            return Err(SensorUnavailable::Malformed("empty timestamp".into()));
        }

        Ok(RawSample {
            distance_cm: self.distance_cm,
            sensor_timestamp,
            sensor_ip: self.ip,
        })
    }
}

fn oversized(length: u64) -> SensorUnavailable {
    SensorUnavailable::Malformed(format!(
        "payload of {length} bytes exceeds the {MAX_PAYLOAD_BYTES} byte limit"
    ))
}

/// Polls the sensor device over HTTP.
pub struct LiveSensor {
    client: Client,
    url: String,
    timeout: Duration,
}

impl LiveSensor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build sensor HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> SensorUnavailable {
        if err.is_timeout() {
            SensorUnavailable::Timeout(self.timeout)
        } else {
            SensorUnavailable::from(err)
        }
    }
}

#[async_trait]
impl SensorSource for LiveSensor {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn fetch(&self) -> Result<RawSample, SensorUnavailable> {
        let mut response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| self.classify(err))?;

        if let Some(length) = response.content_length() {
            if length > MAX_PAYLOAD_BYTES as u64 {
                return Err(oversized(length));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|err| self.classify(err))? {
            if body.len() + chunk.len() > MAX_PAYLOAD_BYTES {
                return Err(oversized((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        let payload: SensorPayload = serde_json::from_slice(&body)
            .map_err(|err| SensorUnavailable::Malformed(err.to_string()))?;

        payload.into_sample()
    }
}
