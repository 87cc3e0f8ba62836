//! Client side of the juxtapose API: page parameters in, image pair out.

use std::time::Duration;

use anyhow::anyhow;
use log::{debug, info};
use serde::Deserialize;
use url::Url;

use crate::error::{ApiStatus, ComparisonError, Result};
use crate::image_loader::{decode_pair, EncodedImage, ImagePair};
use crate::orientation::Orientation;

pub const DEFAULT_API_URL: &str = "https://api.kneemund.de/juxtapose/url";

const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// The opaque `d`/`m` pair and orientation flag carried in the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub data: String,
    pub mac: String,
    pub orientation: String,
}

impl Parameters {
    /// Reads `d`, `m` and `o` from a query string or a full URL.
    pub fn from_query(input: &str) -> Result<Self> {
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None => input,
        };
        let query = query.split('#').next().unwrap_or_default();

        let (mut data, mut mac, mut orientation) = (None, None, None);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "d" => &mut data,
                "m" => &mut mac,
                "o" => &mut orientation,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        match (data, mac, orientation) {
            (Some(data), Some(mac), Some(orientation))
                if !data.is_empty() && !mac.is_empty() && !orientation.is_empty() =>
            {
                Ok(Self {
                    data,
                    mac,
                    orientation,
                })
            }
            _ => Err(ComparisonError::MalformedUrl),
        }
    }

    pub fn orientation(&self) -> Result<Orientation> {
        self.orientation.parse()
    }
}

/// Response body of the API's URL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payload {
    pub left_image_url: String,
    pub right_image_url: String,
    #[serde(default)]
    pub left_image_label: Option<String>,
    #[serde(default)]
    pub right_image_label: Option<String>,
}

impl Payload {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ComparisonError::Request(e.into()))
    }
}

/// Maps an HTTP status to the widget's fatal error, if it is one.
pub fn check_status(code: u16) -> Result<()> {
    if let Some(status) = ApiStatus::from_code(code) {
        return Err(ComparisonError::Api(status));
    }
    if !(200..300).contains(&code) {
        return Err(ComparisonError::Request(anyhow!("unexpected status {code}")));
    }
    Ok(())
}

pub struct ApiClient {
    agent: ureq::Agent,
    base: Url,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| ComparisonError::Request(e.into()))?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();
        Ok(Self { agent, base })
    }

    pub fn request_url(&self, params: &Parameters) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("d", &params.data)
            .append_pair("m", &params.mac);
        url
    }

    fn get(&self, url: &str) -> Result<(u16, Vec<u8>)> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ComparisonError::Request(e.into()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| ComparisonError::Request(e.into()))?;
        debug!("GET {url} -> {status} ({} bytes)", body.len());
        Ok((status, body))
    }

    pub fn fetch_payload(&self, params: &Parameters) -> Result<Payload> {
        let url = self.request_url(params);
        info!("Requesting comparison payload from {}", self.base);
        let (status, body) = self.get(url.as_str())?;
        check_status(status)?;
        Payload::parse(&body)
    }

    pub fn fetch_image(&self, url: &str, label: Option<String>) -> Result<EncodedImage> {
        let (status, bytes) = self.get(url)?;
        if !(200..300).contains(&status) {
            return Err(ComparisonError::Request(anyhow!(
                "image download from {url} failed with status {status}"
            )));
        }
        Ok(EncodedImage {
            source: url.to_string(),
            bytes,
            label,
        })
    }

    /// Downloads both images concurrently, then decodes them as a pair.
    pub fn fetch_pair(&self, payload: Payload) -> Result<ImagePair> {
        let Payload {
            left_image_url,
            right_image_url,
            left_image_label,
            right_image_label,
        } = payload;
        let (before, after) = rayon::join(
            || self.fetch_image(&left_image_url, left_image_label),
            || self.fetch_image(&right_image_url, right_image_label),
        );
        decode_pair(before?, after?)
    }
}
