use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const API_URL: &str = "https://api.random.org/json-rpc/2/invoke";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure modes of a signed-integer draw.
#[derive(Debug, thiserror::Error)]
pub enum RngError {
    #[error("request to random.org failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("random.org error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("random.org response contained no usable result")]
    EmptyResult,
}

/// Port for the signed random integer generator, so the processor can be
/// exercised against a double.
#[async_trait]
pub trait RngService: Send + Sync {
    /// Draw `n` distinct integers in `[min, max]`, signed by the service.
    async fn signed_integers(&self, n: u64, min: u64, max: u64)
        -> Result<SignedResult, RngError>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: SignedIntegerParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedIntegerParams<'a> {
    api_key: &'a str,
    n: u64,
    min: u64,
    max: u64,
    replacement: bool,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<SignedResult>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Signed generation result as returned by the service. The bot only reads
/// this; every field is reproduced verbatim in the verification payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedResult {
    pub random: RandomData,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomData {
    pub hashed_api_key: String,
    pub n: u64,
    pub min: i64,
    pub max: i64,
    pub replacement: bool,
    pub base: u32,
    pub data: Vec<i64>,
    pub completion_time: String,
    pub license: License,
    pub serial_number: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub info_url: Option<String>,
}

impl RandomData {
    /// Canonical string accepted by the random.org verify page.
    ///
    /// The verify endpoint hashes the serialized object, so field order and
    /// punctuation are fixed and the output must be byte-stable. `infoUrl`
    /// renders as the bare literal `null` when the service omits it.
    pub fn verification_json(&self) -> String {
        let data = self
            .data
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let info_url = match &self.license.info_url {
            Some(url) => json_string(url),
            None => "null".to_string(),
        };
        format!(
            "{{\"hashedApiKey\": {hashed_api_key}, \"n\": {n}, \"min\": {min}, \"max\": {max}, \
             \"replacement\": {replacement}, \"base\": {base}, \"data\": [{data}], \
             \"completionTime\": {completion_time}, \"license\": {{\"type\": {license_type}, \
             \"text\": {license_text}, \"infoUrl\": {info_url}}}, \"serialNumber\": {serial_number}}}",
            hashed_api_key = json_string(&self.hashed_api_key),
            n = self.n,
            min = self.min,
            max = self.max,
            replacement = self.replacement,
            base = self.base,
            data = data,
            completion_time = json_string(&self.completion_time),
            license_type = json_string(&self.license.kind),
            license_text = json_string(&self.license.text),
            info_url = info_url,
            serial_number = self.serial_number,
        )
    }
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization cannot fail")
}

/// Build one single-use request envelope. The id is fresh per call; it
/// correlates request and response and is never reused.
fn make_request(api_key: &str, n: u64, min: u64, max: u64) -> RpcRequest<'_> {
    RpcRequest {
        jsonrpc: "2.0",
        method: "generateSignedIntegers",
        params: SignedIntegerParams {
            api_key,
            n,
            min,
            max,
            replacement: false,
        },
        id: Uuid::new_v4().to_string(),
    }
}

/// Client for random.org's signed JSON-RPC API.
pub struct RandomOrgClient {
    client: reqwest::Client,
    api_key: String,
}

impl RandomOrgClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl RngService for RandomOrgClient {
    async fn signed_integers(
        &self,
        n: u64,
        min: u64,
        max: u64,
    ) -> Result<SignedResult, RngError> {
        let request = make_request(&self.api_key, n, min, max);

        debug!("Requesting {} signed integers in [{}, {}]", n, min, max);

        let response: RpcResponse = self
            .client
            .post(API_URL)
            .timeout(HTTP_TIMEOUT)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RngError::Api {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.ok_or(RngError::EmptyResult)?;
        if result.random.data.is_empty() {
            return Err(RngError::EmptyResult);
        }

        Ok(result)
    }
}
