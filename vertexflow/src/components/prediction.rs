//! Prediction-request glue for deployed endpoints.
//!
//! The serving container expects each instance as a base64 payload inside a
//! `{"data": {"b64": …}}` envelope. The endpoint is addressed by the resource
//! URI the pipeline framework records when the deployment task finishes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::info;

use crate::errors::Result;
use crate::platform::resources::{endpoint_name_from_uri, PredictRequest, PredictResponse};
use crate::platform::services::EndpointService;

/// Wraps raw instance bytes in the serving container's base64 envelope.
#[must_use]
pub fn encode_instance(instance: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "data": { "b64": BASE64.encode(instance) }
    })
}

/// Sends one prediction request per instance to the endpoint named by
/// `endpoint_resource_uri` and collects the responses in order.
pub async fn make_prediction_request(
    endpoints: &dyn EndpointService,
    endpoint_resource_uri: &str,
    instances: &[String],
) -> Result<Vec<PredictResponse>> {
    let endpoint = endpoint_name_from_uri(endpoint_resource_uri)?;
    info!(endpoint = %endpoint, count = instances.len(), "sending prediction requests");

    let mut responses = Vec::with_capacity(instances.len());
    for instance in instances {
        info!(input = %instance, "requesting prediction");
        let request = PredictRequest {
            instances: vec![encode_instance(instance.as_bytes())],
        };
        let response = endpoints.predict(&endpoint, request).await?;
        info!(predictions = ?response.predictions, "prediction response");
        responses.push(response);
    }
    Ok(responses)
}
