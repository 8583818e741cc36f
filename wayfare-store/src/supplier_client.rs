use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Url};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use wayfare_core::catalog::{CatalogEntry, CatalogPage};
use wayfare_core::search::{
    FlightSearchRequest, HotelSearchRequest, HotelSearchResults, SearchTarget,
};
use wayfare_core::supplier::{InventoryProvider, SupplierError};

use crate::app_config::SupplierConfig;
use crate::StoreError;

const API_KEY_HEADER: &str = "x-api-key";

/// reqwest-backed client for the hotel and flight inventory vendor.
///
/// Every call is a single attempt with the client's default timeouts.
#[derive(Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpInventoryClient {
    pub fn new(config: &SupplierConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::SupplierConfig(format!("base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::SupplierConfig(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| StoreError::SupplierConfig("api_key is not a valid header value".into()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        request: RequestBuilder,
        hotel_id: Option<&str>,
    ) -> Result<Value, SupplierError> {
        let response = request
            .send()
            .await
            .map_err(|e| SupplierError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SupplierError::Transport(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(v) => v,
                Err(e) if status.is_success() => return Err(SupplierError::Decode(e.to_string())),
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        interpret_envelope(status.as_u16(), body, hotel_id)
    }
}

/// Applies the vendor's `{success, data, error: {code, message}}` envelope.
///
/// Returns the whole body on success so callers can read `data` and
/// `count`. `hotel_id` turns deactivation codes into
/// [`SupplierError::HotelUnavailable`].
pub fn interpret_envelope(
    status: u16,
    body: Value,
    hotel_id: Option<&str>,
) -> Result<Value, SupplierError> {
    let code = body
        .pointer("/error/code")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let (Some(id), Some(code)) = (hotel_id, code.as_deref()) {
        if SupplierError::is_deactivation_code(code) {
            return Err(SupplierError::HotelUnavailable(id.to_string()));
        }
    }

    if !(200..300).contains(&status) {
        return Err(SupplierError::Http { status, body });
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .unwrap_or("no message")
            .to_string();
        return Err(SupplierError::Rejected {
            code: code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message,
        });
    }

    Ok(body)
}

/// Vendor wire shape for an availability search.
pub fn hotel_search_body(request: &HotelSearchRequest) -> Value {
    let occupancies: Vec<Value> = request
        .rooms
        .iter()
        .map(|room| {
            json!({
                "adults": room.adults,
                "children": room.children,
                "childAges": room.child_ages,
            })
        })
        .collect();

    let mut body = json!({
        "checkin": request.checkin.format("%Y-%m-%d").to_string(),
        "checkout": request.checkout.format("%Y-%m-%d").to_string(),
        "occupancies": occupancies,
        "guestNationality": request.nationality,
        "currency": request.currency,
    });

    match &request.target {
        SearchTarget::City(city_id) => body["cityId"] = json!(city_id),
        SearchTarget::Hotels(ids) => body["hotelIds"] = json!(ids),
    }
    body
}

fn data_array(body: Value) -> Result<Vec<Value>, SupplierError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(SupplierError::Decode(format!(
                "expected an array under 'data', got {}",
                kind_of(&other)
            ))),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(SupplierError::Decode(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
    }
}

fn data_value(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The catalog endpoint sends either `data: {hotels, nextToken}` or
/// `data: [...]` with the token beside it. Records that don't decode are
/// skipped so one bad hotel can't take the whole page down.
pub fn parse_catalog_page(body: Value) -> Result<CatalogPage, SupplierError> {
    let token_beside = body.as_object().and_then(next_token_in);

    let (records, next_token) = match data_value(body) {
        Value::Array(records) => (records, token_beside),
        Value::Object(mut data) => {
            let token = next_token_in(&data).or(token_beside);
            let records = match data.remove("hotels") {
                Some(Value::Array(records)) => records,
                None | Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(SupplierError::Decode(format!(
                        "catalog hotels was {}",
                        kind_of(&other)
                    )))
                }
            };
            (records, token)
        }
        Value::Null => (Vec::new(), None),
        other => {
            return Err(SupplierError::Decode(format!(
                "catalog page was {}",
                kind_of(&other)
            )))
        }
    };

    let hotels = records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| match serde_json::from_value::<CatalogEntry>(record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(position = idx, error = %e, "Skipping undecodable catalog record");
                None
            }
        })
        .collect();

    let next_token = next_token.filter(|t| !t.trim().is_empty());
    Ok(CatalogPage { hotels, next_token })
}

fn next_token_in(fields: &Map<String, Value>) -> Option<String> {
    ["nextToken", "continuationToken"]
        .iter()
        .find_map(|k| fields.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl InventoryProvider for HttpInventoryClient {
    async fn search_hotels(
        &self,
        request: &HotelSearchRequest,
    ) -> Result<HotelSearchResults, SupplierError> {
        let url = self.endpoint(&["hotels", "search"]);
        debug!("POST {}", url);
        let body = self
            .send(self.client.post(url).json(&hotel_search_body(request)), None)
            .await?;

        let reported = body.get("count").and_then(Value::as_u64);
        let results = data_array(body)?;
        let count = reported.map(|c| c as usize).unwrap_or(results.len());
        Ok(HotelSearchResults { results, count })
    }

    async fn hotel_detail(&self, hotel_id: &str) -> Result<Value, SupplierError> {
        let url = self.endpoint(&["hotels", hotel_id]);
        debug!("GET {}", url);
        let body = self.send(self.client.get(url), Some(hotel_id)).await?;
        match data_value(body) {
            Value::Null => Err(SupplierError::Decode(format!(
                "hotel {} came back empty",
                hotel_id
            ))),
            data => Ok(data),
        }
    }

    async fn catalog_page(&self, token: Option<&str>) -> Result<CatalogPage, SupplierError> {
        let url = self.endpoint(&["hotels", "static"]);
        debug!("GET {} (token: {:?})", url, token);
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.query(&[("token", token)]);
        }
        let body = self.send(request, None).await?;
        parse_catalog_page(body)
    }

    async fn search_flights(
        &self,
        request: &FlightSearchRequest,
    ) -> Result<Vec<Value>, SupplierError> {
        let url = self.endpoint(&["flights", "search"]);
        debug!("POST {}", url);
        let body = self.send(self.client.post(url).json(request), None).await?;
        data_array(body)
    }

    async fn search_airports(&self, query: &str) -> Result<Vec<Value>, SupplierError> {
        let url = self.endpoint(&["flights", "airports"]);
        debug!("GET {} (q: {})", url, query);
        let body = self
            .send(self.client.get(url).query(&[("q", query)]), None)
            .await?;
        data_array(body)
    }
}
