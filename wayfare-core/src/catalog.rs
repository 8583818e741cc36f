use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Vendor hotel identifier. The catalog endpoint sends some ids as JSON
/// numbers and others as strings, so both forms are kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HotelId {
    Number(i64),
    Text(String),
}

impl HotelId {
    /// Numeric-looking text stays text; callers that care about the
    /// difference go through the string-normalized comparison.
    pub fn text(value: impl Into<String>) -> Self {
        HotelId::Text(value.into())
    }

    pub fn as_positive_index(&self) -> Option<usize> {
        match self {
            HotelId::Number(n) if *n > 0 => usize::try_from(*n).ok(),
            HotelId::Number(_) => None,
            HotelId::Text(s) => s.trim().parse::<usize>().ok().filter(|n| *n > 0),
        }
    }
}

impl Default for HotelId {
    fn default() -> Self {
        HotelId::Text(String::new())
    }
}

impl fmt::Display for HotelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotelId::Number(n) => write!(f, "{}", n),
            HotelId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for HotelId {
    fn from(value: &str) -> Self {
        HotelId::Text(value.to_string())
    }
}

impl From<i64> for HotelId {
    fn from(value: i64) -> Self {
        HotelId::Number(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedCode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, alias = "line")]
    pub line1: Option<String>,
    #[serde(default, alias = "zip")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: NamedCode,
    #[serde(default)]
    pub state: NamedCode,
    #[serde(default)]
    pub country: NamedCode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// One hotel record from the vendor's full-catalog endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: HotelId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "stars", alias = "rating", deserialize_with = "lenient_rating")]
    pub star_rating: Option<f32>,
    #[serde(default, alias = "geo")]
    pub location: GeoLocation,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_images")]
    pub images: Vec<HotelImage>,
    #[serde(default, alias = "isDeleted")]
    pub deleted: bool,
}

impl CatalogEntry {
    pub fn city_name(&self) -> Option<&str> {
        self.address.city.name.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn country_name(&self) -> Option<&str> {
        self.address.country.name.as_deref()
    }

    pub fn country_code(&self) -> Option<&str> {
        self.address.country.code.as_deref()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }

    pub fn is_listed(&self) -> bool {
        !self.deleted
    }
}

/// One page of the cursor-paginated catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    #[serde(default)]
    pub hotels: Vec<CatalogEntry>,
    #[serde(default, alias = "continuationToken")]
    pub next_token: Option<String>,
}

// Ratings arrive as 4, 4.5 or "4".
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|v| v as f32),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}

// Null or malformed ids fall back to the empty id, which no matcher accepts.
fn lenient_id<'de, D>(deserializer: D) -> Result<HotelId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(v) => HotelId::Number(v),
            None => HotelId::Text(n.to_string()),
        },
        Some(serde_json::Value::String(s)) => HotelId::Text(s),
        _ => HotelId::default(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Images arrive as `{url, caption}` objects or as bare URL strings.
fn lenient_images<'de, D>(deserializer: D) -> Result<Vec<HotelImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(url) => Some(HotelImage { url, caption: None }),
            other => serde_json::from_value(other).ok(),
        })
        .filter(|image: &HotelImage| !image.url.trim().is_empty())
        .collect())
}
