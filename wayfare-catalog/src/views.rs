use serde::Serialize;
use std::collections::HashMap;
use wayfare_core::catalog::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySummary {
    pub name: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub hotel_count: usize,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Listed hotels grouped by city name, case-insensitively. `search`
/// narrows to cities whose name contains the term.
pub fn city_summaries(hotels: &[CatalogEntry], search: Option<&str>) -> Vec<CitySummary> {
    let term = search.map(str::trim).filter(|s| !s.is_empty());
    let mut order: Vec<String> = Vec::new();
    let mut by_city: HashMap<String, CitySummary> = HashMap::new();

    for hotel in hotels.iter().filter(|h| h.is_listed()) {
        let Some(city) = hotel.city_name() else {
            continue;
        };
        let city = city.trim();
        if let Some(term) = term {
            if !contains_ci(city, term) {
                continue;
            }
        }

        let key = city.to_lowercase();
        let summary = by_city.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            CitySummary {
                name: city.to_string(),
                country: hotel.country_name().map(str::to_string),
                country_code: hotel.country_code().map(str::to_string),
                hotel_count: 0,
            }
        });
        summary.hotel_count += 1;
    }

    let mut cities: Vec<CitySummary> = order
        .into_iter()
        .filter_map(|key| by_city.remove(&key))
        .collect();
    cities.sort_by(|a, b| b.hotel_count.cmp(&a.hotel_count).then_with(|| a.name.cmp(&b.name)));
    cities
}

pub fn search_by_name<'a>(
    hotels: &'a [CatalogEntry],
    term: &str,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }
    hotels
        .iter()
        .filter(|h| h.is_listed() && contains_ci(&h.name, term))
        .take(limit)
        .collect()
}

pub fn available_hotels<'a>(
    hotels: &'a [CatalogEntry],
    city: Option<&str>,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    let city = city.map(str::trim).filter(|c| !c.is_empty());
    hotels
        .iter()
        .filter(|h| h.is_listed())
        .filter(|h| match city {
            Some(wanted) => h
                .city_name()
                .map(|name| name.trim().eq_ignore_ascii_case(wanted))
                .unwrap_or(false),
            None => true,
        })
        .take(limit)
        .collect()
}
