//! District lookup for splitting large scrapes.
//!
//! City-wide searches cap out well before covering a big city; scraping
//! per-district gets past that. This queries OpenStreetMap's Overpass API
//! for named neighborhoods/suburbs inside a city boundary, falling back to
//! the broader quarter/district place tags when the first pass finds
//! nothing.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DistrictsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from Overpass")]
    UnexpectedStatus { status: u16 },
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: Option<OverpassTags>,
}

#[derive(Debug, Deserialize)]
struct OverpassTags {
    #[serde(default)]
    name: Option<String>,
}

fn place_query(city: &str, place_filter: &str) -> String {
    format!(
        r#"[out:json][timeout:25];
area[name="{city}"]->.searchArea;
(
  node["place"~"{place_filter}"](area.searchArea);
  way["place"~"{place_filter}"](area.searchArea);
  relation["place"~"{place_filter}"](area.searchArea);
);
out tags;"#
    )
}

/// Fetches district names for `city` from the Overpass endpoint.
///
/// Returns a sorted, deduplicated list; an empty list means OSM has no
/// matching place nodes for the city, which is not an error.
///
/// # Errors
///
/// [`DistrictsError`] on network failure or a non-success response.
pub async fn fetch_districts(endpoint: &str, city: &str) -> Result<Vec<String>, DistrictsError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let mut names = run_query(&client, endpoint, &place_query(city, "neighborhood|suburb")).await?;
    if names.is_empty() {
        // Some cities only tag the coarser admin levels.
        names = run_query(&client, endpoint, &place_query(city, "quarter|district")).await?;
    }

    names.sort();
    names.dedup();
    Ok(names)
}

async fn run_query(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
) -> Result<Vec<String>, DistrictsError> {
    let response = client
        .post(endpoint)
        .form(&[("data", query)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DistrictsError::UnexpectedStatus {
            status: status.as_u16(),
        });
    }

    let parsed: OverpassResponse = response.json().await?;
    Ok(parsed
        .elements
        .into_iter()
        .filter_map(|element| element.tags.and_then(|tags| tags.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn overpass_body(names: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "elements": names
                .iter()
                .map(|n| serde_json::json!({ "tags": { "name": n } }))
                .collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn returns_sorted_deduplicated_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(overpass_body(&["SoHo", "Chelsea", "SoHo", "Astoria"])),
            )
            .mount(&server)
            .await;

        let url = format!("{}/api/interpreter", server.uri());
        let districts = fetch_districts(&url, "New York").await.unwrap();
        assert_eq!(districts, ["Astoria", "Chelsea", "SoHo"]);
    }

    #[tokio::test]
    async fn falls_back_to_quarter_query_when_first_pass_is_empty() {
        let server = MockServer::start().await;
        // First request: no neighborhoods. Second: quarters exist.
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body(&[])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(overpass_body(&["Altstadt"])),
            )
            .mount(&server)
            .await;

        let url = format!("{}/api/interpreter", server.uri());
        let districts = fetch_districts(&url, "Heidelberg").await.unwrap();
        assert_eq!(districts, ["Altstadt"]);
    }

    #[tokio::test]
    async fn elements_without_names_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "elements": [
                    { "tags": { "name": "Mitte" } },
                    { "tags": {} },
                    {}
                ]
            })))
            .mount(&server)
            .await;

        let url = format!("{}/api/interpreter", server.uri());
        let districts = fetch_districts(&url, "Berlin").await.unwrap();
        assert_eq!(districts, ["Mitte"]);
    }

    #[tokio::test]
    async fn server_error_surfaces_as_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .respond_with(ResponseTemplate::new(504))
            .mount(&server)
            .await;

        let url = format!("{}/api/interpreter", server.uri());
        let err = fetch_districts(&url, "Nowhere").await.unwrap_err();
        assert!(matches!(err, DistrictsError::UnexpectedStatus { status: 504 }));
    }

    #[test]
    fn query_embeds_city_and_filter() {
        let query = place_query("Miami", "neighborhood|suburb");
        assert!(query.contains(r#"area[name="Miami"]"#));
        assert!(query.contains(r#"node["place"~"neighborhood|suburb"]"#));
    }
}
