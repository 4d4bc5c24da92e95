//! Country calling codes for the sign-in form, fetched from a public REST endpoint.

use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{DirectoryPayloadSnafu, DirectoryRequestSnafu, DirectoryResult};

pub const DEFAULT_DIRECTORY_URL: &str =
    "https://restcountries.com/v2/all?fields=name,alpha2Code,callingCodes";
pub const PREFERRED_DIAL_CODE: &str = "+1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub dial_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCountry {
    name: String,
    #[serde(default)]
    alpha2_code: String,
    #[serde(default)]
    calling_codes: Vec<String>,
}

impl RawCountry {
    fn into_country(self) -> Option<Country> {
        let first = self.calling_codes.into_iter().next()?;
        let first = first.trim();
        if first.is_empty() {
            return None;
        }
        Some(Country {
            name: self.name,
            code: self.alpha2_code,
            dial_code: format!("+{first}"),
        })
    }
}

/// Parses the endpoint's JSON array, dropping entries without a calling code and sorting by
/// name.
pub fn parse_countries(body: &str) -> DirectoryResult<Vec<Country>> {
    let raw: Vec<RawCountry> = serde_json::from_str(body).context(DirectoryPayloadSnafu {
        stage: "directory-parse",
    })?;
    let mut countries: Vec<Country> = raw.into_iter().filter_map(RawCountry::into_country).collect();
    countries.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(countries)
}

pub async fn fetch_countries(url: &str) -> DirectoryResult<Vec<Country>> {
    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .context(DirectoryRequestSnafu {
            stage: "directory-request",
            url: url.to_string(),
        })?;
    let body = response.text().await.context(DirectoryRequestSnafu {
        stage: "directory-read-body",
        url: url.to_string(),
    })?;

    let countries = parse_countries(&body)?;
    tracing::info!(count = countries.len(), "loaded country directory");
    Ok(countries)
}

/// `+1` when listed, otherwise the first entry.
pub fn default_dial_code(countries: &[Country]) -> Option<&str> {
    countries
        .iter()
        .find(|country| country.dial_code == PREFERRED_DIAL_CODE)
        .or_else(|| countries.first())
        .map(|country| country.dial_code.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;

    const SAMPLE: &str = r#"[
        {"name": "United States of America", "alpha2Code": "US", "callingCodes": ["1"]},
        {"name": "Antarctica", "alpha2Code": "AQ", "callingCodes": [""]},
        {"name": "Bouvet Island", "alpha2Code": "BV", "callingCodes": []},
        {"name": "India", "alpha2Code": "IN", "callingCodes": ["91"]},
        {"name": "Albania", "alpha2Code": "AL", "callingCodes": ["355"]}
    ]"#;

    #[test]
    fn entries_are_mapped_filtered_and_sorted() {
        let countries = parse_countries(SAMPLE).unwrap();
        let names: Vec<_> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Albania", "India", "United States of America"]);
        assert_eq!(
            countries[1],
            Country {
                name: "India".to_string(),
                code: "IN".to_string(),
                dial_code: "+91".to_string(),
            }
        );
    }

    #[test]
    fn default_prefers_plus_one_then_first() {
        let countries = parse_countries(SAMPLE).unwrap();
        assert_eq!(default_dial_code(&countries), Some("+1"));
        assert_eq!(default_dial_code(&countries[..2]), Some("+355"));
        assert_eq!(default_dial_code(&[]), None);
    }

    #[test]
    fn non_array_payloads_are_errors() {
        assert!(matches!(
            parse_countries(r#"{"status": 404}"#),
            Err(DirectoryError::DirectoryPayload { .. })
        ));
    }
}
