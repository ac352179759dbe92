//! Spreadsheet service API client
//!
//! Thin HTTP client over a Google-Sheets-style values API. Every method
//! returns an error instead of panicking so the sync layer can count
//! failures against its circuit breaker.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SheetsConfig;
use crate::error::{AppError, AppResult};

/// Client for the external spreadsheet mirror
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_token: String,
}

/// Values payload returned by range reads
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<UpdateResponse>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build sheets client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_token: config.api_token.clone(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: &str, spreadsheet_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            api_token: "test-token".to_string(),
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.base_url, self.spreadsheet_id, range, suffix
        )
    }

    /// Read a range; an empty or never-written range yields an empty vec
    pub async fn get_values(&self, range: &str) -> AppResult<Vec<Vec<Value>>> {
        let response = self
            .client
            .get(self.values_url(range, ""))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport_error)?;

        let body: ValueRange = check_status(response, "get_values")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(body.values.unwrap_or_default())
    }

    /// Overwrite a range with the given rows
    pub async fn update_values(&self, range: &str, values: Vec<Vec<Value>>) -> AppResult<u32> {
        let response = self
            .client
            .put(self.values_url(range, "?valueInputOption=USER_ENTERED"))
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(transport_error)?;

        let body: UpdateResponse = check_status(response, "update_values")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(body.updated_cells.unwrap_or(0))
    }

    /// Append rows after the last data row of the range's sheet
    pub async fn append_values(&self, range: &str, values: Vec<Vec<Value>>) -> AppResult<u32> {
        let response = self
            .client
            .post(self.values_url(range, ":append?valueInputOption=USER_ENTERED"))
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(transport_error)?;

        let body: AppendResponse = check_status(response, "append_values")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(body.updates.and_then(|u| u.updated_cells).unwrap_or(0))
    }

    /// Clear all values in a range, keeping the sheet itself
    pub async fn clear_values(&self, range: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.values_url(range, ":clear"))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response, "clear_values").await?;
        Ok(())
    }

    /// List the titles of all sheets in the spreadsheet
    pub async fn sheet_titles(&self) -> AppResult<Vec<String>> {
        let url = format!("{}/v4/spreadsheets/{}", self.base_url, self.spreadsheet_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport_error)?;

        let body: SpreadsheetMeta = check_status(response, "sheet_titles")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(body
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    /// Create a new sheet tab with the given title
    pub async fn add_sheet(&self, title: &str) -> AppResult<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "requests": [
                    { "addSheet": { "properties": { "title": title } } }
                ]
            }))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response, "add_sheet").await?;
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::ExternalTransport(format!("request timed out: {}", err))
    } else {
        AppError::ExternalTransport(err.to_string())
    }
}

async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = format!("{}: HTTP {} {}", operation, status.as_u16(), body);

    Err(match status.as_u16() {
        401 | 403 => AppError::ExternalAuth(detail),
        404 => AppError::ExternalNotFound(detail),
        400 => AppError::ExternalBadRequest(detail),
        _ => AppError::ExternalTransport(detail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::with_base_url("https://sheets.example.com", "sheet-1")
    }

    #[test]
    fn values_url_includes_spreadsheet_and_range() {
        let url = client().values_url("Products!A1:Q1", "");
        assert_eq!(
            url,
            "https://sheets.example.com/v4/spreadsheets/sheet-1/values/Products!A1:Q1"
        );
    }

    #[test]
    fn values_url_appends_action_suffix() {
        let url = client().values_url("Products!A:Q", ":append?valueInputOption=USER_ENTERED");
        assert!(url.ends_with("/values/Products!A:Q:append?valueInputOption=USER_ENTERED"));
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let config = SheetsConfig {
            base_url: "https://sheets.example.com/".to_string(),
            api_token: "token".to_string(),
            spreadsheet_id: "sheet-1".to_string(),
            timeout_secs: 10,
        };
        let client = SheetsClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://sheets.example.com");
    }
}
