//! HTTP backend client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use rota_core::{
    AvailabilityBackend, BackendConfig, MonthAvailability, SaveResponse, SaveSelectionsRequest, Statistics,
    StatisticsQuery, User, UserId, YearMonth,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::error::{ClientError, Result};

/// Availability backend reached over HTTP + JSON
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    /// Create a new client
    pub fn new(config: &BackendConfig) -> Result<Self> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid backend URL '{}': {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!("Availability backend client initialized for: {}", base_url);

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Add authorization header
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} failed: {} - {}", what, status, body);
            return Err(ClientError::Status { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(format!("{}: {}", what, e)))
    }

    /// GET /users
    pub async fn fetch_staff(&self) -> Result<Vec<User>> {
        debug!("Fetching staff list");
        let users: Vec<User> = self.send_json(self.client.get(self.url("users")), "List staff").await?;
        info!("Fetched {} staff users", users.len());
        Ok(users)
    }

    /// GET /availability/{year}/{month}
    pub async fn fetch_month(&self, user_id: Option<UserId>, month: YearMonth) -> Result<MonthAvailability> {
        let url = self.url(&format!("availability/{}/{}", month.year(), month.month()));
        let mut request = self.client.get(&url);
        if let Some(id) = user_id {
            request = request.query(&[("user_id", id)]);
        }

        debug!(month = %month, user_id = ?user_id, "Fetching month availability");
        self.send_json(request, "Fetch month").await
    }

    /// GET /statistics
    pub async fn fetch_statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics> {
        let mut params = query.query_pairs();
        if let Some(id) = user_id {
            params.push(("user_id", id.to_string()));
        }

        debug!(filter = %query.filter_type, "Fetching statistics");
        self.send_json(self.client.get(self.url("statistics")).query(&params), "Fetch statistics")
            .await
    }

    /// POST /statistics
    pub async fn post_statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics> {
        let mut body = serde_json::to_value(query).map_err(|e| ClientError::Parse(e.to_string()))?;
        if let Some(id) = user_id {
            body["user_id"] = serde_json::json!(id);
        }

        debug!(filter = %query.filter_type, "Recomputing statistics");
        self.send_json(self.client.post(self.url("statistics")).json(&body), "Recompute statistics")
            .await
    }

    /// POST /availability
    pub async fn post_selections(&self, request: &SaveSelectionsRequest) -> Result<SaveResponse> {
        debug!(
            year = request.year,
            month = request.month,
            days = request.selections.len(),
            single = request.is_single_update,
            "Saving selections"
        );
        let response: SaveResponse = self
            .send_json(self.client.post(self.url("availability")).json(request), "Save selections")
            .await?;
        if !response.success {
            error!("Save rejected: {:?}", response.message);
        }
        Ok(response)
    }
}

#[async_trait]
impl AvailabilityBackend for HttpBackend {
    async fn list_staff(&self) -> rota_core::Result<Vec<User>> {
        Ok(self.fetch_staff().await?)
    }

    async fn month_availability(&self, user_id: Option<UserId>, month: YearMonth) -> rota_core::Result<MonthAvailability> {
        Ok(self.fetch_month(user_id, month).await?)
    }

    async fn statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> rota_core::Result<Statistics> {
        Ok(self.fetch_statistics(user_id, query).await?)
    }

    async fn recompute_statistics(
        &self,
        user_id: Option<UserId>,
        query: &StatisticsQuery,
    ) -> rota_core::Result<Statistics> {
        Ok(self.post_statistics(user_id, query).await?)
    }

    async fn save_selections(&self, request: &SaveSelectionsRequest) -> rota_core::Result<SaveResponse> {
        Ok(self.post_selections(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rota_core::{AvailabilityOption, FilterType, RotaError};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer, token: Option<&str>) -> HttpBackend {
        let config = BackendConfig {
            base_url: format!("{}/api/", server.uri()),
            api_token: token.map(str::to_string),
            timeout_secs: 5,
        };
        HttpBackend::new(&config).unwrap()
    }

    fn may() -> YearMonth {
        YearMonth::new(2024, 5).unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        let config = BackendConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(HttpBackend::new(&config), Err(ClientError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_list_staff_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Ana", "email": "ana@example.com"},
                {"id": 2, "name": "Ben", "email": "ben@example.com", "is_admin": true}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let users = backend_for(&server, Some("s3cret")).list_staff().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[1].is_admin);
    }

    #[tokio::test]
    async fn test_month_availability_for_staff_member() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/availability/2024/5"))
            .and(query_param("user_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "year": 2024,
                "month": 5,
                "selections": {"2024-05-06": "evening", "2024-05-07": null},
                "statistics": {"total_duty_days": 1, "leave_taken": 0, "upcoming_leave": 2}
            })))
            .mount(&server)
            .await;

        let month = backend_for(&server, None)
            .month_availability(Some(7), may())
            .await
            .unwrap();
        let may6 = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(month.selections[&may6], Some(AvailabilityOption::Evening));
        assert_eq!(month.statistics.unwrap().upcoming_leave, 2);
    }

    #[tokio::test]
    async fn test_statistics_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .and(query_param("filter_type", "year"))
            .and(query_param("start_date", "2024-01-01"))
            .and(query_param("end_date", "2024-12-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_duty_days": 120,
                "leave_taken": 10,
                "upcoming_leave": 3,
                "filter_type": "year",
                "start_date": "2024-01-01",
                "end_date": "2024-12-31"
            })))
            .mount(&server)
            .await;

        let query = StatisticsQuery::year(2024).unwrap();
        let stats = backend_for(&server, None).statistics(None, &query).await.unwrap();
        assert_eq!(stats.total_duty_days, 120);
        assert_eq!(stats.filter_type, FilterType::Year);
    }

    #[tokio::test]
    async fn test_missing_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = backend_for(&server, None)
            .statistics(None, &StatisticsQuery::month(may()))
            .await
            .unwrap_err();
        assert!(matches!(err, RotaError::MissingData(_)));
    }

    #[tokio::test]
    async fn test_recompute_posts_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/statistics"))
            .and(body_partial_json(json!({
                "filter_type": "month",
                "start_date": "2024-05-01",
                "end_date": "2024-05-31",
                "user_id": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_duty_days": 4})))
            .expect(1)
            .mount(&server)
            .await;

        let stats = backend_for(&server, None)
            .recompute_statistics(Some(3), &StatisticsQuery::month(may()))
            .await
            .unwrap();
        assert_eq!(stats.total_duty_days, 4);
    }

    #[tokio::test]
    async fn test_save_single_selection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .and(body_partial_json(json!({
                "year": 2024,
                "month": 5,
                "selections": {"2024-05-20": "morning"},
                "is_single_update": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let request = SaveSelectionsRequest::single(may(), None, date, Some(AvailabilityOption::Morning));
        let response = backend_for(&server, None).save_selections(&request).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_save_rejected_by_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .respond_with(ResponseTemplate::new(422).set_body_string("day is locked"))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let request = SaveSelectionsRequest::single(may(), None, date, None);
        let err = backend_for(&server, None).save_selections(&request).await.unwrap_err();
        assert!(matches!(err, RotaError::Validation(ref m) if m == "day is locked"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = backend_for(&server, None).list_staff().await.unwrap_err();
        assert!(matches!(err, RotaError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: None,
            timeout_secs: 2,
        };
        let err = HttpBackend::new(&config).unwrap().list_staff().await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
