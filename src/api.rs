use crate::config::ClientConfig;
use crate::date_key::DateKey;
use crate::errors::HabitError;
use crate::models::{Habit, HabitTemplate, TemplateRequest, TitleRequest, UserProfile};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;

/// The remote service. It owns every habit, log, template and statistic; the
/// client only ever holds a cached copy.
pub trait HabitApi: Send + Sync {
    fn list_habits(&self) -> impl Future<Output = Result<Vec<Habit>, HabitError>> + Send;

    fn create_habit(&self, title: &str) -> impl Future<Output = Result<Habit, HabitError>> + Send;

    fn rename_habit(
        &self,
        id: &str,
        title: &str,
    ) -> impl Future<Output = Result<Habit, HabitError>> + Send;

    fn delete_habit(&self, id: &str) -> impl Future<Output = Result<(), HabitError>> + Send;

    fn toggle_habit(
        &self,
        id: &str,
        date: &DateKey,
    ) -> impl Future<Output = Result<(), HabitError>> + Send;

    fn list_templates(
        &self,
    ) -> impl Future<Output = Result<Vec<HabitTemplate>, HabitError>> + Send;

    fn create_template(
        &self,
        name: &str,
        habit_titles: &[String],
    ) -> impl Future<Output = Result<HabitTemplate, HabitError>> + Send;

    fn delete_template(&self, id: &str) -> impl Future<Output = Result<(), HabitError>> + Send;

    fn apply_template(&self, id: &str)
    -> impl Future<Output = Result<Vec<Habit>, HabitError>> + Send;

    fn analytics(&self) -> impl Future<Output = Result<serde_json::Value, HabitError>> + Send;

    fn profile(&self) -> impl Future<Output = Result<UserProfile, HabitError>> + Send;

    fn update_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, HabitError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpHabitApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpHabitApi {
    pub fn new(config: &ClientConfig) -> Result<Self, HabitError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|err| HabitError::Config(format!("invalid base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HabitError::Config(format!(
                "base url `{base_url}` cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| HabitError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base path, percent-encoding each one, so an
    /// id can never smuggle in extra path components or a query.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, HabitError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| HabitError::remote(operation, err.to_string()))?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "remote responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        } else {
            body.trim().to_string()
        };
        Err(HabitError::rejected(operation, status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, HabitError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| HabitError::remote(operation, format!("unreadable response: {err}")))
    }
}

impl HabitApi for HttpHabitApi {
    async fn list_habits(&self) -> Result<Vec<Habit>, HabitError> {
        let request = self.client.get(self.url(&["habits"]));
        self.send_json("list habits", request).await
    }

    async fn create_habit(&self, title: &str) -> Result<Habit, HabitError> {
        let request = self
            .client
            .post(self.url(&["habits"]))
            .json(&TitleRequest { title });
        self.send_json("create habit", request).await
    }

    async fn rename_habit(&self, id: &str, title: &str) -> Result<Habit, HabitError> {
        let request = self
            .client
            .put(self.url(&["habits", id]))
            .json(&TitleRequest { title });
        self.send_json("rename habit", request).await
    }

    async fn delete_habit(&self, id: &str) -> Result<(), HabitError> {
        let request = self.client.delete(self.url(&["habits", id]));
        self.send("delete habit", request).await.map(|_| ())
    }

    async fn toggle_habit(&self, id: &str, date: &DateKey) -> Result<(), HabitError> {
        let request = self
            .client
            .post(self.url(&["habits", id, "toggle"]))
            .query(&[("date", date.as_str())]);
        self.send("toggle habit", request).await.map(|_| ())
    }

    async fn list_templates(&self) -> Result<Vec<HabitTemplate>, HabitError> {
        let request = self.client.get(self.url(&["templates"]));
        self.send_json("list templates", request).await
    }

    async fn create_template(
        &self,
        name: &str,
        habit_titles: &[String],
    ) -> Result<HabitTemplate, HabitError> {
        let request = self
            .client
            .post(self.url(&["templates"]))
            .json(&TemplateRequest { name, habit_titles });
        self.send_json("create template", request).await
    }

    async fn delete_template(&self, id: &str) -> Result<(), HabitError> {
        let request = self.client.delete(self.url(&["templates", id]));
        self.send("delete template", request).await.map(|_| ())
    }

    async fn apply_template(&self, id: &str) -> Result<Vec<Habit>, HabitError> {
        let request = self.client.post(self.url(&["templates", id, "apply"]));
        self.send_json("apply template", request).await
    }

    async fn analytics(&self) -> Result<serde_json::Value, HabitError> {
        let request = self.client.get(self.url(&["analytics"]));
        self.send_json("load analytics", request).await
    }

    async fn profile(&self) -> Result<UserProfile, HabitError> {
        let request = self.client.get(self.url(&["users", "me"]));
        self.send_json("load profile", request).await
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, HabitError> {
        let request = self.client.put(self.url(&["users", "me"])).json(profile);
        self.send_json("update profile", request).await
    }
}
