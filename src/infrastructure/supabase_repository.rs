// Supabase repository implementation (PostgREST tables and the auth user endpoint)
use crate::application::monitor_repository::{IdentityProvider, InstrumentRepository};
use crate::domain::project::{Instrument, Project};
use crate::domain::session::{PermissionGrant, User};
use crate::infrastructure::config::SupabaseSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SupabaseRepository {
    client: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseRepository {
    pub fn new(settings: &SupabaseSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
        })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}?select=*", self.url, table);
        for (column, filter) in filters {
            url.push_str(&format!("&{}={}", column, urlencoding::encode(filter)));
        }
        url
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, String)]) -> Result<Vec<T>> {
        let url = self.table_url(table, filters);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to query Supabase table {}", table))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase query on {} failed with status {}: {}", table, status, body);
        }

        response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("Failed to parse rows from {}", table))
    }
}

#[async_trait]
impl InstrumentRepository for SupabaseRepository {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.select("Projects", &[("order", "id.asc".to_string())]).await
    }

    async fn list_instruments(&self, project_id: Option<i64>) -> Result<Vec<Instrument>> {
        let mut filters = vec![("order", "instrument_id.asc".to_string())];
        if let Some(id) = project_id {
            filters.push(("project_id", format!("eq.{}", id)));
        }
        self.select("instruments", &filters).await
    }

    async fn get_instrument(&self, instrument_id: &str) -> Result<Option<Instrument>> {
        let rows: Vec<Instrument> = self
            .select("instruments", &[("instrument_id", format!("eq.{}", instrument_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn permission_grants(&self, user_id: &str) -> Result<Vec<PermissionGrant>> {
        self.select("user_permissions", &[("user_id", format!("eq.{}", user_id))])
            .await
    }
}

#[async_trait]
impl IdentityProvider for SupabaseRepository {
    async fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach Supabase auth")?;

        match response.status() {
            status if status.is_success() => {
                let user = response.json::<User>().await.context("Failed to parse Supabase user")?;
                Ok(Some(user))
            }
            status if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Ok(None)
            }
            status => anyhow::bail!("Supabase auth responded with status {}", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_supabase() -> String {
        let router = Router::new()
            .route(
                "/rest/v1/instruments",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let rows = vec![
                        json!({"instrument_id": "SMG-1", "project_id": 1, "sensor_type": "seismograph", "alert_value": 0.8}),
                        json!({"instrument_id": "SMG-2", "project_id": 2, "sensor_type": "micromate"}),
                    ];
                    let filtered: Vec<Value> = rows
                        .into_iter()
                        .filter(|r| match q.get("instrument_id") {
                            Some(f) => f.strip_prefix("eq.") == r["instrument_id"].as_str(),
                            None => true,
                        })
                        .collect();
                    Json(filtered)
                }),
            )
            .route(
                "/auth/v1/user",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer good") => {
                            (axum::http::StatusCode::OK, Json(json!({"id": "u1", "email": "a@b.c"})))
                        }
                        _ => (axum::http::StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid"}))),
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn repository(url: String) -> SupabaseRepository {
        SupabaseRepository::new(
            &SupabaseSettings {
                url,
                anon_key: "anon".into(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let repo = repository("https://x.supabase.co/".into());
        assert_eq!(
            repo.table_url("instruments", &[("instrument_id", "eq.A B".to_string())]),
            "https://x.supabase.co/rest/v1/instruments?select=*&instrument_id=eq.A%20B"
        );
    }

    #[tokio::test]
    async fn test_get_instrument() {
        let repo = repository(spawn_supabase().await);
        let instrument = repo.get_instrument("SMG-1").await.unwrap().unwrap();
        assert_eq!(instrument.thresholds().alert, Some(0.8));
        assert!(repo.get_instrument("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_for_token() {
        let repo = repository(spawn_supabase().await);
        let user = repo.user_for_token("good").await.unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert!(repo.user_for_token("bad").await.unwrap().is_none());
    }
}
