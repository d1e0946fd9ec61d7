use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::RedditConfig;
use crate::platform::{Inbox, Mention};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const PAGE_SIZE: &str = "100";
/// Refresh this long before the token actually expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: ThingData,
}

/// Unread items can be comments or private messages; messages have no
/// context and their bodies simply won't parse as commands.
#[derive(Debug, Deserialize)]
struct ThingData {
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    context: String,
}

fn mentions_from(listing: Listing) -> Vec<Mention> {
    listing
        .data
        .children
        .into_iter()
        .map(|child| Mention {
            id: child.data.name,
            author: child.data.author,
            body: child.data.body,
            context: child.data.context,
        })
        .collect()
}

/// Reddit inbox transport over the OAuth2 password grant.
pub struct RedditClient {
    client: reqwest::Client,
    config: RedditConfig,
    user_agent: String,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Self {
        let user_agent = format!(
            "randombot/{} by /u/{}",
            env!("CARGO_PKG_VERSION"),
            config.username
        );
        Self {
            client: reqwest::Client::new(),
            config,
            user_agent,
            token: Mutex::new(None),
        }
    }

    async fn bearer_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if Instant::now() + TOKEN_SLACK < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        debug!("Requesting new Reddit access token");

        let response: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(USER_AGENT, &self.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the Reddit token endpoint")?
            .error_for_status()
            .context("Reddit rejected the credential grant")?
            .json()
            .await
            .context("Failed to parse the Reddit token response")?;

        let fresh = AccessToken {
            value: response.access_token,
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        };
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn fetch_unread_page(&self, after: Option<&str>) -> Result<Listing> {
        let token = self.bearer_token().await?;
        let mut query = vec![("limit", PAGE_SIZE)];
        if let Some(after) = after {
            query.push(("after", after));
        }

        self.client
            .get(format!("{API_BASE}/message/unread"))
            .bearer_auth(token)
            .header(USER_AGENT, &self.user_agent)
            .query(&query)
            .send()
            .await
            .context("Failed to fetch the unread listing")?
            .error_for_status()
            .context("Reddit returned an error for the unread listing")?
            .json()
            .await
            .context("Failed to parse the unread listing")
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<()> {
        let token = self.bearer_token().await?;
        self.client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .header(USER_AGENT, &self.user_agent)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {path}"))?
            .error_for_status()
            .with_context(|| format!("Reddit returned an error for {path}"))?;
        Ok(())
    }
}

#[async_trait]
impl Inbox for RedditClient {
    async fn unread_mentions(&self) -> Result<Vec<Mention>> {
        // The unread count is unbounded, so walk the listing pages.
        let mut mentions = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let listing = self.fetch_unread_page(after.as_deref()).await?;
            let next = listing.data.after.clone();
            mentions.extend(mentions_from(listing));
            match next {
                Some(cursor) if !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }
        }

        Ok(mentions)
    }

    async fn mark_read(&self, mention: &Mention) -> Result<()> {
        self.post_form("/api/read_message", &[("id", mention.id.as_str())])
            .await
    }

    async fn reply(&self, mention: &Mention, body: &str) -> Result<()> {
        self.post_form(
            "/api/comment",
            &[
                ("thing_id", mention.id.as_str()),
                ("text", body),
                ("api_type", "json"),
            ],
        )
        .await
    }

    async fn send_private_message(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.post_form(
            "/api/compose",
            &[
                ("to", to),
                ("subject", subject),
                ("text", body),
                ("api_type", "json"),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_listing_deserialization() {
        let payload = r#"{
            "kind": "Listing",
            "data": {
                "after": null,
                "children": [
                    {
                        "kind": "t1",
                        "data": {
                            "name": "t1_abc123",
                            "author": "some_user",
                            "body": "u/randomnumberbot 5",
                            "context": "/r/lego/comments/xyz/raffle/abc123/?context=3"
                        }
                    },
                    {
                        "kind": "t4",
                        "data": {
                            "name": "t4_def456",
                            "author": "another_user",
                            "body": "hello there"
                        }
                    }
                ]
            }
        }"#;

        let listing: Listing = serde_json::from_str(payload).unwrap();
        assert!(listing.data.after.is_none());

        let mentions = mentions_from(listing);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].id, "t1_abc123");
        assert_eq!(mentions[0].author, "some_user");
        assert_eq!(mentions[0].body, "u/randomnumberbot 5");
        // Private messages carry no context.
        assert_eq!(mentions[1].context, "");
    }

    #[test]
    fn test_user_agent_names_bot_and_version() {
        let client = RedditClient::new(RedditConfig {
            username: "randomnumberbot".to_string(),
            password: "hunter2".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        });
        assert_eq!(
            client.user_agent,
            format!(
                "randombot/{} by /u/randomnumberbot",
                env!("CARGO_PKG_VERSION")
            )
        );
    }
}
