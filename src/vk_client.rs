use std::io::{self, Write};

use reqwest::{Client, header};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::input::{AlbumQuery, Credentials};
use crate::model::Record;

pub const API_BASE: &str = "https://api.vk.com";
pub const OAUTH_BASE: &str = "https://oauth.vk.com";

const API_VERSION: &str = "5.131";
// official Android client, the only one allowed the password grant
const CLIENT_ID: &str = "2274003";
const CLIENT_SECRET: &str = "hHbZxrka2uZ6jB1inYsH";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:85.0) Gecko/20100101 Firefox/85.0";

/// Server-side page caps for the two paginated listings.
const PHOTOS_PAGE: u64 = 1000;
const COMMENTS_PAGE: u64 = 100;

/// Supplies operator answers when the auth flow is challenged. The production
/// implementation prompts on stdin; tests inject canned responses.
pub trait ChallengeResolver {
    /// Presents the captcha image URL and returns the code the operator read
    /// from it.
    fn resolve_captcha(&self, img_url: &str) -> io::Result<String>;

    /// Returns the one-time code and whether to remember this device.
    fn resolve_two_factor(&self) -> io::Result<(String, bool)>;
}

/// Interactive challenge prompts on the controlling terminal.
pub struct StdinChallenges;

impl StdinChallenges {
    fn prompt(message: &str) -> io::Result<String> {
        let mut out = io::stdout();
        out.write_all(message.as_bytes())?;
        out.flush()?;
        let mut reply = String::new();
        io::stdin().read_line(&mut reply)?;
        Ok(reply.trim().to_string())
    }
}

impl ChallengeResolver for StdinChallenges {
    fn resolve_captcha(&self, img_url: &str) -> io::Result<String> {
        Self::prompt(&format!("Enter captcha code: {img_url}: "))
    }

    fn resolve_two_factor(&self) -> io::Result<(String, bool)> {
        Ok((Self::prompt("Enter 2FA code: ")?, false))
    }
}

/// Thin adapter over the VK HTTP API: the direct-auth token flow plus the
/// three `photos.*` methods this tool needs, with pagination folded in.
pub struct VkClient {
    http: Client,
    api_base: String,
    oauth_base: String,
    access_token: Option<String>,
}

impl VkClient {
    pub fn new(api_base: &str, oauth_base: &str) -> VkClient {
        VkClient {
            http: Self::build_client(),
            api_base: api_base.trim_end_matches('/').to_string(),
            oauth_base: oauth_base.trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    fn build_client() -> Client {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("HTTP client with static configuration")
    }

    /// The HTTP client, shared with the image downloads.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Password-grant authentication, looping through captcha and two-factor
    /// challenges until the server hands out a token or rejects the account.
    ///
    /// Takes the credentials by value; they are dropped as soon as the token
    /// is established.
    pub async fn auth(
        &mut self,
        credentials: Credentials,
        challenges: &dyn ChallengeResolver,
    ) -> Result<()> {
        let mut challenge_params: Vec<(&'static str, String)> = Vec::new();
        loop {
            let mut params = vec![
                ("grant_type", "password".to_string()),
                ("client_id", CLIENT_ID.to_string()),
                ("client_secret", CLIENT_SECRET.to_string()),
                ("username", credentials.login.clone()),
                ("password", credentials.password.clone()),
                ("v", API_VERSION.to_string()),
                ("2fa_supported", "1".to_string()),
            ];
            params.extend(challenge_params.iter().cloned());

            let body: Value = self
                .http
                .get(format!("{}/token", self.oauth_base))
                .query(&params)
                .send()
                .await?
                .json()
                .await?;

            if let Some(token) = body.get("access_token").and_then(Value::as_str) {
                self.access_token = Some(token.to_string());
                return Ok(());
            }

            match body.get("error").and_then(Value::as_str) {
                Some("need_captcha") => {
                    let sid = field_string(&body, "captcha_sid");
                    let img = field_string(&body, "captcha_img");
                    let key = challenges.resolve_captcha(&img)?;
                    challenge_params = vec![("captcha_sid", sid), ("captcha_key", key)];
                }
                Some("need_validation") => {
                    let (code, _remember_device) = challenges.resolve_two_factor()?;
                    challenge_params = vec![("code", code)];
                }
                _ => {
                    return Err(Error::Auth {
                        detail: auth_error_detail(&body),
                    });
                }
            }
        }
    }

    /// Metadata of a single album.
    pub async fn get_album(&self, query: &AlbumQuery) -> Result<Record> {
        let response = self
            .call(
                "photos.getAlbums",
                &[
                    ("owner_id", query.owner_id.clone()),
                    ("album_ids", query.album_id.clone()),
                ],
            )
            .await?;
        items(response).into_iter().next().ok_or_else(|| Error::Api {
            code: 0,
            message: format!(
                "album {} of owner {} not found",
                query.album_id, query.owner_id
            ),
        })
    }

    /// The album's full photo listing, requested in pages of up to 1000.
    ///
    /// `images_num` is the size field of the album metadata; the request plan
    /// is `1 + images_num / 1000` calls asking for `min(remaining, 1000)`
    /// each, so an empty album still makes one zero-count call.
    pub async fn fetch_photos(&self, query: &AlbumQuery, images_num: u64) -> Result<Vec<Record>> {
        let mut photos = Vec::new();
        for i in 0..(1 + images_num / PHOTOS_PAGE) {
            let offset = i * PHOTOS_PAGE;
            let count = (images_num - offset).min(PHOTOS_PAGE);
            let response = self
                .call(
                    "photos.get",
                    &[
                        ("owner_id", query.owner_id.clone()),
                        ("album_id", query.album_id.clone()),
                        ("photo_sizes", "1".to_string()),
                        ("count", count.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            photos.extend(items(response));
        }
        Ok(photos)
    }

    /// Every comment on the album, in pages of 100; the first short page ends
    /// the pagination.
    pub async fn fetch_all_comments(&self, query: &AlbumQuery) -> Result<Vec<Record>> {
        let mut comments = Vec::new();
        let mut offset = 0u64;
        loop {
            let response = self
                .call(
                    "photos.getAllComments",
                    &[
                        ("owner_id", query.owner_id.clone()),
                        ("album_id", query.album_id.clone()),
                        ("need_likes", "1".to_string()),
                        ("offset", offset.to_string()),
                        ("count", COMMENTS_PAGE.to_string()),
                    ],
                )
                .await?;
            let page = items(response);
            let fetched = page.len() as u64;
            comments.extend(page);
            if fetched < COMMENTS_PAGE {
                break;
            }
            offset += COMMENTS_PAGE;
        }
        Ok(comments)
    }

    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push((
            "access_token",
            self.access_token.clone().unwrap_or_default(),
        ));
        query.push(("v", API_VERSION.to_string()));

        let mut body: Value = self
            .http
            .get(format!("{}/method/{}", self.api_base, method))
            .query(&query)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = body.get("error") {
            return Err(Error::Api {
                code: error.get("error_code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("error_msg")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown API error")
                    .to_string(),
            });
        }
        Ok(body.get_mut("response").map(Value::take).unwrap_or(Value::Null))
    }
}

/// The `items` array of a method response, keeping only object entries.
fn items(response: Value) -> Vec<Record> {
    match response {
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(values)) => values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn field_string(body: &Value, key: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn auth_error_detail(body: &Value) -> String {
    match body.get("error_description").and_then(Value::as_str) {
        Some(description) => description.to_string(),
        None => body.to_string(),
    }
}
