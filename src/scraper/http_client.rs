use crate::config::{Credentials, ScraperConfig};
use crate::utils::error::ScrapeError;
use reqwest::header::{CONTENT_TYPE, REFERER};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::parsers::parse_login_token;

/// Builds the cookie-carrying client and performs the form login.
pub struct Authenticator {
    inner: reqwest::Client,
    login_url: Url,
    dashboard_url: Url,
    token_field: String,
}

impl Authenticator {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            // Session cookie + csrftoken must survive between requests
            .cookie_store(true)
            .build()?;

        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            inner,
            login_url: base.join(&config.login_path)?,
            dashboard_url: base.join(&config.dashboard_path)?,
            token_field: config.token_field.clone(),
        })
    }

    /// GET the login form, lift the anti-forgery token, POST the credentials.
    /// Landing anywhere but the dashboard counts as a failed login.
    pub async fn login(self, credentials: &Credentials) -> Result<Session, ScrapeError> {
        debug!("GET {}", self.login_url);
        let page = self.inner.get(self.login_url.clone()).send().await?.text().await?;
        let token = parse_login_token(&page, &self.token_field)?;
        debug!("Found {} on login page", self.token_field);

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.email)
            .append_pair("password", &credentials.password)
            .append_pair(&self.token_field, &token)
            .finish();

        let resp = self
            .inner
            .post(self.login_url.clone())
            .header(REFERER, self.login_url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if resp.url() != &self.dashboard_url {
            return Err(ScrapeError::LoginFailed {
                expected: self.dashboard_url.to_string(),
                actual: resp.url().to_string(),
            });
        }

        info!("Logged in as {}", credentials.email);
        Ok(Session { inner: self.inner })
    }
}

/// An authenticated HTTP session. Only obtainable through a successful login.
#[derive(Debug)]
pub struct Session {
    inner: reqwest::Client,
}

impl Session {
    /// Fetch a page as text; non-2xx is an error.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Http { url: url.to_string(), status });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_PAGE: &str =
        r#"<form><input type="hidden" name="csrfmiddlewaretoken" value="tok-123"></form>"#;

    fn config_for(server: &MockServer) -> ScraperConfig {
        ScraperConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            request_delay_ms: 0,
            ..ScraperConfig::default()
        }
    }

    async fn mount_login_page(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/login/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "csrftoken=abc; Path=/")
                    .set_body_string(LOGIN_PAGE),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_login_success_follows_redirect_to_dashboard() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;

        let referer = format!("{}/login/", server.uri());
        Mock::given(method("POST"))
            .and(path("/login/"))
            .and(header("Referer", referer.as_str()))
            .and(body_string_contains("csrfmiddlewaretoken=tok-123"))
            .and(body_string_contains("username=me%40example.com"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/dash/"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dash/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("dashboard"))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Authenticator::new(&config_for(&server)).unwrap();
        let session = auth.login(&Credentials::new("me@example.com", "pw")).await;
        assert!(session.is_ok());
    }

    #[tokio::test]
    async fn test_login_failure_on_wrong_landing_url() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        // Bad credentials: Django re-renders the login form.
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
            .mount(&server)
            .await;

        let auth = Authenticator::new(&config_for(&server)).unwrap();
        let err = auth
            .login(&Credentials::new("me@example.com", "wrong"))
            .await
            .err()
            .unwrap();
        match err {
            ScrapeError::LoginFailed { expected, actual } => {
                assert!(expected.ends_with("/dash/"));
                assert!(actual.ends_with("/login/"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_login_token_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = Authenticator::new(&config_for(&server)).unwrap();
        let err = auth.login(&Credentials::new("a", "b")).await.err().unwrap();
        assert!(matches!(err, ScrapeError::TokenMissing { .. }));
    }

    #[tokio::test]
    async fn test_session_get_text_reports_status() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/dash/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dash/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/company/GONE/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let session = Authenticator::new(&config_for(&server))
            .unwrap()
            .login(&Credentials::new("a", "b"))
            .await
            .unwrap();
        let err = session
            .get_text(&format!("{}/company/GONE/", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Http { status, .. } if status.as_u16() == 404));
    }
}
