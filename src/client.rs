use crate::{
    Result,
    authorize::{self, AuthorizeUrl, Scope},
    constants,
    error::Error::{Config, InternalServer},
    response,
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};

/// 微信 OAuth 客户端
///
/// 提供授权页地址构建、网页授权 code 换取 access_token、小程序 code2Session 等功能。
///
/// # 快速开始
///
/// ```no_run
/// use wechat_oauth::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new("your_app_id", "your_app_secret");
///
///     // 引导用户跳转到授权页
///     let url = client.oauth_url("https://example.com/callback");
///     println!("授权页: {}", url);
///
///     // 回调中拿到 code 后换取网页授权 access_token
///     let token = client.code_to_token("code_from_callback").await?;
///     println!("用户OpenID: {}", token.open_id());
///
///     Ok(())
/// }
/// ```
///
/// # 线程安全
///
/// `Client` 只读持有 AppID 和 AppSecret，内部使用 `Arc` 共享，克隆开销很小，
/// 可以在多个任务中并发调用。每次调用都是一次独立的请求，不做缓存和重试。
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// 创建新的客户端
    ///
    /// # 参数
    ///
    /// - `app_id`: 公众号 / 小程序 / 网站应用的 AppID，企业微信场景下为 CorpID
    /// - `secret`: 对应的 AppSecret
    ///
    /// # 示例
    ///
    /// ```
    /// use wechat_oauth::Client;
    ///
    /// let client = Client::new("your_appid", "your_app_secret_here");
    /// assert_eq!(client.app_id(), "your_appid");
    /// ```
    pub fn new(app_id: &str, secret: &str) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                app_id: app_id.into(),
                secret: secret.into(),
                api_base_url: constants::API_BASE_URL.into(),
                corp_api_base_url: constants::CORP_API_BASE_URL.into(),
                client: reqwest::Client::new(),
            }),
        }
    }

    /// 使用构建器创建客户端，可以自定义超时、接口域名和 HTTP 客户端
    ///
    /// ```
    /// use std::time::Duration;
    /// use wechat_oauth::Client;
    ///
    /// let client = Client::builder()
    ///     .app_id("your_appid")
    ///     .secret("your_app_secret_here")
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn app_id(&self) -> &str {
        &self.inner.app_id
    }

    pub(crate) fn secret(&self) -> &str {
        &self.inner.secret
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.inner.api_base_url, path)
    }

    pub(crate) fn corp_api_url(&self, path: &str) -> String {
        format!("{}{}", self.inner.corp_api_base_url, path)
    }

    /// 当前 AppID 的公众号网页授权页地址（`snsapi_base`）
    pub fn oauth_url(&self, redirect_uri: &str) -> String {
        authorize::oauth_url(&self.inner.app_id, redirect_uri)
    }

    /// 当前 AppID 的开放平台扫码登录页地址（`snsapi_login`）
    pub fn open_platform_url(&self, redirect_uri: &str) -> String {
        authorize::open_platform_url(&self.inner.app_id, redirect_uri)
    }

    /// 当前 AppID 的授权页构建器
    pub fn authorize_url(&self, redirect_uri: &str, scope: Scope) -> AuthorizeUrl {
        AuthorizeUrl::new(self.inner.app_id.as_str(), redirect_uri, scope)
    }

    pub(crate) fn request(&self, end_point: &str, query: &[(&str, &str)]) -> reqwest::RequestBuilder {
        self.inner.client.get(end_point).query(query)
    }

    /// 发起 GET 请求并解码响应
    ///
    /// 非 2xx 状态返回 `InternalServer`，`errcode` 非 0 返回 `Api`，
    /// 其余解码失败返回 `SerdeJson`。查询参数中带有密钥，只记录状态码。
    #[instrument(skip(self, query))]
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        end_point: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.request(end_point, query).send().await?;

        debug!("response status: {}", response.status());

        if response.status().is_success() {
            let body = response.bytes().await?;

            response::decode(&body)
        } else {
            Err(InternalServer(response.text().await?))
        }
    }
}

struct ClientInner {
    app_id: String,
    secret: String,
    api_base_url: String,
    corp_api_base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInner")
            .field("app_id", &self.app_id)
            .field("secret", &"********")
            .field("api_base_url", &self.api_base_url)
            .field("corp_api_base_url", &self.corp_api_base_url)
            .finish()
    }
}

/// [`Client`] 构建器
#[must_use]
#[derive(Default)]
pub struct ClientBuilder {
    app_id: Option<String>,
    secret: Option<String>,
    api_base_url: Option<String>,
    corp_api_base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<reqwest::Client>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("app_id", &self.app_id)
            .field("api_base_url", &self.api_base_url)
            .field("corp_api_base_url", &self.corp_api_base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// 替换 `https://api.weixin.qq.com`，主要用于测试
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// 替换 `https://qyapi.weixin.qq.com`，主要用于测试
    pub fn corp_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.corp_api_base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// 使用自定义的 `reqwest::Client`，此时 `timeout` 和 `connect_timeout` 不生效
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<Client> {
        let app_id = self
            .app_id
            .ok_or_else(|| Config("app_id is required".to_string()))?;
        let secret = self
            .secret
            .ok_or_else(|| Config("secret is required".to_string()))?;

        let api_base_url = base_url(self.api_base_url, constants::API_BASE_URL)?;
        let corp_api_base_url = base_url(self.corp_api_base_url, constants::CORP_API_BASE_URL)?;

        let client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();

                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }

                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }

                builder.build()?
            }
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                app_id,
                secret,
                api_base_url,
                corp_api_base_url,
                client,
            }),
        })
    }
}

fn base_url(url: Option<String>, default: &str) -> Result<String> {
    let url = url.unwrap_or_else(|| default.to_string());

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Config(format!(
            "base url must start with http:// or https://, got: {}",
            url
        )));
    }

    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn builder_requires_app_id() {
        let error = Client::builder().secret("secret").build().unwrap_err();

        assert!(matches!(error, Error::Config(message) if message.contains("app_id")));
    }

    #[test]
    fn builder_requires_secret() {
        let error = Client::builder().app_id("wx123").build().unwrap_err();

        assert!(matches!(error, Error::Config(message) if message.contains("secret")));
    }

    #[test]
    fn builder_rejects_base_url_without_scheme() {
        let error = Client::builder()
            .app_id("wx123")
            .secret("secret")
            .api_base_url("api.weixin.qq.com")
            .build()
            .unwrap_err();

        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = Client::builder()
            .app_id("wx123")
            .secret("secret")
            .api_base_url("http://127.0.0.1:8080/")
            .build()
            .unwrap();

        assert_eq!(client.api_url("/sns/auth"), "http://127.0.0.1:8080/sns/auth");
        assert_eq!(
            client.corp_api_url("/cgi-bin/miniprogram/jscode2session"),
            "https://qyapi.weixin.qq.com/cgi-bin/miniprogram/jscode2session"
        );
    }

    #[test]
    fn debug_masks_secret() {
        let client = Client::new("wx123", "super-secret");
        let output = format!("{:?}", client);

        assert!(output.contains("wx123"));
        assert!(!output.contains("super-secret"));
    }

    #[test]
    fn client_url_helpers_use_app_id() {
        let client = Client::new("wx123", "secret");

        assert_eq!(
            client.oauth_url("https://a.com/cb?x=1"),
            authorize::oauth_url("wx123", "https://a.com/cb?x=1")
        );
        assert_eq!(
            client.open_platform_url("https://a.com/cb"),
            authorize::open_platform_url("wx123", "https://a.com/cb")
        );
        assert!(
            client
                .authorize_url("https://a.com/cb", Scope::UserInfo)
                .build()
                .contains("scope=snsapi_userinfo")
        );
    }
}
