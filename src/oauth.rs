//! 微信网页授权模块
//!
//! 用户在授权页同意授权后，服务端使用回调中的 `code` 换取网页授权 access_token，
//! 之后可以刷新 access_token、检验其有效性，以及在 `snsapi_userinfo` 授权下拉取用户信息。
//!
//! 网页授权 access_token 与小程序 / 公众号的全局 access_token 不同，
//! 它只代表某个用户对当前应用的授权。
//!
//! ```no_run
//! use wechat_oauth::{Client, oauth::Lang};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("app_id", "secret");
//!
//! let token = client.code_to_token("code_from_callback").await?;
//!
//! let token = if token.is_expired() {
//!     client.refresh_token(token.refresh_token()).await?
//! } else {
//!     token
//! };
//!
//! let user = client
//!     .user_info(token.access_token(), token.open_id(), Lang::ZhCn)
//!     .await?;
//! println!("昵称: {}", user.nickname());
//! # Ok(())
//! # }
//! ```
//!
//! [网页授权](https://developers.weixin.qq.com/doc/offiaccount/OA_Web_Apps/Wechat_webpage_authorization.html)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::Error as _, de::IgnoredAny};
use strum::Display;
use tracing::{debug, instrument};

use crate::{Result, client::Client, constants};

/// 网页授权 access_token
#[derive(Serialize, Deserialize, Clone)]
pub struct OAuthAccessToken {
    access_token: String,
    expires_in: i64,
    expired_at: DateTime<Utc>,
    refresh_token: String,
    open_id: String,
    scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    union_id: Option<String>,
}

impl OAuthAccessToken {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// 有效期，单位秒
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// 根据响应时间和 `expires_in` 计算出的过期时间
    pub fn expired_at(&self) -> DateTime<Utc> {
        self.expired_at
    }

    /// 过期前 5 分钟即视为过期
    pub fn is_expired(&self) -> bool {
        self.expired_at.signed_duration_since(Utc::now()) < Duration::minutes(5)
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn open_id(&self) -> &str {
        &self.open_id
    }

    /// 用户授权的作用域，多个时用逗号分隔
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn union_id(&self) -> Option<&str> {
        self.union_id.as_deref()
    }
}

impl std::fmt::Debug for OAuthAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthAccessToken")
            .field("access_token", &"********")
            .field("expires_in", &self.expires_in)
            .field("expired_at", &self.expired_at)
            .field("refresh_token", &"********")
            .field("open_id", &self.open_id)
            .field("scope", &self.scope)
            .field("union_id", &self.union_id)
            .finish()
    }
}

#[derive(Deserialize)]
pub(crate) struct OAuthAccessTokenBuilder {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: String,
    #[serde(rename = "openid")]
    open_id: String,
    #[serde(default)]
    scope: String,
    #[serde(rename = "unionid")]
    union_id: Option<String>,
}

impl OAuthAccessTokenBuilder {
    /// `expires_in` 超出时间可表示范围时返回 [`Error::SerdeJson`](crate::error::Error::SerdeJson)
    pub(crate) fn build(self) -> Result<OAuthAccessToken> {
        let expired_at = Duration::try_seconds(self.expires_in)
            .and_then(|expires_in| Utc::now().checked_add_signed(expires_in))
            .ok_or_else(|| {
                serde_json::Error::custom(format!("expires_in out of range: {}", self.expires_in))
            })?;

        Ok(OAuthAccessToken {
            expired_at,
            access_token: self.access_token,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            open_id: self.open_id,
            scope: self.scope,
            union_id: self.union_id,
        })
    }
}

impl std::fmt::Debug for OAuthAccessTokenBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthAccessTokenBuilder")
            .field("access_token", &"********")
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &"********")
            .field("open_id", &self.open_id)
            .field("scope", &self.scope)
            .field("union_id", &self.union_id)
            .finish()
    }
}

/// 拉取用户信息时返回的国家地区语言版本
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum Lang {
    #[default]
    #[strum(serialize = "zh_CN")]
    ZhCn,
    #[strum(serialize = "zh_TW")]
    ZhTw,
    #[strum(serialize = "en")]
    En,
}

/// 通过网页授权拉取的用户信息
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInfo {
    #[serde(rename = "openid")]
    open_id: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    sex: u8,
    #[serde(default)]
    province: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
    #[serde(rename = "headimgurl", default)]
    head_img_url: String,
    #[serde(default)]
    privilege: Vec<String>,
    #[serde(rename = "unionid", skip_serializing_if = "Option::is_none")]
    union_id: Option<String>,
}

impl UserInfo {
    pub fn open_id(&self) -> &str {
        &self.open_id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// 性别，0-未知，1-男性，2-女性
    pub fn sex(&self) -> u8 {
        self.sex
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// 头像地址，用户没有头像时为空
    pub fn head_img_url(&self) -> &str {
        &self.head_img_url
    }

    /// 用户特权信息，如微信沃卡用户为 `chinaunicom`
    pub fn privilege(&self) -> &[String] {
        &self.privilege
    }

    pub fn union_id(&self) -> Option<&str> {
        self.union_id.as_deref()
    }
}

impl Client {
    /// 通过 code 换取网页授权 access_token
    ///
    /// # 参数
    ///
    /// - `code`: 授权页重定向回来时携带的 code，只能使用一次，5 分钟未被使用自动过期
    ///
    /// # 错误
    ///
    /// - 网络错误
    /// - 微信 API 返回错误，如 `{"errcode":40029,"errmsg":"invalid code"}`
    /// - 响应解析错误
    #[instrument(skip(self, code))]
    pub async fn code_to_token(&self, code: &str) -> Result<OAuthAccessToken> {
        debug!("code: {}", code);

        let token = self
            .get_json::<OAuthAccessTokenBuilder>(
                &self.api_url(constants::OAUTH2_ACCESS_TOKEN_PATH),
                &self.code_to_token_query(code),
            )
            .await?
            .build()?;

        debug!("oauth access token: {:#?}", token);

        Ok(token)
    }

    /// 刷新网页授权 access_token
    ///
    /// refresh_token 有效期为 30 天，过期后需要用户重新授权。
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthAccessToken> {
        let token = self
            .get_json::<OAuthAccessTokenBuilder>(
                &self.api_url(constants::OAUTH2_REFRESH_TOKEN_PATH),
                &self.refresh_token_query(refresh_token),
            )
            .await?
            .build()?;

        debug!("refreshed oauth access token: {:#?}", token);

        Ok(token)
    }

    /// 检验网页授权 access_token 是否有效，有效时返回 `Ok(())`
    #[instrument(skip(self, access_token))]
    pub async fn check_token(&self, access_token: &str, open_id: &str) -> Result<()> {
        self.get_json::<IgnoredAny>(
            &self.api_url(constants::OAUTH2_AUTH_PATH),
            &[("access_token", access_token), ("openid", open_id)],
        )
        .await?;

        Ok(())
    }

    /// 拉取用户信息，需要 scope 为 `snsapi_userinfo`
    #[instrument(skip(self, access_token))]
    pub async fn user_info(&self, access_token: &str, open_id: &str, lang: Lang) -> Result<UserInfo> {
        let lang = lang.to_string();

        let user = self
            .get_json::<UserInfo>(
                &self.api_url(constants::USER_INFO_PATH),
                &[
                    ("access_token", access_token),
                    ("openid", open_id),
                    ("lang", &lang),
                ],
            )
            .await?;

        debug!("user info: {:#?}", user);

        Ok(user)
    }

    fn code_to_token_query<'a>(&'a self, code: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("appid", self.app_id()),
            ("secret", self.secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ]
    }

    fn refresh_token_query<'a>(&'a self, refresh_token: &'a str) -> [(&'a str, &'a str); 3] {
        [
            ("appid", self.app_id()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(client: &Client, path: &str, query: &[(&str, &str)]) -> String {
        client
            .request(&client.api_url(path), query)
            .build()
            .unwrap()
            .url()
            .to_string()
    }

    #[test]
    fn code_to_token_url_matches_vendor_template() {
        let client = Client::new("wx123", "S3CRET");

        assert_eq!(
            url(
                &client,
                constants::OAUTH2_ACCESS_TOKEN_PATH,
                &client.code_to_token_query("C0DE")
            ),
            "https://api.weixin.qq.com/sns/oauth2/access_token?appid=wx123&secret=S3CRET&code=C0DE&grant_type=authorization_code"
        );
    }

    #[test]
    fn refresh_token_url_does_not_carry_secret() {
        let client = Client::new("wx123", "S3CRET");
        let url = url(
            &client,
            constants::OAUTH2_REFRESH_TOKEN_PATH,
            &client.refresh_token_query("R"),
        );

        assert_eq!(
            url,
            "https://api.weixin.qq.com/sns/oauth2/refresh_token?appid=wx123&grant_type=refresh_token&refresh_token=R"
        );
        assert!(!url.contains("S3CRET"));
    }

    #[test]
    fn builder_computes_expiry() {
        let builder: OAuthAccessTokenBuilder =
            serde_json::from_str(r#"{"access_token":"T","expires_in":7200,"openid":"O"}"#).unwrap();
        let token = builder.build().unwrap();

        assert_eq!(token.access_token(), "T");
        assert_eq!(token.expires_in(), 7200);
        assert_eq!(token.open_id(), "O");
        assert_eq!(token.refresh_token(), "");
        assert_eq!(token.union_id(), None);
        assert!(!token.is_expired());
        assert!(token.expired_at() > Utc::now() + Duration::seconds(7100));
    }

    #[test]
    fn short_lived_token_is_expired() {
        let builder: OAuthAccessTokenBuilder =
            serde_json::from_str(r#"{"access_token":"T","expires_in":60,"openid":"O"}"#).unwrap();

        assert!(builder.build().unwrap().is_expired());
    }

    #[test]
    fn debug_masks_tokens() {
        let builder: OAuthAccessTokenBuilder = serde_json::from_str(
            r#"{"access_token":"SECRET_T","expires_in":7200,"refresh_token":"SECRET_R","openid":"O"}"#,
        )
        .unwrap();
        let output = format!("{:?}", builder.build().unwrap());

        assert!(!output.contains("SECRET_T"));
        assert!(!output.contains("SECRET_R"));
        assert!(output.contains("O"));
    }

    #[test]
    fn out_of_range_expires_in_is_decode_error() {
        let builder: OAuthAccessTokenBuilder = serde_json::from_str(
            r#"{"access_token":"T","expires_in":9223372036854775807,"openid":"O"}"#,
        )
        .unwrap();

        let error = builder.build().unwrap_err();

        assert!(matches!(error, crate::error::Error::SerdeJson(_)));
        assert!(error.to_string().contains("expires_in out of range"));
    }

    #[test]
    fn lang_display() {
        assert_eq!(Lang::ZhCn.to_string(), "zh_CN");
        assert_eq!(Lang::ZhTw.to_string(), "zh_TW");
        assert_eq!(Lang::En.to_string(), "en");
        assert_eq!(Lang::default(), Lang::ZhCn);
    }
}
