//! 授权页地址构建模块
//!
//! 该模块只负责拼接授权页 URL，不发起任何网络请求。用户在浏览器中打开该地址并同意授权后，
//! 微信会携带 `code` 和 `state` 重定向到 `redirect_uri`，再由服务端通过
//! [`Client::code_to_token`](crate::Client::code_to_token) 换取 access_token。
//!
//! # 快速开始
//!
//! ```
//! use wechat_oauth::{oauth_url, open_platform_url};
//!
//! // 公众号静默授权
//! let url = oauth_url("wx123", "https://a.com/cb?x=1");
//! assert_eq!(
//!     url,
//!     "https://open.weixin.qq.com/connect/oauth2/authorize?appid=wx123&redirect_uri=https%3A%2F%2Fa.com%2Fcb%3Fx%3D1&response_type=code&scope=snsapi_base&state=110#wechat_redirect"
//! );
//!
//! // 开放平台扫码登录
//! let url = open_platform_url("wx123", "https://a.com/cb");
//! assert!(url.starts_with("https://open.weixin.qq.com/connect/qrconnect?"));
//! ```
//!
//! # 自定义 scope 与 state
//!
//! ```
//! use wechat_oauth::{AuthorizeUrl, Scope};
//!
//! let url = AuthorizeUrl::new("wx123", "https://a.com/cb", Scope::UserInfo)
//!     .state("csrf-token")
//!     .build();
//!
//! assert!(url.contains("scope=snsapi_userinfo&state=csrf-token#wechat_redirect"));
//! ```
//!
//! # 注意
//!
//! - `redirect_uri` 会按查询参数值进行百分号编码，空格编码为 `+`
//! - `appid` 原样拼接，不做任何校验

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use strum::Display;

use crate::constants;

/// 查询参数值中保持原样的字符：`A-Z a-z 0-9 - _ . ~`，空格单独处理
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b' ');

/// 空格编码为 `+`，其余保留字符编码为 `%XX`
fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE)
        .to_string()
        .replace(' ', "+")
}

/// 应用授权作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Scope {
    /// 静默授权，只能获取 openid
    #[strum(serialize = "snsapi_base")]
    Base,
    /// 弹出授权页，可获取昵称、头像等基本信息
    #[strum(serialize = "snsapi_userinfo")]
    UserInfo,
    /// 开放平台网站应用扫码登录
    #[strum(serialize = "snsapi_login")]
    Login,
}

impl Scope {
    fn end_point(self) -> &'static str {
        match self {
            Scope::Login => constants::QR_CONNECT_END_POINT,
            Scope::Base | Scope::UserInfo => constants::OAUTH2_AUTHORIZE_END_POINT,
        }
    }
}

/// 授权页地址构建器
#[derive(Debug, Clone)]
pub struct AuthorizeUrl {
    app_id: String,
    redirect_uri: String,
    scope: Scope,
    state: String,
}

impl AuthorizeUrl {
    /// 创建构建器，`state` 默认为 `110`
    pub fn new(app_id: impl Into<String>, redirect_uri: impl Into<String>, scope: Scope) -> Self {
        Self {
            app_id: app_id.into(),
            redirect_uri: redirect_uri.into(),
            scope,
            state: constants::DEFAULT_STATE.to_string(),
        }
    }

    /// 重定向后会带上的 state 参数，可用于防止 CSRF
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn build(&self) -> String {
        format!(
            "{}?appid={}&redirect_uri={}&response_type=code&scope={}&state={}#wechat_redirect",
            self.scope.end_point(),
            self.app_id,
            query_escape(&self.redirect_uri),
            self.scope,
            query_escape(&self.state),
        )
    }
}

/// 公众号网页授权页地址（`snsapi_base`）
pub fn oauth_url(app_id: &str, redirect_uri: &str) -> String {
    AuthorizeUrl::new(app_id, redirect_uri, Scope::Base).build()
}

/// 开放平台扫码登录页地址（`snsapi_login`）
pub fn open_platform_url(app_id: &str, redirect_uri: &str) -> String {
    AuthorizeUrl::new(app_id, redirect_uri, Scope::Login).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_url_matches_vendor_template() {
        assert_eq!(
            oauth_url("wx123", "https://a.com/cb?x=1"),
            "https://open.weixin.qq.com/connect/oauth2/authorize?appid=wx123&redirect_uri=https%3A%2F%2Fa.com%2Fcb%3Fx%3D1&response_type=code&scope=snsapi_base&state=110#wechat_redirect"
        );
    }

    #[test]
    fn open_platform_url_matches_vendor_template() {
        assert_eq!(
            open_platform_url("wx123", "https://a.com/cb?x=1"),
            "https://open.weixin.qq.com/connect/qrconnect?appid=wx123&redirect_uri=https%3A%2F%2Fa.com%2Fcb%3Fx%3D1&response_type=code&scope=snsapi_login&state=110#wechat_redirect"
        );
    }

    #[test]
    fn build_is_idempotent() {
        let first = oauth_url("wx123", "https://a.com/cb?x=1&y=中文");
        let second = oauth_url("wx123", "https://a.com/cb?x=1&y=中文");

        assert_eq!(first, second);
        assert!(first.contains("y%3D%E4%B8%AD%E6%96%87"));
    }

    #[test]
    fn app_id_is_not_escaped() {
        let url = oauth_url("wx 1", "https://a.com");

        assert!(url.contains("appid=wx 1&"));
    }

    #[test]
    fn unreserved_characters_are_kept() {
        assert_eq!(query_escape("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn space_is_plus_and_plus_is_escaped() {
        assert_eq!(query_escape("a b+c"), "a+b%2Bc");
        assert!(oauth_url("wx123", "https://a.com/cb?q=a b").contains("q%3Da+b&"));
    }

    #[test]
    fn custom_state_and_scope() {
        let url = AuthorizeUrl::new("wx123", "https://a.com/cb", Scope::UserInfo)
            .state("s&1")
            .build();

        assert_eq!(
            url,
            "https://open.weixin.qq.com/connect/oauth2/authorize?appid=wx123&redirect_uri=https%3A%2F%2Fa.com%2Fcb&response_type=code&scope=snsapi_userinfo&state=s%261#wechat_redirect"
        );
    }
}
