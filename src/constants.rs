//! 微信 OAuth API 端点常量模块
//!
//! 授权页地址只会被拼接后交给浏览器跳转，因此只有固定的开放平台域名；
//! 需要服务端请求的接口拆分为域名和路径，便于测试时替换域名。
//!
//! # API 分类
//!
//! ## 授权页
//!
//! - [`OAUTH2_AUTHORIZE_END_POINT`] - 公众号网页授权
//! - [`QR_CONNECT_END_POINT`] - 开放平台扫码登录
//!
//! ## 网页授权
//!
//! - [`OAUTH2_ACCESS_TOKEN_PATH`] - 通过 code 换取网页授权 access_token
//! - [`OAUTH2_REFRESH_TOKEN_PATH`] - 刷新网页授权 access_token
//! - [`OAUTH2_AUTH_PATH`] - 检验网页授权 access_token 是否有效
//! - [`USER_INFO_PATH`] - 拉取用户信息
//!
//! ## 小程序登录
//!
//! - [`JSCODE2SESSION_PATH`] - 小程序 code2Session
//! - [`CORP_JSCODE2SESSION_PATH`] - 企业微信小程序 code2Session
//! - [`CHECK_SESSION_KEY_PATH`] - 检验登录态

/// 公众号网页授权页
///
/// [网页授权](https://developers.weixin.qq.com/doc/offiaccount/OA_Web_Apps/Wechat_webpage_authorization.html)
pub const OAUTH2_AUTHORIZE_END_POINT: &str = "https://open.weixin.qq.com/connect/oauth2/authorize";

/// 开放平台网站应用扫码登录页
///
/// [网站应用微信登录](https://developers.weixin.qq.com/doc/oplatform/Website_App/WeChat_Login/Wechat_Login.html)
pub const QR_CONNECT_END_POINT: &str = "https://open.weixin.qq.com/connect/qrconnect";

/// 微信公众平台 / 小程序服务端接口域名
pub const API_BASE_URL: &str = "https://api.weixin.qq.com";

/// 企业微信服务端接口域名
pub const CORP_API_BASE_URL: &str = "https://qyapi.weixin.qq.com";

/// 通过 code 换取网页授权 access_token
pub const OAUTH2_ACCESS_TOKEN_PATH: &str = "/sns/oauth2/access_token";

/// 刷新网页授权 access_token
pub const OAUTH2_REFRESH_TOKEN_PATH: &str = "/sns/oauth2/refresh_token";

/// 检验网页授权 access_token 是否有效
pub const OAUTH2_AUTH_PATH: &str = "/sns/auth";

/// 拉取用户信息（需 scope 为 snsapi_userinfo）
pub const USER_INFO_PATH: &str = "/sns/userinfo";

/// 小程序登录凭证校验
///
/// [code2Session](https://developers.weixin.qq.com/miniprogram/dev/OpenApiDoc/user-login/code2Session.html)
pub const JSCODE2SESSION_PATH: &str = "/sns/jscode2session";

/// 企业微信小程序登录凭证校验
///
/// [code2Session](https://developer.work.weixin.qq.com/document/path/91507)
pub const CORP_JSCODE2SESSION_PATH: &str = "/cgi-bin/miniprogram/jscode2session";

/// 检验登录态
///
/// [检验登录态](https://developers.weixin.qq.com/miniprogram/dev/OpenApiDoc/user-login/checkSessionKey.html)
pub const CHECK_SESSION_KEY_PATH: &str = "/wxa/checksession";

/// 授权页默认携带的 state
pub const DEFAULT_STATE: &str = "110";
