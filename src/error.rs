//! 微信 OAuth 错误处理模块
//!
//! 该模块定义了与微信网页授权、开放平台登录、小程序 code2Session 接口交互时
//! 可能遇到的所有错误类型。
//!
//! # 错误类型
//!
//! - [`Error`][]: 主要的错误枚举，包含所有可能的错误情况
//! - [`ErrorCode`]: 微信官方错误码的 Rust 枚举表示
//!
//! # 两类错误
//!
//! - 传输 / 解码错误：网络不可达、响应不是 JSON、JSON 缺少必要字段
//! - 微信业务错误：HTTP 200 但响应体中 `errcode` 不为 0，例如
//!   `{"errcode":40029,"errmsg":"invalid code"}`
//!
//! ```no_run
//! use wechat_oauth::{Client, error::ErrorCode};
//!
//! # async fn example() {
//! let client = Client::new("app_id", "secret");
//!
//! match client.code_to_token("code").await {
//!     Ok(token) => println!("openid: {}", token.open_id()),
//!     Err(e) if e.kind() == Some(ErrorCode::InvalidCode) => println!("code 无效"),
//!     Err(e) => println!("error: {}", e),
//! }
//! # }
//! ```
//!
//! # 错误转换
//!
//! - `reqwest::Error` → `Error::Reqwest`（去除 URL，避免泄露 secret / access_token）
//! - `serde_json::Error` → `Error::SerdeJson`
//! - `base64::DecodeError` → `Error::Base64Decode`
//! - `aes::cipher::InvalidLength` → `Error::AesInvalidLength`

use aes::cipher::InvalidLength as AesInvalidLength;
use aes::cipher::block_padding::UnpadError;
use base64::DecodeError as Base64DecodeError;
use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use strum::{Display, FromRepr};

/// 微信 OAuth SDK 错误枚举
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 微信接口返回了非 0 的 `errcode`
    #[error("wechat api error {code}: {message}")]
    Api { code: i32, message: String },

    /// 客户端配置错误
    #[error("config error: {0}")]
    Config(String),

    /// AES 解密时数据填充错误
    #[error("unpad error: {0}")]
    Unpad(UnpadError),

    /// AES 加解密长度错误
    #[error("aes invalid length: {0}")]
    AesInvalidLength(#[from] AesInvalidLength),

    /// Base64 解码错误
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] Base64DecodeError),

    /// HTTP 请求错误，已去除其中带有密钥的 URL
    #[error("reqwest: {0}")]
    Reqwest(ReqwestError),

    /// JSON 反序列化错误，或 `errcode` 为 0 但缺少必要字段
    #[error("json error: {0}")]
    SerdeJson(#[from] SerdeJsonError),

    /// 非 2xx 的 HTTP 响应
    #[error("internal error: {0}")]
    InternalServer(String),
}

impl From<UnpadError> for Error {
    fn from(error: UnpadError) -> Self {
        Error::Unpad(error)
    }
}

impl From<ReqwestError> for Error {
    fn from(error: ReqwestError) -> Self {
        Error::Reqwest(error.without_url())
    }
}

impl Error {
    /// 微信返回的原始错误码，非业务错误时为 `None`
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 微信返回的错误信息
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// 将错误码映射到已知的 [`ErrorCode`]，未收录的错误码返回 `None`
    pub fn kind(&self) -> Option<ErrorCode> {
        self.code().and_then(ErrorCode::from_repr)
    }
}

/// 微信官方错误码枚举
///
/// 收录了网页授权与 code2Session 相关接口的常见错误码，`Display` 输出官方描述。
///
/// [微信官方文档 - 全局返回码说明](https://developers.weixin.qq.com/doc/offiaccount/Getting_Started/Global_Return_Code.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(i32)]
pub enum ErrorCode {
    #[strum(serialize = "系统繁忙，此时请开发者稍候再试")]
    System = -1,
    #[strum(
        serialize = "获取 access_token 时 AppSecret 错误，或者 access_token 无效。请开发者认真比对 AppSecret 的正确性，或查看是否正在为恰当的公众号调用接口"
    )]
    InvalidCredential = 40001,
    #[strum(serialize = "不合法的 OpenID ，请开发者确认 OpenID 是否已关注公众号，或是否是其他公众号的 OpenID")]
    InvalidOpenId = 40003,
    #[strum(serialize = "不合法的 AppID ，请开发者检查 AppID 的正确性，避免异常字符，注意大小写")]
    InvalidAppId = 40013,
    #[strum(serialize = "不合法的 access_token ，请开发者认真比对 access_token 的有效性")]
    InvalidAccessToken = 40014,
    #[strum(serialize = "code 无效")]
    InvalidCode = 40029,
    #[strum(serialize = "不合法的 refresh_token")]
    InvalidRefreshToken = 40030,
    #[strum(serialize = "无效的appsecret，请检查appsecret的正确性")]
    InvalidSecret = 40125,
    #[strum(serialize = "code 已被使用")]
    CodeBeenUsed = 40163,
    #[strum(serialize = "将ip添加到ip白名单列表即可")]
    ForbiddenIp = 40164,
    #[strum(serialize = "高风险等级用户，小程序登录拦截 。风险等级详见用户安全解方案")]
    CodeBlocked = 40226,
    #[strum(serialize = "缺少 access token 参数")]
    MissingAccessToken = 41001,
    #[strum(serialize = "缺少 appid 参数")]
    MissingAppId = 41002,
    #[strum(serialize = "缺少 secret 参数")]
    MissingSecret = 41004,
    #[strum(serialize = "缺少 code 参数")]
    MissingCode = 41008,
    #[strum(serialize = "access_token 超时，请检查 access_token 的有效期")]
    AccessTokenExpired = 42001,
    #[strum(serialize = "refresh_token 超时")]
    RefreshTokenExpired = 42002,
    #[strum(serialize = "oauth_code 超时")]
    CodeExpired = 42003,
    #[strum(serialize = "API 调用太频繁，请稍候再试")]
    RateLimitExceeded = 45011,
    #[strum(serialize = "用户未授权该 api")]
    Unauthorized = 48001,
    #[strum(serialize = "session_key is not existed or expired")]
    SessionKeyNotExistedOrExpired = 87007,
    #[strum(serialize = "invalid sig_method")]
    InvalidSignatureMethod = 87008,
    #[strum(serialize = "无效的签名")]
    InvalidSignature = 87009,
}
