//! `wechat_oauth` - 微信网页授权与小程序登录封装库
//!
//! 为微信公众号网页授权、开放平台扫码登录、小程序 / 企业微信小程序 code2Session
//! 提供的 Rust 封装库。
//!
//! ## 核心特性
//!
//! - **授权页地址**: 纯函数拼接授权页 URL，自动对回调地址进行编码。
//! - **code 换取凭证**: 网页授权 access_token、小程序会话、企业微信小程序会话。
//! - **错误码检查**: HTTP 200 但 `errcode` 非 0 的响应统一转换为错误。
//! - **并发性**: 客户端只读持有凭证，可以在并发环境中使用。
//!
//! ## 快速开始
//!
//! ```no_run
//! use wechat_oauth::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("your_app_id", "your_app_secret");
//!
//!     println!("{}", client.oauth_url("https://example.com/callback"));
//!
//!     let session = client.login("code_from_wx_login").await?;
//!     println!("用户OpenID: {}", session.open_id());
//!
//!     Ok(())
//! }
//! ```
//!
//! 本库不缓存任何 access_token，也不做重试，调用方按需自行处理。

mod authorize;
mod client;
mod response;
mod session;

pub mod constants;
pub mod error;
pub mod oauth;

pub type Result<T> = std::result::Result<T, error::Error>;
pub use authorize::{AuthorizeUrl, Scope, oauth_url, open_platform_url};
pub use client::{Client, ClientBuilder};
pub use oauth::{OAuthAccessToken, UserInfo};
pub use session::{CorpSession, Session};
