//! 小程序登录会话模块
//!
//! 小程序前端通过 `wx.login()` 获取临时登录凭证 code，服务端使用 code 换取会话：
//!
//! - 普通小程序：使用 AppID + AppSecret 调用 `sns/jscode2session`，得到 [`Session`]
//! - 企业微信小程序：使用调用方已持有的企业 access_token 调用
//!   `cgi-bin/miniprogram/jscode2session`，得到 [`CorpSession`]，AppSecret 不会被发送
//!
//! 两种会话字段不同，因此分别建模，而不是共用一个大部分字段为空的结构体。

use aes::{
    Aes128,
    cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use cbc::Decryptor;
use hex::encode;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};
use serde_json::from_slice;
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::{Result, client::Client, constants};

type Aes128CbcDec = Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// 普通小程序登录会话
#[derive(Serialize, Deserialize, Clone)]
pub struct Session {
    open_id: String,
    session_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    union_id: Option<String>,
}

impl Session {
    pub fn open_id(&self) -> &str {
        &self.open_id
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn union_id(&self) -> Option<&str> {
        self.union_id.as_deref()
    }

    /// 解密 `wx.getUserInfo()` 等开放数据，使用的是 AES-128-CBC 算法，数据采用PKCS#7填充。
    ///
    /// 解密后的 JSON 反序列化为调用方指定的类型。
    /// https://developers.weixin.qq.com/miniprogram/dev/framework/open-ability/signature.html
    ///
    /// ```no_run
    /// use serde::Deserialize;
    /// use wechat_oauth::Client;
    ///
    /// #[derive(Deserialize)]
    /// #[serde(rename_all = "camelCase")]
    /// struct Profile {
    ///     nick_name: String,
    /// }
    ///
    /// # async fn example(encrypted_data: &str, iv: &str) -> wechat_oauth::Result<()> {
    /// let client = Client::new("app_id", "secret");
    /// let session = client.login("code").await?;
    ///
    /// let profile = session.decrypt::<Profile>(encrypted_data, iv)?;
    /// println!("昵称: {}", profile.nick_name);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, encrypted_data, iv))]
    pub fn decrypt<T: DeserializeOwned>(&self, encrypted_data: &str, iv: &str) -> Result<T> {
        debug!("encrypted_data: {}", encrypted_data);
        debug!("iv: {}", iv);

        let key = STANDARD.decode(self.session_key.as_bytes())?;
        let iv = STANDARD.decode(iv.as_bytes())?;
        let decryptor = Aes128CbcDec::new_from_slices(&key, &iv)?;

        let encrypted_data = STANDARD.decode(encrypted_data.as_bytes())?;

        let buffer = decryptor.decrypt_padded_vec_mut::<Pkcs7>(&encrypted_data)?;

        Ok(from_slice::<T>(&buffer)?)
    }
}

impl std::fmt::Debug for Session {
    // 为了安全，不打印 session_key
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open_id", &self.open_id)
            .field("session_key", &"********")
            .field("union_id", &self.union_id)
            .finish()
    }
}

#[derive(Deserialize)]
pub(crate) struct SessionBuilder {
    #[serde(rename = "openid")]
    open_id: String,
    session_key: String,
    #[serde(rename = "unionid")]
    union_id: Option<String>,
}

impl SessionBuilder {
    pub(crate) fn build(self) -> Session {
        Session {
            open_id: self.open_id,
            session_key: self.session_key,
            union_id: self.union_id,
        }
    }
}

/// 企业微信小程序登录会话
#[derive(Serialize, Deserialize, Clone)]
pub struct CorpSession {
    corp_id: String,
    user_id: String,
    session_key: String,
}

impl CorpSession {
    /// 用户所属企业的 corpid
    pub fn corp_id(&self) -> &str {
        &self.corp_id
    }

    /// 用户在企业内的 UserID
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }
}

impl std::fmt::Debug for CorpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpSession")
            .field("corp_id", &self.corp_id)
            .field("user_id", &self.user_id)
            .field("session_key", &"********")
            .finish()
    }
}

#[derive(Deserialize)]
pub(crate) struct CorpSessionBuilder {
    #[serde(rename = "corpid")]
    corp_id: String,
    #[serde(rename = "userid")]
    user_id: String,
    session_key: String,
}

impl CorpSessionBuilder {
    pub(crate) fn build(self) -> CorpSession {
        CorpSession {
            corp_id: self.corp_id,
            user_id: self.user_id,
            session_key: self.session_key,
        }
    }
}

impl Client {
    /// 用户登录凭证校验
    ///
    /// 通过微信前端获取的临时登录凭证 code，换取用户的唯一标识 OpenID 和会话密钥。
    ///
    /// # 参数
    ///
    /// - `code`: 微信前端通过 `wx.login()` 获取的临时登录凭证
    ///
    /// # 错误
    ///
    /// - 网络错误
    /// - 微信 API 返回错误
    /// - 响应解析错误，包括 `errcode` 为 0 但缺少 `openid` 或 `session_key`
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use wechat_oauth::Client;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = Client::new("app_id", "secret");
    ///     let session = client.login("0816abc123def456").await?;
    ///
    ///     println!("用户OpenID: {}", session.open_id());
    ///     Ok(())
    /// }
    /// ```
    ///
    /// [微信官方文档 - code2Session](https://developers.weixin.qq.com/miniprogram/dev/OpenApiDoc/user-login/code2Session.html)
    #[instrument(skip(self, code))]
    pub async fn login(&self, code: &str) -> Result<Session> {
        debug!("code: {}", code);

        let session = self
            .get_json::<SessionBuilder>(
                &self.api_url(constants::JSCODE2SESSION_PATH),
                &self.login_query(code),
            )
            .await?
            .build();

        debug!("session: {:#?}", session);

        Ok(session)
    }

    /// 企业微信小程序登录凭证校验
    ///
    /// # 参数
    ///
    /// - `access_token`: 调用方已持有的企业微信 access_token
    /// - `code`: 企业微信小程序通过 `wx.qy.login()` 获取的 code
    ///
    /// [企业微信文档 - code2Session](https://developer.work.weixin.qq.com/document/path/91507)
    #[instrument(skip(self, access_token, code))]
    pub async fn corp_login(&self, access_token: &str, code: &str) -> Result<CorpSession> {
        debug!("code: {}", code);

        let session = self
            .get_json::<CorpSessionBuilder>(
                &self.corp_api_url(constants::CORP_JSCODE2SESSION_PATH),
                &corp_login_query(access_token, code),
            )
            .await?
            .build();

        debug!("corp session: {:#?}", session);

        Ok(session)
    }

    /// 检查登录态是否过期，有效时返回 `Ok(())`
    ///
    /// 签名为以 session_key 为密钥对空字符串做 HMAC-SHA256 后的十六进制串。
    /// https://developers.weixin.qq.com/miniprogram/dev/OpenApiDoc/user-login/checkSessionKey.html
    #[instrument(skip(self, access_token, session_key))]
    pub async fn check_session_key(
        &self,
        access_token: &str,
        open_id: &str,
        session_key: &str,
    ) -> Result<()> {
        let signature = signature(session_key)?;

        self.get_json::<IgnoredAny>(
            &self.api_url(constants::CHECK_SESSION_KEY_PATH),
            &check_session_key_query(access_token, open_id, &signature),
        )
        .await?;

        Ok(())
    }

    fn login_query<'a>(&'a self, code: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("appid", self.app_id()),
            ("secret", self.secret()),
            ("js_code", code),
            ("grant_type", "authorization_code"),
        ]
    }
}

fn corp_login_query<'a>(access_token: &'a str, code: &'a str) -> [(&'a str, &'a str); 3] {
    [
        ("access_token", access_token),
        ("js_code", code),
        ("grant_type", "authorization_code"),
    ]
}

fn check_session_key_query<'a>(
    access_token: &'a str,
    open_id: &'a str,
    signature: &'a str,
) -> [(&'a str, &'a str); 4] {
    [
        ("access_token", access_token),
        ("signature", signature),
        ("openid", open_id),
        ("sig_method", "hmac_sha256"),
    ]
}

/// 以 session_key 为密钥对空字符串做 HMAC-SHA256，输出十六进制串
fn signature(session_key: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(session_key.as_bytes())?;
    mac.update(b"");

    Ok(encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;
    use serde_json::Value;

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    const KEY: &[u8; 16] = b"0123456789abcdef";
    const IV: &[u8; 16] = b"fedcba9876543210";

    fn session() -> Session {
        Session {
            open_id: "O".into(),
            session_key: STANDARD.encode(KEY),
            union_id: None,
        }
    }

    fn encrypt(plain: &[u8]) -> String {
        let buffer = Aes128CbcEnc::new_from_slices(KEY, IV)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plain);

        STANDARD.encode(buffer)
    }

    fn url(request: reqwest::RequestBuilder) -> String {
        request.build().unwrap().url().to_string()
    }

    #[test]
    fn login_url_matches_vendor_template() {
        let client = Client::new("wx123", "S3CRET");
        let url = url(client.request(
            &client.api_url(constants::JSCODE2SESSION_PATH),
            &client.login_query("C0DE"),
        ));

        assert_eq!(
            url,
            "https://api.weixin.qq.com/sns/jscode2session?appid=wx123&secret=S3CRET&js_code=C0DE&grant_type=authorization_code"
        );
    }

    #[test]
    fn corp_login_url_uses_access_token_not_secret() {
        let client = Client::new("ww123", "S3CRET");
        let url = url(client.request(
            &client.corp_api_url(constants::CORP_JSCODE2SESSION_PATH),
            &corp_login_query("CORP_TOKEN", "C0DE"),
        ));

        assert_eq!(
            url,
            "https://qyapi.weixin.qq.com/cgi-bin/miniprogram/jscode2session?access_token=CORP_TOKEN&js_code=C0DE&grant_type=authorization_code"
        );
        assert!(!url.contains("S3CRET"));
    }

    #[test]
    fn signature_is_hmac_sha256_of_empty_message() {
        assert_eq!(
            signature("key").unwrap(),
            "5d5d139563c95b5967b9bd9a8c9b233a9dedb45072794cd232dc1b74832607d0"
        );
    }

    #[test]
    fn check_session_key_url_matches_vendor_template() {
        let client = Client::new("wx123", "S3CRET");
        let url = url(client.request(
            &client.api_url(constants::CHECK_SESSION_KEY_PATH),
            &check_session_key_query("T", "O", "SIG"),
        ));

        assert_eq!(
            url,
            "https://api.weixin.qq.com/wxa/checksession?access_token=T&signature=SIG&openid=O&sig_method=hmac_sha256"
        );
    }

    #[test]
    fn decrypt_user_data() {
        let encrypted = encrypt(br#"{"openId":"O","watermark":{"appid":"wx123","timestamp":1}}"#);

        let value = session()
            .decrypt::<Value>(&encrypted, &STANDARD.encode(IV))
            .unwrap();

        assert_eq!(value["openId"], "O");
        assert_eq!(value["watermark"]["appid"], "wx123");
    }

    #[test]
    fn decrypt_rejects_bad_base64() {
        let error = session()
            .decrypt::<Value>("not base64!", &STANDARD.encode(IV))
            .unwrap_err();

        assert!(matches!(error, crate::error::Error::Base64Decode(_)));
    }

    #[test]
    fn decrypt_rejects_short_iv() {
        let encrypted = encrypt(b"{}");

        let error = session()
            .decrypt::<Value>(&encrypted, &STANDARD.encode(b"short"))
            .unwrap_err();

        assert!(matches!(error, crate::error::Error::AesInvalidLength(_)));
    }

    #[test]
    fn debug_masks_session_key() {
        let output = format!("{:?}", session());

        assert!(!output.contains(&STANDARD.encode(KEY)));
        assert!(output.contains("********"));
    }
}
