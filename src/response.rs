use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{Result, error::Error};

/// 微信接口响应中内嵌的错误状态，成功的响应通常不带这两个字段
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    errcode: i32,
    #[serde(default)]
    errmsg: String,
}

impl Status {
    pub(crate) fn check(self) -> Result<()> {
        if self.errcode == 0 {
            Ok(())
        } else {
            Err(Error::Api {
                code: self.errcode,
                message: self.errmsg,
            })
        }
    }
}

/// 先检查 `errcode`，再将同一响应体解码为目标类型
///
/// `errcode` 为 0 但缺少必要字段时返回 [`Error::SerdeJson`]。
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let status = serde_json::from_slice::<Status>(body)?;

    debug!("status: {:?}", status);

    status.check()?;

    Ok(serde_json::from_slice::<T>(body)?)
}
