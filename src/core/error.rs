use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed data url")]
    DataUrl,

    #[error("storage: {0}")]
    Storage(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Rejections of user-entered form data. The messages are shown verbatim as toasts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("店名を入力してください")]
    MissingShopName,

    #[error("日付の形式が正しくありません: {0}")]
    InvalidDate(String),

    #[error("ニックネームを入力してください")]
    MissingNickname,
}
