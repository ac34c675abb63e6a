use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("token malformed or signature invalid")]
    Invalid,

    #[error("token has wrong scope for this operation")]
    WrongScope,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}
