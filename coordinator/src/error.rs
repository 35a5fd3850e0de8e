use payloads::ClientError;
use payloads::envelope::UNKNOWN_ERROR;

/// Why a remote read did not produce data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request was superseded or its owner went away. Never surfaced.
    #[error("request cancelled")]
    Cancelled,
    /// The backend answered with an error.
    #[error("{}", server_text(*.status, .message.as_deref()))]
    Server {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("{0}")]
    Network(String),
    /// The response did not have the expected shape.
    #[error("{0}")]
    Decode(String),
}

fn server_text(status: Option<u16>, message: Option<&str>) -> String {
    match (message, status) {
        (Some(message), _) => message.to_string(),
        (None, Some(status)) => format!("Request failed with status {status}"),
        (None, None) => UNKNOWN_ERROR.to_string(),
    }
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message to show the user: the server's message if it sent one, then
    /// the error's own description, then a fixed fallback.
    pub fn user_message(&self) -> String {
        let text = match self {
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            text
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        match &e {
            ClientError::APIError(status, _) => Self::Server {
                status: Some(status.as_u16()),
                message: e.server_message().map(str::to_string),
            },
            ClientError::Network(_) => Self::Network(e.to_string()),
            ClientError::Decode(message) => Self::Decode(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payloads::StatusCode;

    #[test]
    fn server_message_wins() {
        let e = FetchError::from(ClientError::APIError(
            StatusCode::FORBIDDEN,
            "Acesso negado".into(),
        ));
        assert_eq!(e.user_message(), "Acesso negado");
    }

    #[test]
    fn status_only_falls_back_to_generic_message() {
        let e = FetchError::from(ClientError::APIError(
            StatusCode::INTERNAL_SERVER_ERROR,
            String::new(),
        ));
        assert_eq!(
            e,
            FetchError::Server {
                status: Some(500),
                message: None
            }
        );
        assert_eq!(e.user_message(), "Request failed with status 500");
    }

    #[test]
    fn empty_text_falls_back_to_unknown() {
        assert_eq!(FetchError::Network(" ".into()).user_message(), UNKNOWN_ERROR);
        assert_eq!(
            FetchError::Server {
                status: None,
                message: None
            }
            .user_message(),
            UNKNOWN_ERROR
        );
    }
}
