use serde::{Deserialize, de::DeserializeOwned};

use super::error::ApiError;

/// Generic vendor response envelope.
///
/// The cloud reports failures in the body while still answering HTTP 200:
/// `status` is `"0"` on success and an error code otherwise. The payload is
/// kept as a raw value so that a failed call never trips over a missing
/// `data` shape.
#[derive(Deserialize)]
pub struct Response {
    status: String,

    message: Option<String>,

    #[serde(default)]
    data: serde_json::Value,
}

impl Response {
    const STATUS_OK: &'static str = "0";

    /// Status reported when the session token is no longer accepted.
    const STATUS_TOKEN_REJECTED: &'static str = "100";

    pub fn into_result<D: DeserializeOwned>(self) -> Result<D, ApiError> {
        match self.status.as_str() {
            Self::STATUS_OK => Ok(serde_json::from_value(self.data)?),
            Self::STATUS_TOKEN_REJECTED => Err(ApiError::AuthExpired),
            _ => Err(ApiError::Cloud {
                status: self.status,
                message: self.message.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_success_envelope_ok() -> Result {
        // language=JSON
        const RESPONSE: &str =
            r#"{"status": "0", "message": "success", "data": {"token": "deadbeef"}}"#;

        #[derive(Deserialize)]
        struct Data {
            token: String,
        }

        let data: Data = serde_json::from_str::<Response>(RESPONSE)?.into_result()?;
        assert_eq!(data.token, "deadbeef");
        Ok(())
    }

    #[test]
    fn test_rejected_token_maps_to_auth_expired() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"status": "100", "message": "token verify error"}"#;

        let error = serde_json::from_str::<Response>(RESPONSE)?
            .into_result::<serde_json::Value>()
            .unwrap_err();
        assert!(matches!(error, ApiError::AuthExpired));
        Ok(())
    }

    #[test]
    fn test_vendor_error_carries_status_and_message() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"status": "3", "message": "No Permission"}"#;

        let error = serde_json::from_str::<Response>(RESPONSE)?
            .into_result::<serde_json::Value>()
            .unwrap_err();
        assert!(
            matches!(error, ApiError::Cloud { ref status, ref message } if status == "3" && message == "No Permission")
        );
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_maps_to_malformed() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"status": "0", "message": "success", "data": []}"#;

        #[derive(Debug, Deserialize)]
        struct Data {
            #[expect(dead_code)]
            token: String,
        }

        let error =
            serde_json::from_str::<Response>(RESPONSE)?.into_result::<Data>().unwrap_err();
        assert!(matches!(error, ApiError::MalformedResponse(_)));
        Ok(())
    }
}
