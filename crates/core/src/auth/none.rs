use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that accepts all requests.
/// Must be explicitly configured - the system won't default to this.
///
/// Attribution still works: if the request names a user via `X-User`, that
/// user is used; otherwise the identity is anonymous.
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        match request.requested_user() {
            Some(user) => Ok(Identity {
                user_id: user.to_string(),
                method: "none".to_string(),
            }),
            None => Ok(Identity::anonymous()),
        }
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
