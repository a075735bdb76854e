//! Shared application state handed to every router.

use crate::auth::middleware::BearerAuthenticator;
use crate::auth::service::AuthService;
use crate::config::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub authenticator: Arc<BearerAuthenticator>,
}
