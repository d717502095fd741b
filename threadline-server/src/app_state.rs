//! Shared application state handed to every handler via an `Extension`.

use sqlx::PgPool;
use std::sync::Arc;

use shared::config::Config;

use crate::auth::credentials::Credentials;
use crate::services::chat_service::ChatService;
use crate::services::completion::CompletionClient;
use crate::services::mailer::Mailer;
use crate::services::thread_store::ThreadStore;
use crate::services::user_service::UserService;
use crate::services::user_store::UserStore;

pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ThreadStore>,
    pub chat: ChatService,
    pub users: UserService,
    pub credentials: Credentials,
    /// Present only when a database URL was configured; health probes use it.
    pub pool: Option<PgPool>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ThreadStore>,
        user_store: Arc<dyn UserStore>,
        completion: Arc<dyn CompletionClient>,
        mailer: Arc<dyn Mailer>,
        pool: Option<PgPool>,
    ) -> Self {
        let credentials = Credentials::new(&config.auth.token_secret);
        Self {
            chat: ChatService::new(store.clone(), completion),
            users: UserService::new(user_store, mailer, credentials.clone(), config.clone()),
            credentials,
            config,
            store,
            pool,
        }
    }
}
