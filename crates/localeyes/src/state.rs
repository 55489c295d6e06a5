//! Application state shared by all request handlers.
//!
//! The state owns the services, the token signing state and the alert
//! publisher. Services share one store handle, created once at startup.

use std::sync::Arc;

use axum::extract::FromRef;
use localeyes_auth::{AuthConfig, AuthState};
use localeyes_core::storage::TableStore;

use crate::alerts::{AlertPublisher, LogAlertPublisher};
use crate::config::{Config, StorageBackend};
use crate::mailer::{LogMailer, OtpMailer, SmtpMailer};
use crate::repositories::{
    AnswerRepository, OtpRepository, PostRepository, QuestionRepository, UserRepository,
};
use crate::services::{AccountService, AdminService, PostService};
use crate::storage::InMemoryStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub admin: AdminService,
    pub auth: AuthState,
    pub alerts: Arc<dyn AlertPublisher>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wires repositories and services over `store`.
    pub fn build(
        store: Arc<dyn TableStore>,
        auth: AuthState,
        mailer: Arc<dyn OtpMailer>,
        alerts: Arc<dyn AlertPublisher>,
    ) -> Self {
        let users = UserRepository::new(store.clone());
        let posts = PostRepository::new(store.clone());
        let questions = QuestionRepository::new(store.clone());
        let answers = AnswerRepository::new(store.clone());
        let otps = OtpRepository::new(store);

        Self {
            accounts: AccountService::new(
                users.clone(),
                posts.clone(),
                otps,
                mailer,
                auth.clone(),
            ),
            posts: PostService::new(posts.clone(), questions.clone(), answers.clone()),
            admin: AdminService::new(
                users,
                posts,
                questions,
                answers,
                &auth.config.admin_username,
            ),
            auth,
            alerts,
        }
    }

    /// Creates the state for the configured backends.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let auth = AuthState::new(AuthConfig::new(&config.secret, &config.admin_username));

        Ok(Self::build(
            store(config).await?,
            auth,
            mailer(config)?,
            alerts(config).await,
        ))
    }

    /// State over an empty in-memory store, for tests and local runs.
    pub fn in_memory(auth: AuthConfig, mailer: Arc<dyn OtpMailer>) -> Self {
        Self::build(
            Arc::new(InMemoryStore::new()),
            AuthState::new(auth),
            mailer,
            Arc::new(LogAlertPublisher),
        )
    }
}

async fn store(config: &Config) -> anyhow::Result<Arc<dyn TableStore>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "dynamodb")]
        StorageBackend::DynamoDb => {
            let store = crate::storage::DynamoDbStore::connect(
                &config.dynamo_region,
                config.endpoint_url.as_deref(),
                &config.table_name,
                &config.index_name,
            )
            .await;
            tracing::info!(
                region = %config.dynamo_region,
                table = %config.table_name,
                index = %config.index_name,
                "Connected to DynamoDB"
            );
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamodb"))]
        StorageBackend::DynamoDb => {
            anyhow::bail!("STORAGE_BACKEND=dynamodb requires the 'dynamodb' feature")
        }
    }
}

fn mailer(config: &Config) -> anyhow::Result<Arc<dyn OtpMailer>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using the logging mailer; password reset codes are not sent");
            Ok(Arc::new(LogMailer::new(&config.smtp)))
        }
        StorageBackend::DynamoDb => {
            let mailer = SmtpMailer::new(&config.smtp)?;
            tracing::info!(
                server = %config.smtp.server,
                port = config.smtp.port,
                "Sending password reset codes over SMTP"
            );
            Ok(Arc::new(mailer))
        }
    }
}

async fn alerts(config: &Config) -> Arc<dyn AlertPublisher> {
    #[cfg(feature = "dynamodb")]
    if let Some(topic_arn) = &config.sns_topic_arn {
        tracing::info!(%topic_arn, region = %config.sns_region, "Publishing alerts to SNS");
        return Arc::new(
            crate::alerts::SnsAlertPublisher::connect(&config.sns_region, topic_arn).await,
        );
    }

    if config.sns_topic_arn.is_some() {
        tracing::warn!("SNS_TOPIC_ARN is set but SNS support is not compiled in");
    }
    Arc::new(LogAlertPublisher)
}
