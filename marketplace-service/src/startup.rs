use axum::Router;
use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{MarketplaceConfig, StoreBackend};
use crate::services::{
    CaptchaVerifier, EmailProvider, InMemoryStore, LocalStorage, MongoDb, RecaptchaVerifier,
    Repositories, SmtpProvider, StaticCaptchaVerifier, Storage,
};
use crate::{build_router, AppState};

/// Stores and outbound providers the application is assembled from.
pub struct Dependencies {
    pub repositories: Repositories,
    pub email: Arc<dyn EmailProvider>,
    pub captcha: Arc<dyn CaptchaVerifier>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    pub async fn build(config: MarketplaceConfig) -> Result<Self, AppError> {
        let repositories = match config.store.backend {
            StoreBackend::Mongo => {
                let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Repositories::mongo(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Repositories::in_memory(InMemoryStore::new())
            }
        };

        let email = SmtpProvider::new(config.smtp.clone()).map_err(|e| {
            tracing::error!("Failed to initialize SMTP provider: {}", e);
            AppError::ConfigError(anyhow::anyhow!("SMTP configuration error: {}", e))
        })?;
        if !email.is_enabled() {
            tracing::warn!("SMTP disabled; booking emails will not be delivered");
        }

        let captcha: Arc<dyn CaptchaVerifier> = if config.recaptcha.enabled {
            Arc::new(RecaptchaVerifier::new(&config.recaptcha).map_err(AppError::ConfigError)?)
        } else {
            tracing::warn!("reCAPTCHA disabled; every signup and login token is accepted");
            Arc::new(StaticCaptchaVerifier::allow_any())
        };

        Self::build_with(
            config,
            Dependencies {
                repositories,
                email: Arc::new(email),
                captcha,
            },
        )
        .await
    }

    /// Bind the listener and assemble the router over explicit dependencies.
    pub async fn build_with(
        config: MarketplaceConfig,
        deps: Dependencies,
    ) -> Result<Self, AppError> {
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.uploads.dir).await.map_err(|e| {
                tracing::error!(
                    "Failed to initialize upload storage at {}: {}",
                    config.uploads.dir,
                    e
                );
                e
            })?,
        );

        let state = AppState::new(
            config.clone(),
            deps.repositories,
            storage,
            deps.email,
            deps.captcha,
        );
        let router = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
    }
}
