use std::sync::Arc;
use std::time::Duration;

use crate::application::effects::Effects;
use crate::application::messages::MessageService;
use crate::application::notifications::NotificationService;
use crate::application::posts::PostService;
use crate::application::reviews::ReviewService;
use crate::application::users::UserService;
use crate::cache::{CacheConfig, InvalidationBus, ResponseStore};
use crate::config::RealtimeSettings;
use crate::infra::identity::{SessionVerifier, UserIdVerifier};
use crate::infra::memory::MemoryStore;
use crate::realtime::{ConnectionRegistry, RealtimeFanout};

/// Everything the router needs, built once at startup.
pub struct AppComponents {
    pub store: Arc<MemoryStore>,
    pub responses: Arc<dyn ResponseStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub cache: CacheConfig,
    pub realtime: RealtimeSettings,
}

#[derive(Clone)]
pub struct RealtimeOptions {
    pub connection_buffer: usize,
    pub handshake_timeout: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: UserService,
    pub reviews: ReviewService,
    pub notifications: NotificationService,
    pub messages: MessageService,
    pub responses: Arc<dyn ResponseStore>,
    pub cache: CacheConfig,
    pub registry: Arc<ConnectionRegistry>,
    pub verifier: Arc<dyn SessionVerifier>,
    pub realtime: RealtimeOptions,
}

impl AppState {
    pub fn from_components(components: AppComponents) -> Self {
        let AppComponents {
            store,
            responses,
            registry,
            cache,
            realtime,
        } = components;

        let effects = Effects::new(
            InvalidationBus::new(responses.clone()),
            RealtimeFanout::new(registry.clone()),
            store.clone(),
        );

        Self {
            posts: PostService::new(store.clone(), store.clone(), effects.clone()),
            users: UserService::new(store.clone(), effects.clone()),
            reviews: ReviewService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                effects.clone(),
            ),
            notifications: NotificationService::new(store.clone(), effects.clone()),
            messages: MessageService::new(store.clone(), store.clone(), effects),
            verifier: Arc::new(UserIdVerifier::new(store)),
            responses,
            cache,
            registry,
            realtime: RealtimeOptions {
                connection_buffer: realtime.connection_buffer.get(),
                handshake_timeout: realtime.handshake_timeout,
            },
        }
    }
}
