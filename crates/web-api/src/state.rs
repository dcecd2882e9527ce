use std::sync::Arc;

use application::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, Clock, JobService,
    JobServiceDependencies, NotificationService, NotificationServiceDependencies, ProfileService,
    ProfileServiceDependencies, TokenService,
};
use config::AppConfig;
use infrastructure::{InMemoryRoomHub, Infrastructure};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub job_service: Arc<JobService>,
    pub notification_service: Arc<NotificationService>,
    pub chat_service: Arc<ChatService>,
    pub token_service: Arc<TokenService>,
    pub hub: Arc<InMemoryRoomHub>,
}

impl AppState {
    /// 用基础设施适配器组装全部用例服务
    pub fn new(infra: Infrastructure, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let token_service = Arc::new(TokenService::from_config(&config.auth, clock.clone()));

        let auth_service = AuthService::new(AuthServiceDependencies {
            user_repository: infra.user_repository.clone(),
            password_hasher: infra.password_hasher.clone(),
            token_service: token_service.clone(),
            mailer: infra.mailer.clone(),
            clock: clock.clone(),
        });
        let profile_service = ProfileService::new(ProfileServiceDependencies {
            user_repository: infra.user_repository.clone(),
            profile_repository: infra.profile_repository.clone(),
            job_repository: infra.job_repository.clone(),
        });
        let job_service = JobService::new(JobServiceDependencies {
            job_repository: infra.job_repository.clone(),
            user_repository: infra.user_repository.clone(),
            clock: clock.clone(),
        });
        let notification_service = NotificationService::new(NotificationServiceDependencies {
            notification_repository: infra.notification_repository.clone(),
            clock: clock.clone(),
        });
        let chat_service = ChatService::new(ChatServiceDependencies {
            user_repository: infra.user_repository.clone(),
            message_repository: infra.message_repository.clone(),
            broadcaster: infra.hub.clone(),
            clock,
        });

        Self {
            auth_service: Arc::new(auth_service),
            profile_service: Arc::new(profile_service),
            job_service: Arc::new(job_service),
            notification_service: Arc::new(notification_service),
            chat_service: Arc::new(chat_service),
            token_service,
            hub: infra.hub,
        }
    }
}
