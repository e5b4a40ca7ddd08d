//! Business logic services

pub mod auth;
pub mod books;
pub mod loans;
pub mod members;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, LoansConfig},
    repository::Repository,
};

use sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        loans_config: LoansConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config, sessions),
            books: books::BooksService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), loans_config),
            repository,
        }
    }
}
