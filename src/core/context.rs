use crate::config::service::{keys, ServiceConfig};
use crate::config::{AUTHENTICATION_MODE, ROOT_SUFFIX, SERVICE_FACTORY, SYSTEM_SUFFIX};
use crate::domain::model::Environment;
use crate::domain::ports::DirectoryService;
use crate::utils::error::Result;

/// Two views of the same running service: one at `ou=system`, one at the
/// absolute root. Dropped together.
#[derive(Debug)]
pub struct AdminContexts<H> {
    pub system: H,
    pub root: H,
}

pub struct ContextFactory<'a, S: DirectoryService> {
    service: &'a S,
}

impl<'a, S: DirectoryService> ContextFactory<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    pub fn open_admin_contexts(
        &self,
        config: &ServiceConfig,
        principal: &str,
        credential: &str,
    ) -> Result<AdminContexts<S::Handle>> {
        let mut env = config.to_environment()?;
        add_credentials(&mut env, principal, credential);
        env.insert(
            keys::AUTHENTICATION.to_string(),
            AUTHENTICATION_MODE.to_string(),
        );
        env.insert(keys::SERVICE_FACTORY.to_string(), SERVICE_FACTORY.to_string());

        env.insert(keys::PROVIDER_URL.to_string(), SYSTEM_SUFFIX.to_string());
        let system = self.service.open(&env)?;
        tracing::debug!("Opened system context at '{}'", SYSTEM_SUFFIX);

        env.insert(keys::PROVIDER_URL.to_string(), ROOT_SUFFIX.to_string());
        let root = self.service.open(&env)?;
        tracing::debug!("Opened root context");

        Ok(AdminContexts { system, root })
    }

    pub fn request_shutdown(&self, principal: &str, credential: &str) -> Result<()> {
        let mut env = ServiceConfig::shutdown_environment();
        env.insert(keys::PROVIDER_URL.to_string(), SYSTEM_SUFFIX.to_string());
        env.insert(keys::SERVICE_FACTORY.to_string(), SERVICE_FACTORY.to_string());
        add_credentials(&mut env, principal, credential);
        self.service.shutdown(&env)
    }
}

fn add_credentials(env: &mut Environment, principal: &str, credential: &str) {
    env.insert(keys::PRINCIPAL.to_string(), principal.to_string());
    env.insert(keys::CREDENTIALS.to_string(), credential.to_string());
}
