//! In-process directory engine backing the fixture.
//!
//! It does not answer LDAP requests. It holds the entries, keeps the
//! configured port bound while running and lays out a working directory, which
//! is what the lifecycle needs to be exercised end to end.

use crate::config::service::keys;
use crate::config::{ADMIN_CREDENTIAL, ADMIN_PRINCIPAL, AUTHENTICATION_MODE, SERVICE_FACTORY};
use crate::domain::dn;
use crate::domain::model::{Attributes, Environment};
use crate::domain::ports::{AdminHandle, DirectoryService};
use crate::utils::error::{FixtureError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const SYSTEM_PARTITION: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub dn: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Serialize)]
struct PartitionLayout {
    name: String,
    suffix: String,
    indexed_attributes: BTreeSet<String>,
}

struct RunningServer {
    _listener: TcpListener,
    port: u16,
    working_directory: PathBuf,
    partitions: Vec<PartitionLayout>,
    entries: BTreeMap<String, StoredEntry>,
}

impl RunningServer {
    fn insert(&mut self, dn_text: &str, attributes: Attributes) -> Result<()> {
        let key = dn::normalize(dn_text);
        let rejected = |reason: &str| FixtureError::EntryRejected {
            dn: dn_text.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(rejected("the root DSE cannot be created"));
        }
        if dn::components(dn_text).iter().any(|rdn| rdn.is_empty()) {
            return Err(rejected("empty RDN"));
        }
        let is_suffix = self
            .partitions
            .iter()
            .any(|p| dn::normalize(&p.suffix) == key);
        if !is_suffix && !self.partitions.iter().any(|p| dn::is_within(&key, &p.suffix)) {
            return Err(rejected("no partition holds this name"));
        }
        if self.entries.contains_key(&key) {
            return Err(rejected("entry already exists"));
        }
        if !is_suffix {
            let parent = dn::parent(&key).unwrap_or_default();
            if !self.entries.contains_key(&parent) {
                return Err(rejected("parent entry does not exist"));
            }
        }

        self.entries.insert(
            key,
            StoredEntry {
                dn: dn_text.to_string(),
                attributes,
            },
        );
        Ok(())
    }
}

type SharedState = Arc<Mutex<Option<RunningServer>>>;

/// Embedded directory service. Cloning shares the same instance.
#[derive(Clone)]
pub struct MemoryDirectoryService {
    host: IpAddr,
    admin_password: String,
    state: SharedState,
}

impl Default for MemoryDirectoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectoryService {
    pub fn new() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            admin_password: ADMIN_CREDENTIAL.to_string(),
            state: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Changes the administrator password the service accepts.
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = password.into();
        self
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn port(&self) -> Option<u16> {
        lock(&self.state).ok()?.as_ref().map(|s| s.port)
    }

    pub fn entry(&self, dn_text: &str) -> Option<StoredEntry> {
        let guard = lock(&self.state).ok()?;
        guard.as_ref()?.entries.get(&dn::normalize(dn_text)).cloned()
    }

    /// DNs of all entries at or below `suffix`, in normalised form.
    pub fn entries_under(&self, suffix: &str) -> Vec<String> {
        match lock(&self.state) {
            Ok(guard) => guard
                .as_ref()
                .map(|s| {
                    s.entries
                        .keys()
                        .filter(|key| dn::is_within(key, suffix))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn authenticate(&self, env: &Environment) -> Result<()> {
        if let Some(factory) = env.get(keys::SERVICE_FACTORY) {
            if factory != SERVICE_FACTORY {
                return Err(FixtureError::ServiceUnreachable {
                    message: format!("unknown service factory '{}'", factory),
                });
            }
        }
        if let Some(mode) = env.get(keys::AUTHENTICATION) {
            if mode != AUTHENTICATION_MODE {
                return Err(FixtureError::ServiceUnreachable {
                    message: format!("unsupported authentication mode '{}'", mode),
                });
            }
        }

        let principal = env.get(keys::PRINCIPAL).cloned().unwrap_or_default();
        let credentials = env.get(keys::CREDENTIALS);
        let known = dn::normalize(&principal) == dn::normalize(ADMIN_PRINCIPAL);
        if !known || credentials != Some(&self.admin_password) {
            return Err(FixtureError::AuthenticationFailed { principal });
        }
        Ok(())
    }

    fn start_server(&self, env: &Environment) -> Result<RunningServer> {
        let port: u16 = env
            .get(keys::LDAP_PORT)
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| FixtureError::ServiceUnreachable {
                message: "no LDAP port in startup environment".to_string(),
            })?;
        let working_directory = PathBuf::from(
            env.get(keys::WORKING_DIRECTORY)
                .ok_or_else(|| FixtureError::ServiceUnreachable {
                    message: "no working directory in startup environment".to_string(),
                })?,
        );

        let listener =
            TcpListener::bind((self.host, port)).map_err(|e| FixtureError::ServiceUnreachable {
                message: format!("cannot bind {}:{}: {}", self.host, port, e),
            })?;

        let mut server = RunningServer {
            _listener: listener,
            port,
            working_directory,
            partitions: vec![PartitionLayout {
                name: SYSTEM_PARTITION.to_string(),
                suffix: crate::config::SYSTEM_SUFFIX.to_string(),
                indexed_attributes: ["objectClass", "ou", "uid"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }],
            entries: BTreeMap::new(),
        };

        server.insert(
            crate::config::SYSTEM_SUFFIX,
            Attributes::new()
                .with("objectClass", &["top", "organizationalUnit"])
                .with("ou", &["system"]),
        )?;
        server.insert(
            ADMIN_PRINCIPAL,
            Attributes::new()
                .with(
                    "objectClass",
                    &["top", "person", "organizationalPerson", "inetOrgPerson"],
                )
                .with("uid", &["admin"])
                .with("cn", &["system administrator"])
                .with("sn", &["administrator"])
                .with("displayName", &["Directory Superuser"]),
        )?;

        for (layout, root_entry) in partitions_from(env)? {
            server.partitions.push(layout.clone());
            server.insert(&layout.suffix, root_entry)?;
        }

        write_layout(&server.working_directory, &server.partitions)?;
        tracing::debug!(
            "Memory directory service listening on {}:{} with {} partitions",
            self.host,
            port,
            server.partitions.len()
        );
        Ok(server)
    }
}

impl DirectoryService for MemoryDirectoryService {
    type Handle = MemoryHandle;

    fn open(&self, environment: &Environment) -> Result<MemoryHandle> {
        self.authenticate(environment)?;

        let mut guard = lock(&self.state)?;
        if guard.is_none() {
            if environment.get(keys::OPERATION).map(String::as_str) != Some(keys::OPERATION_STARTUP)
            {
                return Err(FixtureError::ServiceUnreachable {
                    message: "directory service is not running".to_string(),
                });
            }
            *guard = Some(self.start_server(environment)?);
        }

        let base = environment.get(keys::PROVIDER_URL).cloned().unwrap_or_default();
        if let Some(server) = guard.as_ref() {
            let key = dn::normalize(&base);
            if !key.is_empty() && !server.entries.contains_key(&key) {
                return Err(FixtureError::ServiceUnreachable {
                    message: format!("no context at '{}'", base),
                });
            }
        }

        Ok(MemoryHandle {
            base,
            state: self.state.clone(),
        })
    }

    fn shutdown(&self, environment: &Environment) -> Result<()> {
        if environment.get(keys::OPERATION).map(String::as_str) != Some(keys::OPERATION_SHUTDOWN) {
            return Err(FixtureError::ShutdownRequestFailed {
                message: "not a shutdown request".to_string(),
            });
        }
        self.authenticate(environment)?;

        let mut guard = lock(&self.state)?;
        match guard.take() {
            Some(server) => {
                tracing::debug!("Memory directory service on port {} stopped", server.port);
                Ok(())
            }
            None => Err(FixtureError::ServiceUnreachable {
                message: "directory service is not running".to_string(),
            }),
        }
    }
}

/// Administrative context into a [`MemoryDirectoryService`].
pub struct MemoryHandle {
    base: String,
    state: SharedState,
}

impl AdminHandle for MemoryHandle {
    fn base(&self) -> &str {
        &self.base
    }

    fn create_entry(&self, dn_text: &str, attributes: &Attributes) -> Result<()> {
        let mut guard = lock(&self.state)?;
        let server = guard
            .as_mut()
            .ok_or_else(|| FixtureError::ServiceUnreachable {
                message: "directory service is not running".to_string(),
            })?;

        if dn::components(dn_text).is_empty() {
            return Err(FixtureError::EntryRejected {
                dn: dn_text.to_string(),
                reason: "empty name".to_string(),
            });
        }
        server.insert(&dn::resolve(dn_text, &self.base), attributes.clone())
    }
}

fn lock(state: &SharedState) -> Result<MutexGuard<'_, Option<RunningServer>>> {
    state.lock().map_err(|_| FixtureError::ServiceUnreachable {
        message: "directory service state is poisoned".to_string(),
    })
}

fn partitions_from(env: &Environment) -> Result<Vec<(PartitionLayout, Attributes)>> {
    let names = env.get(keys::PARTITIONS).map(String::as_str).unwrap_or("");
    let mut partitions = Vec::new();

    for name in names.split(',').filter(|n| !n.is_empty()) {
        let invalid = |what: &str| FixtureError::ServiceUnreachable {
            message: format!("partition '{}' has no valid {}", name, what),
        };

        let suffix = env
            .get(&keys::partition_suffix(name))
            .cloned()
            .ok_or_else(|| invalid("suffix"))?;
        let indexed_attributes: BTreeSet<String> = env
            .get(&keys::partition_indexed_attributes(name))
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(|_| invalid("index list"))?
            .unwrap_or_default();
        let root_entry: BTreeMap<String, Vec<String>> = env
            .get(&keys::partition_root_entry(name))
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(|_| invalid("root entry"))?
            .unwrap_or_default();

        partitions.push((
            PartitionLayout {
                name: name.to_string(),
                suffix,
                indexed_attributes,
            },
            Attributes::from_map(root_entry),
        ));
    }

    Ok(partitions)
}

fn write_layout(working_directory: &Path, partitions: &[PartitionLayout]) -> Result<()> {
    for partition in partitions {
        let dir = working_directory.join("partitions").join(&partition.name);
        fs::create_dir_all(&dir)?;
        let layout = serde_json::to_string_pretty(partition).map_err(|e| {
            FixtureError::ServiceUnreachable {
                message: format!("cannot write partition layout: {}", e),
            }
        })?;
        fs::write(dir.join("partition.json"), layout)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::service::ServiceConfig;
    use crate::core::partition::PartitionBuilder;
    use crate::utils::port::PortAllocator;
    use tempfile::TempDir;

    fn startup_env(work: &Path, base: &str, password: &str, floor: u16) -> Environment {
        let port = PortAllocator::default().allocate(floor).unwrap();
        let mut env = ServiceConfig::new()
            .with_partitions(vec![PartitionBuilder::seed().build().unwrap()])
            .unwrap()
            .with_working_directory(work)
            .with_port(port)
            .to_environment()
            .unwrap();
        env.insert(keys::PRINCIPAL.to_string(), ADMIN_PRINCIPAL.to_string());
        env.insert(keys::CREDENTIALS.to_string(), password.to_string());
        env.insert(keys::PROVIDER_URL.to_string(), base.to_string());
        env
    }

    fn shutdown_env() -> Environment {
        let mut env = ServiceConfig::shutdown_environment();
        env.insert(keys::PRINCIPAL.to_string(), ADMIN_PRINCIPAL.to_string());
        env.insert(keys::CREDENTIALS.to_string(), ADMIN_CREDENTIAL.to_string());
        env
    }

    #[test]
    fn test_open_starts_service_with_partition() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("server-work");
        let service = MemoryDirectoryService::new();

        let handle = service.open(&startup_env(&work, "", "secret", 21000)).unwrap();

        assert!(service.is_running());
        assert_eq!(handle.base(), "");
        let root = service.entry("o=SevenSeas").unwrap();
        assert_eq!(root.attributes.get("objectClass").unwrap(), ["top", "organization"]);
        assert!(service.entry("uid=admin,ou=system").is_some());
        assert!(work.join("partitions/sevenSeas/partition.json").exists());

        let port = service.port().unwrap();
        assert!(TcpListener::bind(("127.0.0.1", port)).is_err());

        service.shutdown(&shutdown_env()).unwrap();
        assert!(!service.is_running());
        assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[test]
    fn test_wrong_password_is_rejected_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("server-work");
        let service = MemoryDirectoryService::new();

        let result = service.open(&startup_env(&work, "ou=system", "guess", 21100));

        assert!(matches!(result, Err(FixtureError::AuthenticationFailed { .. })));
        assert!(!service.is_running());
        assert!(!work.exists());
    }

    #[test]
    fn test_create_entry_rules() {
        let temp_dir = TempDir::new().unwrap();
        let service = MemoryDirectoryService::new();
        let handle = service
            .open(&startup_env(&temp_dir.path().join("work"), "", "secret", 21200))
            .unwrap();
        let attrs = Attributes::new().with("objectClass", &["organizationalUnit"]);

        handle.create_entry("ou=people,o=sevenseas", &attrs).unwrap();
        assert!(matches!(
            handle.create_entry("ou=people,o=sevenseas", &attrs),
            Err(FixtureError::EntryRejected { .. })
        ));
        assert!(handle.create_entry("cn=x,ou=missing,o=sevenseas", &attrs).is_err());
        assert!(handle.create_entry("dc=elsewhere", &attrs).is_err());
        assert_eq!(service.entries_under("o=sevenseas").len(), 2);

        service.shutdown(&shutdown_env()).unwrap();
        assert!(matches!(
            handle.create_entry("ou=groups,o=sevenseas", &attrs),
            Err(FixtureError::ServiceUnreachable { .. })
        ));
    }

    #[test]
    fn test_system_handle_resolves_relative_names() {
        let temp_dir = TempDir::new().unwrap();
        let service = MemoryDirectoryService::new();
        let handle = service
            .open(&startup_env(&temp_dir.path().join("work"), "ou=system", "secret", 21300))
            .unwrap();

        handle
            .create_entry("ou=configuration", &Attributes::new().with("ou", &["configuration"]))
            .unwrap();
        assert!(service.entry("ou=configuration,ou=system").is_some());

        service.shutdown(&shutdown_env()).unwrap();
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let service = MemoryDirectoryService::new();
        let handle = service
            .open(&startup_env(&temp_dir.path().join("work"), "ou=system", "secret", 21400))
            .unwrap();
        let attrs = Attributes::new().with("ou", &["x"]);

        assert!(matches!(
            handle.create_entry("", &attrs),
            Err(FixtureError::EntryRejected { .. })
        ));
        assert!(matches!(
            handle.create_entry("ou=x,,", &attrs),
            Err(FixtureError::EntryRejected { .. })
        ));
        assert_eq!(
            service.entries_under("ou=system"),
            vec!["ou=system".to_string(), "uid=admin,ou=system".to_string()]
        );

        service.shutdown(&shutdown_env()).unwrap();
    }

    #[test]
    fn test_shutdown_when_not_running_fails() {
        let service = MemoryDirectoryService::new();
        assert!(matches!(
            service.shutdown(&shutdown_env()),
            Err(FixtureError::ServiceUnreachable { .. })
        ));
    }
}
