use crate::config::service::ServiceConfig;
use crate::config::{
    FixtureSettings, ADMIN_CREDENTIAL, ADMIN_PRINCIPAL, DEFAULT_PORT_FLOOR,
    DEFAULT_WORKING_DIRECTORY, SHUTDOWN_CREDENTIAL, SHUTDOWN_PRINCIPAL,
};
use crate::core::context::{AdminContexts, ContextFactory};
use crate::core::importer::BulkImporter;
use crate::core::partition::PartitionBuilder;
use crate::core::publish::PortPublisher;
use crate::domain::ports::{DirectoryService, SeedSource, StoreCleaner};
use crate::utils::error::{FixtureError, Result};
use crate::utils::port::PortAllocator;
use crate::utils::workdir::WorkingStoreCleaner;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Starts and stops the embedded directory service for a test process.
///
/// One controlling thread drives `start`/`stop`; the manager is not meant to
/// be shared. Only one manager should run per process since the published
/// port and the working directory are process-wide.
pub struct LifecycleManager<S: DirectoryService> {
    service: S,
    seed: Box<dyn SeedSource>,
    allocator: PortAllocator,
    cleaner: Box<dyn StoreCleaner>,
    publisher: PortPublisher,
    working_directory: PathBuf,
    port_floor: u16,
    print_status: bool,
    config: ServiceConfig,
    contexts: Option<AdminContexts<S::Handle>>,
    state: LifecycleState,
    imported: usize,
}

impl<S: DirectoryService> LifecycleManager<S> {
    pub fn new(service: S, seed: Box<dyn SeedSource>) -> Self {
        Self {
            service,
            seed,
            allocator: PortAllocator::default(),
            cleaner: Box::new(WorkingStoreCleaner),
            publisher: PortPublisher::default(),
            working_directory: PathBuf::from(DEFAULT_WORKING_DIRECTORY),
            port_floor: DEFAULT_PORT_FLOOR,
            print_status: true,
            config: ServiceConfig::new(),
            contexts: None,
            state: LifecycleState::Stopped,
            imported: 0,
        }
    }

    pub fn with_settings(
        service: S,
        seed: Box<dyn SeedSource>,
        settings: &FixtureSettings,
    ) -> Result<Self> {
        Ok(Self::new(service, seed)
            .with_allocator(PortAllocator::new(settings.host()?))
            .with_port_floor(settings.port_floor())
            .with_working_directory(settings.working_directory())
            .with_publisher(PortPublisher::new(settings.port_key())))
    }

    pub fn with_allocator(mut self, allocator: PortAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_cleaner(mut self, cleaner: impl StoreCleaner + 'static) -> Self {
        self.cleaner = Box::new(cleaner);
        self
    }

    pub fn with_publisher(mut self, publisher: PortPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_working_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.working_directory = path.as_ref().to_path_buf();
        self
    }

    pub fn with_port_floor(mut self, floor: u16) -> Self {
        self.port_floor = floor;
        self
    }

    pub fn with_status_line(mut self, enabled: bool) -> Self {
        self.print_status = enabled;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// Port of the running service.
    pub fn port(&self) -> Option<u16> {
        self.config.port
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn contexts(&self) -> Option<&AdminContexts<S::Handle>> {
        self.contexts.as_ref()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn publisher(&self) -> &PortPublisher {
        &self.publisher
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Number of seed entries created by the last successful start.
    pub fn imported_entries(&self) -> usize {
        self.imported
    }

    /// Starts the service and loads the seed data. Returns the port.
    ///
    /// On failure nothing is left running: the handles are dropped, the
    /// published port is removed and the manager is back to `Stopped`.
    pub fn start(&mut self) -> Result<u16> {
        if self.state != LifecycleState::Stopped {
            return Err(FixtureError::InvalidState {
                operation: "start".to_string(),
                state: self.state.to_string(),
            });
        }

        self.state = LifecycleState::Starting;
        match self.try_start() {
            Ok(port) => {
                self.state = LifecycleState::Running;
                Ok(port)
            }
            Err(e) => {
                tracing::warn!("Directory service failed to start: {}", e);
                self.rollback();
                Err(e)
            }
        }
    }

    fn try_start(&mut self) -> Result<u16> {
        self.cleaner.clean(&self.working_directory)?;

        let port = self.allocator.allocate(self.port_floor)?;
        tracing::debug!("Allocated port {}", port);

        self.config = ServiceConfig::new()
            .with_partitions(vec![PartitionBuilder::seed().build()?])?
            .with_working_directory(&self.working_directory)
            .with_port(port)
            .with_shutdown_hook(false);

        let contexts = ContextFactory::new(&self.service).open_admin_contexts(
            &self.config,
            ADMIN_PRINCIPAL,
            ADMIN_CREDENTIAL,
        )?;
        let contexts = self.contexts.insert(contexts);

        if self.print_status {
            println!("LDAP server started on port [{}]", port);
        }
        tracing::info!("LDAP server started on port [{}]", port);

        self.publisher.publish(port);

        tracing::debug!("Importing seed data from {}", self.seed.describe());
        let records = self.seed.records().map_err(FixtureError::import_failed)?;
        self.imported = BulkImporter::import_all(&contexts.root, records)?;
        tracing::info!("Imported {} seed entries", self.imported);

        Ok(port)
    }

    fn rollback(&mut self) {
        self.request_shutdown();
        self.contexts = None;
        self.config = ServiceConfig::new();
        self.imported = 0;
        self.publisher.clear();
        self.state = LifecycleState::Stopped;
    }

    /// Stops the service and deletes its working directory.
    ///
    /// A failing shutdown request is ignored (the service is usually already
    /// gone). A failing cleanup is returned, the manager still ends `Stopped`.
    pub fn stop(&mut self) -> Result<()> {
        self.state = LifecycleState::Stopping;
        self.publisher.clear();

        self.request_shutdown();
        self.contexts = None;

        let cleaned = self.cleaner.clean(&self.working_directory);

        self.config = ServiceConfig::new();
        self.imported = 0;
        self.state = LifecycleState::Stopped;

        if cleaned.is_ok() {
            tracing::info!("LDAP server stopped");
        }
        cleaned
    }

    fn request_shutdown(&self) {
        if let Err(e) = ContextFactory::new(&self.service)
            .request_shutdown(SHUTDOWN_PRINCIPAL, SHUTDOWN_CREDENTIAL)
        {
            tracing::debug!("Ignoring failed shutdown request: {}", e);
        }
    }
}

impl<S: DirectoryService> Drop for LifecycleManager<S> {
    fn drop(&mut self) {
        if self.state == LifecycleState::Running {
            if let Err(e) = self.stop() {
                tracing::warn!("Failed to stop directory service on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::service::keys;
    use crate::domain::model::{Attributes, Environment, ImportRecord};
    use crate::domain::ports::{AdminHandle, RecordStream};
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Journal {
        events: Vec<String>,
    }

    struct FakeHandle {
        base: String,
        journal: Arc<Mutex<Journal>>,
    }

    impl AdminHandle for FakeHandle {
        fn base(&self) -> &str {
            &self.base
        }

        fn create_entry(&self, dn: &str, _attributes: &Attributes) -> Result<()> {
            self.journal.lock().unwrap().events.push(format!("create {}", dn));
            Ok(())
        }
    }

    struct FakeService {
        journal: Arc<Mutex<Journal>>,
        password: String,
        shutdown_fails: bool,
    }

    impl FakeService {
        fn new(journal: Arc<Mutex<Journal>>) -> Self {
            Self {
                journal,
                password: "secret".to_string(),
                shutdown_fails: false,
            }
        }
    }

    impl DirectoryService for FakeService {
        type Handle = FakeHandle;

        fn open(&self, environment: &Environment) -> Result<FakeHandle> {
            if environment.get(keys::CREDENTIALS) != Some(&self.password) {
                return Err(FixtureError::AuthenticationFailed {
                    principal: environment.get(keys::PRINCIPAL).cloned().unwrap_or_default(),
                });
            }
            let base = environment.get(keys::PROVIDER_URL).cloned().unwrap_or_default();
            self.journal.lock().unwrap().events.push(format!("open '{}'", base));
            Ok(FakeHandle {
                base,
                journal: self.journal.clone(),
            })
        }

        fn shutdown(&self, _environment: &Environment) -> Result<()> {
            self.journal.lock().unwrap().events.push("shutdown".to_string());
            if self.shutdown_fails {
                return Err(FixtureError::ShutdownRequestFailed {
                    message: "service already gone".to_string(),
                });
            }
            Ok(())
        }
    }

    struct VecSeed(Vec<&'static str>);

    impl SeedSource for VecSeed {
        fn describe(&self) -> String {
            "in-memory records".to_string()
        }

        fn records(&self) -> Result<RecordStream<'static>> {
            let records: Vec<Result<ImportRecord>> = self
                .0
                .iter()
                .map(|dn| Ok(ImportRecord::new(*dn, Attributes::new())))
                .collect();
            Ok(Box::new(records.into_iter()))
        }
    }

    /// Succeeds for the first `passes` calls, then reports the path as stuck.
    struct StuckCleaner {
        passes: usize,
        calls: AtomicUsize,
    }

    impl StuckCleaner {
        fn failing_after(passes: usize) -> Self {
            Self {
                passes,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl StoreCleaner for StuckCleaner {
        fn clean(&self, path: &Path) -> Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.passes {
                return Ok(());
            }
            Err(FixtureError::CleanupFailed {
                path: path.to_path_buf(),
                reason: "directory is locked".to_string(),
            })
        }
    }

    fn manager(
        service: FakeService,
        seed: Vec<&'static str>,
        temp_dir: &TempDir,
        key: &str,
    ) -> LifecycleManager<FakeService> {
        LifecycleManager::new(service, Box::new(VecSeed(seed)))
            .with_working_directory(temp_dir.path().join("server-work"))
            .with_publisher(PortPublisher::new(key))
            .with_port_floor(20000)
            .with_status_line(false)
    }

    #[test]
    #[serial]
    fn test_start_publishes_allocated_port() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = manager(
            FakeService::new(journal.clone()),
            vec!["ou=people,o=sevenseas"],
            &temp_dir,
            "LDAP_FIXTURE_UNIT_START",
        );
        assert_eq!(fixture.publisher().current(), None);

        let port = fixture.start().unwrap();

        assert_eq!(fixture.state(), LifecycleState::Running);
        assert_eq!(fixture.port(), Some(port));
        assert_eq!(fixture.publisher().current(), Some(port));
        assert_eq!(fixture.imported_entries(), 1);
        assert!(!fixture.config().shutdown_hook_enabled);
        assert_eq!(fixture.config().partitions[0].name, "sevenSeas");
        assert_eq!(
            journal.lock().unwrap().events,
            vec!["open 'ou=system'", "open ''", "create ou=people,o=sevenseas"]
        );

        fixture.stop().unwrap();
        assert_eq!(fixture.publisher().current(), None);
    }

    #[test]
    #[serial]
    fn test_start_twice_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = manager(
            FakeService::new(journal),
            vec![],
            &temp_dir,
            "LDAP_FIXTURE_UNIT_TWICE",
        );

        fixture.start().unwrap();
        let result = fixture.start();

        assert!(matches!(result, Err(FixtureError::InvalidState { .. })));
        assert!(fixture.is_running());
        fixture.stop().unwrap();
    }

    #[test]
    #[serial]
    fn test_authentication_failure_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("server-work");
        std::fs::create_dir_all(work.join("stale")).unwrap();

        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut service = FakeService::new(journal.clone());
        service.password = "not-the-secret".to_string();
        let mut fixture = manager(service, vec![], &temp_dir, "LDAP_FIXTURE_UNIT_AUTH");

        let result = fixture.start();

        assert!(matches!(result, Err(FixtureError::AuthenticationFailed { .. })));
        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert!(fixture.contexts().is_none());
        assert_eq!(fixture.port(), None);
        assert_eq!(fixture.publisher().current(), None);
        // the stale directory was cleaned before the open was attempted
        assert!(!work.exists());
    }

    #[test]
    #[serial]
    fn test_stop_swallows_shutdown_failure() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut service = FakeService::new(journal.clone());
        service.shutdown_fails = true;
        let mut fixture = manager(service, vec![], &temp_dir, "LDAP_FIXTURE_UNIT_SWALLOW");

        fixture.start().unwrap();
        std::fs::create_dir_all(fixture.working_directory()).unwrap();

        fixture.stop().unwrap();

        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert!(fixture.contexts().is_none());
        assert_eq!(fixture.config(), &ServiceConfig::new());
        assert!(!fixture.working_directory().exists());
        assert!(journal.lock().unwrap().events.contains(&"shutdown".to_string()));
    }

    #[test]
    #[serial]
    fn test_stop_when_stopped_is_harmless() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = manager(
            FakeService::new(journal),
            vec![],
            &temp_dir,
            "LDAP_FIXTURE_UNIT_IDLE",
        );

        fixture.stop().unwrap();
        fixture.stop().unwrap();

        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert!(!fixture.working_directory().exists());
    }

    #[test]
    #[serial]
    fn test_seed_failure_rolls_back() {
        struct BrokenSeed;

        impl SeedSource for BrokenSeed {
            fn describe(&self) -> String {
                "broken".to_string()
            }

            fn records(&self) -> Result<RecordStream<'static>> {
                Err(FixtureError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "init.ldif",
                )))
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = LifecycleManager::new(FakeService::new(journal.clone()), Box::new(BrokenSeed))
            .with_working_directory(temp_dir.path().join("server-work"))
            .with_publisher(PortPublisher::new("LDAP_FIXTURE_UNIT_SEED"))
            .with_status_line(false);

        let result = fixture.start();

        assert!(matches!(result, Err(FixtureError::ImportFailed { .. })));
        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert_eq!(fixture.publisher().current(), None);
        assert_eq!(journal.lock().unwrap().events.last().unwrap(), "shutdown");
    }

    #[test]
    #[serial]
    fn test_drop_stops_running_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        {
            let mut fixture = manager(
                FakeService::new(journal.clone()),
                vec![],
                &temp_dir,
                "LDAP_FIXTURE_UNIT_DROP",
            );
            fixture.start().unwrap();
        }

        assert_eq!(journal.lock().unwrap().events.last().unwrap(), "shutdown");
        assert!(std::env::var("LDAP_FIXTURE_UNIT_DROP").is_err());
    }

    #[test]
    #[serial]
    fn test_clean_failure_aborts_start_before_open() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = manager(
            FakeService::new(journal.clone()),
            vec!["ou=people,o=sevenseas"],
            &temp_dir,
            "LDAP_FIXTURE_UNIT_CLEAN_START",
        )
        .with_cleaner(StuckCleaner::failing_after(0));

        let result = fixture.start();

        assert!(matches!(result, Err(FixtureError::CleanupFailed { .. })));
        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert_eq!(fixture.port(), None);
        assert_eq!(fixture.publisher().current(), None);
        assert!(!journal
            .lock()
            .unwrap()
            .events
            .iter()
            .any(|event| event.starts_with("open")));
    }

    #[test]
    #[serial]
    fn test_clean_failure_on_stop_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Mutex::new(Journal::default()));
        let mut fixture = manager(
            FakeService::new(journal.clone()),
            vec![],
            &temp_dir,
            "LDAP_FIXTURE_UNIT_CLEAN_STOP",
        )
        .with_cleaner(StuckCleaner::failing_after(1));

        fixture.start().unwrap();
        let result = fixture.stop();

        assert!(matches!(result, Err(FixtureError::CleanupFailed { .. })));
        assert_eq!(fixture.state(), LifecycleState::Stopped);
        assert!(fixture.contexts().is_none());
        assert_eq!(fixture.publisher().current(), None);
        assert_eq!(journal.lock().unwrap().events.last().unwrap(), "shutdown");
    }
}
