// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use vh_core::components::{NginxWebserver, Processes, ReverseProxy, StaticFiles};
use vh_core::error::Result;
use vh_core::models::{Website, WebsiteLocation};
use vh_core::services::component::ComponentRegistry;
use vh_core::services::manager::VirtualHostManager;
use vh_core::services::restart::{RestartCoordinator, Restartable, RetryPolicy, ServiceControl};
use vh_core::services::store::ConfigStore;

/// Always-running service that counts reloads.
#[derive(Default)]
pub struct CountingService {
    pub reloads: AtomicUsize,
}

#[async_trait]
impl ServiceControl for CountingService {
    async fn is_running(&self) -> Result<bool> {
        Ok(true)
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn acknowledged(&self) -> Result<bool> {
        Ok(true)
    }
}

impl CountingService {
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

pub struct Host {
    pub manager: VirtualHostManager,
    pub nginx: Arc<CountingService>,
    pub supervisor: Arc<CountingService>,
    pub root: PathBuf,
}

impl Host {
    pub fn nginx_conf(&self, slug: &str) -> PathBuf {
        self.root.join("nginx").join(format!("{slug}.conf"))
    }

    pub fn supervisor_conf(&self) -> PathBuf {
        self.root.join("supervisor").join("vh.conf")
    }
}

/// A manager wired with the built-in components, writing under `root`.
pub fn host(root: &Path) -> Host {
    let retry = RetryPolicy {
        attempts: 2,
        delay: Duration::ZERO,
    };
    let nginx = Arc::new(CountingService::default());
    let supervisor = Arc::new(CountingService::default());

    let mut restarts = RestartCoordinator::new();
    let nginx_handle = restarts
        .register(Restartable::new("nginx", nginx.clone(), retry))
        .unwrap();
    let supervisor_handle = restarts
        .register(Restartable::new("supervisor", supervisor.clone(), retry))
        .unwrap();

    let mut components = ComponentRegistry::new();
    components.register(Box::new(StaticFiles)).unwrap();
    components.register(Box::new(ReverseProxy)).unwrap();
    components
        .register(Box::new(Processes::new(
            root.join("supervisor").join("vh.conf"),
            "www-data",
            supervisor_handle,
        )))
        .unwrap();
    components
        .register(Box::new(NginxWebserver::new(root.join("nginx"), nginx_handle)))
        .unwrap();

    let manager = VirtualHostManager::new(
        ConfigStore::new(root.join("vh.json")),
        components,
        restarts,
    );
    Host {
        manager,
        nginx,
        supervisor,
        root: root.to_path_buf(),
    }
}

/// Live "Example" on port 80 with a single static `/` location.
pub fn example_website() -> Website {
    let mut site = Website::create("Example");
    site.root = "/srv/example".into();
    site.maintenance_mode = false;
    site.locations.push(WebsiteLocation::create(None));
    site
}
