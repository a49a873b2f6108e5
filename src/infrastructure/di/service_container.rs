//! Service container for dependency injection
//!
//! Wires up the services with their dependencies.

use std::sync::Arc;

use crate::application::services::CountService;
use crate::application::ForestLoader;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    pub fn loader(&self) -> ForestLoader {
        ForestLoader::new(Arc::clone(&self.fs))
    }

    pub fn count_service(&self) -> CountService {
        CountService::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }
}
