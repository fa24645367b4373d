use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{DriverType, StorageDriver};
use crate::config::StorageConfig;
use crate::error::{Result, UploadError};

pub type DriverBox = Arc<dyn StorageDriver>;

/// Driver factory trait / 驱动工厂 trait
///
/// A factory owns the fully-resolved configuration of its backend.
pub trait DriverFactory: Send + Sync {
    /// Driver type / 驱动类型
    fn driver_type(&self) -> DriverType;

    /// Construct the driver (may perform a backend handshake) / 创建驱动实例
    fn create_driver(&self) -> Result<Box<dyn StorageDriver>>;
}

/// Lazy driver registry: at most one instance per type / 驱动注册表
///
/// Build one at process start and pass it to whoever resolves drivers.
pub struct DriverRegistry {
    factories: HashMap<DriverType, Box<dyn DriverFactory>>,
    drivers: RwLock<HashMap<DriverType, DriverBox>>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            drivers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory for every backend present in the config / 按配置注册驱动工厂
    pub fn from_config(config: &StorageConfig) -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all(&mut registry, config);
        registry
    }

    /// Register driver factory; replaces any earlier factory of the same type / 注册驱动工厂
    pub fn register_factory(&mut self, factory: Box<dyn DriverFactory>) {
        let driver_type = factory.driver_type();
        self.factories.insert(driver_type, factory);
        tracing::info!("Driver factory registered: {}", driver_type);
    }

    /// Get (constructing on first use) the driver for `driver_type` / 获取驱动实例
    pub async fn get(&self, driver_type: &str) -> Result<DriverBox> {
        let driver_type: DriverType = driver_type.parse()?;
        self.get_driver(driver_type).await
    }

    pub async fn get_driver(&self, driver_type: DriverType) -> Result<DriverBox> {
        if let Some(driver) = self.drivers.read().await.get(&driver_type) {
            return Ok(driver.clone());
        }

        let factory = self
            .factories
            .get(&driver_type)
            .ok_or_else(|| UploadError::UnknownDriverType(driver_type.to_string()))?;

        let mut drivers = self.drivers.write().await;
        // 另一个调用者可能已在等待写锁期间完成创建
        if let Some(driver) = drivers.get(&driver_type) {
            return Ok(driver.clone());
        }

        match factory.create_driver() {
            Ok(driver) => {
                let driver: DriverBox = Arc::from(driver);
                drivers.insert(driver_type, driver.clone());
                tracing::info!("Driver created: {}", driver_type);
                Ok(driver)
            }
            Err(e) => {
                tracing::error!("Driver creation failed: {} - {}", driver_type, e);
                Err(e)
            }
        }
    }

    /// List all registered driver types / 列出所有可用的驱动类型
    pub fn list_driver_types(&self) -> Vec<DriverType> {
        self.factories.keys().copied().collect()
    }

    /// List the driver types constructed so far / 列出已创建的驱动
    pub async fn list_drivers(&self) -> Vec<DriverType> {
        self.drivers.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::file::UploadFile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct NullDriver;

    #[async_trait]
    impl StorageDriver for NullDriver {
        async fn upload(
            &self,
            file: &UploadFile,
            _randomly: bool,
            _cancel: &CancellationToken,
        ) -> Result<(String, String)> {
            Ok((file.name().to_string(), String::new()))
        }

        async fn multipart_upload(
            &self,
            _file: &UploadFile,
            _randomly: bool,
            _part_size_mb: u64,
            _cancel: &CancellationToken,
        ) -> Result<(String, String)> {
            Err(UploadError::NotSupported {
                driver: DriverType::Local,
                operation: "multipart upload",
            })
        }

        async fn delete_objects(
            &self,
            _paths: &[String],
            _cancel: &CancellationToken,
        ) -> Result<()> {
            Ok(())
        }

        fn driver_type(&self) -> DriverType {
            DriverType::Local
        }
    }

    struct CountingFactory {
        built: Arc<AtomicUsize>,
    }

    impl DriverFactory for CountingFactory {
        fn driver_type(&self) -> DriverType {
            DriverType::Local
        }

        fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullDriver))
        }
    }

    fn registry() -> (DriverRegistry, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = DriverRegistry::new();
        registry.register_factory(Box::new(CountingFactory { built: built.clone() }));
        (registry, built)
    }

    #[tokio::test]
    async fn test_same_instance() {
        let (registry, built) = registry();

        let first = registry.get("Local").await.unwrap();
        let second = registry.get("Local").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(registry.list_drivers().await, vec![DriverType::Local]);
    }

    #[tokio::test]
    async fn test_unknown_driver_type() {
        let (registry, _) = registry();

        let err = registry.get("Unknown").await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownDriverType);

        // 类型合法但未注册
        let err = registry.get("Qiniu").await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownDriverType);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_builds_once() {
        let (registry, built) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get("Local").await.unwrap() })
            })
            .collect();

        let mut drivers = Vec::new();
        for handle in handles {
            drivers.push(handle.await.unwrap());
        }

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(drivers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_from_config_registers_configured_backends() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        config.local = Some(crate::drivers::local::LocalConfig {
            local_path: dir.path().to_string_lossy().to_string(),
            domain: "http://localhost".to_string(),
        });

        let registry = DriverRegistry::from_config(&config);
        assert_eq!(registry.list_driver_types(), vec![DriverType::Local]);

        let driver = registry.get("Local").await.unwrap();
        assert_eq!(driver.driver_type(), DriverType::Local);
    }
}
