//! Isolated evaluation of plugin payloads.

use skein_core::PluginIdentity;
use wasmtime::{Caller, Config, Engine, Extern, Linker, ResourceLimiter, Store, Strategy};

use crate::error::{Result, SandboxError};
use crate::limits::SandboxLimits;

/// Namespace of the single binding exposed to evaluated modules.
const EXPORT_SURFACE_MODULE: &str = "module";

/// The one host function a payload may call: `export_name(ptr, len)`.
const EXPORT_SURFACE_NAME: &str = "export_name";

/// Conventional entry export invoked after instantiation.
const ENTRY_EXPORT: &str = "register";

/// Fuel consumed between forced yields back to the async executor, so the
/// wall-clock timeout can fire mid-evaluation.
const FUEL_YIELD_INTERVAL: u64 = 10_000;

/// The export container populated by the evaluated module.
#[derive(Debug, Default)]
struct ExportSurface {
    name: Option<String>,
}

/// Store data combining the export container and the memory limiter.
struct StoreData {
    exports: ExportSurface,
    limiter: MemoryLimiter,
}

/// Evaluates untrusted payload bytes and extracts the declared identity.
///
/// Each [`load`](Self::load) call gets a fresh store: nothing leaks between
/// evaluations and nothing of the host is visible inside one. The payload's
/// only way to communicate is the `module::export_name` binding; a payload
/// importing anything else fails instantiation.
///
/// # Examples
///
/// ```no_run
/// use skein_sandbox::{ModuleLoader, SandboxLimits};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let loader = ModuleLoader::new(SandboxLimits::default())?;
/// let payload = std::fs::read("plugin.cjs")?;
/// let identity = loader.load(&payload).await?;
/// println!("plugin declares itself as {identity}");
/// # Ok(())
/// # }
/// ```
pub struct ModuleLoader {
    engine: Engine,
    limits: SandboxLimits,
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl ModuleLoader {
    /// Creates a loader with the given resource limits.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Setup`] if the engine cannot be configured.
    pub fn new(limits: SandboxLimits) -> Result<Self> {
        let mut config = Config::new();
        config.async_support(true);
        config.consume_fuel(true);
        config.strategy(Strategy::Cranelift);

        let engine = Engine::new(&config).map_err(|e| SandboxError::Setup {
            message: format!("failed to create engine: {e:#}"),
        })?;

        Ok(Self { engine, limits })
    }

    /// Evaluates a payload and returns the identity it declares.
    ///
    /// The payload is compiled, instantiated against the minimal export
    /// surface, and its `register` entry point is invoked (module start
    /// sections also run). Afterwards the declared name is read back out of
    /// the export container and validated.
    ///
    /// # Errors
    ///
    /// Any failure along the way - compile error, unresolved import, trap,
    /// fuel exhaustion, timeout, missing or unusable declared name - means
    /// the payload is not a valid plugin entry.
    pub async fn load(&self, payload: &[u8]) -> Result<PluginIdentity> {
        tracing::debug!("Evaluating plugin payload ({} bytes)", payload.len());

        let module = wasmtime::Module::new(&self.engine, payload).map_err(|e| {
            SandboxError::InvalidModule {
                message: format!("{e:#}"),
            }
        })?;

        let data = StoreData {
            exports: ExportSurface::default(),
            limiter: MemoryLimiter {
                max_memory_bytes: self.limits.memory_limit_bytes(),
            },
        };
        let mut store = Store::new(&self.engine, data);
        store.limiter(|data| &mut data.limiter);
        store
            .set_fuel(self.limits.max_fuel())
            .map_err(|e| SandboxError::Setup {
                message: format!("failed to set fuel budget: {e:#}"),
            })?;
        store
            .fuel_async_yield_interval(Some(FUEL_YIELD_INTERVAL))
            .map_err(|e| SandboxError::Setup {
                message: format!("failed to set yield interval: {e:#}"),
            })?;

        let mut linker: Linker<StoreData> = Linker::new(&self.engine);
        link_export_surface(&mut linker)?;

        let timeout = self.limits.eval_timeout();
        let evaluation = async {
            let instance = linker
                .instantiate_async(&mut store, &module)
                .await
                .map_err(|e| SandboxError::EvaluationFailed {
                    message: format!("{e:#}"),
                })?;

            // Modules without the conventional entry export may still have
            // declared their name from a start section.
            if let Some(entry) = instance.get_func(&mut store, ENTRY_EXPORT) {
                let entry = entry.typed::<(), ()>(&store).map_err(|e| {
                    SandboxError::EvaluationFailed {
                        message: format!("'{ENTRY_EXPORT}' export has the wrong signature: {e:#}"),
                    }
                })?;
                entry
                    .call_async(&mut store, ())
                    .await
                    .map_err(|e| SandboxError::EvaluationFailed {
                        message: format!("{e:#}"),
                    })?;
            }

            Ok::<(), SandboxError>(())
        };

        match tokio::time::timeout(timeout, evaluation).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Plugin evaluation timed out after {:?}", timeout);
                return Err(SandboxError::Timeout {
                    duration_secs: timeout.as_secs(),
                });
            }
        }

        let declared = store
            .into_data()
            .exports
            .name
            .ok_or(SandboxError::MissingName)?;

        let identity = PluginIdentity::new(declared)?;
        tracing::info!("Plugin declared identity: {}", identity);
        Ok(identity)
    }
}

/// Links the one binding evaluated modules may import.
///
/// `module::export_name(ptr, len)` copies a UTF-8 string out of the
/// module's exported linear memory into the store-held export container.
fn link_export_surface(linker: &mut Linker<StoreData>) -> Result<()> {
    linker
        .func_wrap(
            EXPORT_SURFACE_MODULE,
            EXPORT_SURFACE_NAME,
            |mut caller: Caller<'_, StoreData>, ptr: i32, len: i32| -> anyhow::Result<()> {
                let Some(Extern::Memory(memory)) = caller.get_export("memory") else {
                    anyhow::bail!("module declares a name but exports no linear memory");
                };

                let ptr = usize::try_from(ptr).map_err(|_| anyhow::anyhow!("negative pointer"))?;
                let len = usize::try_from(len).map_err(|_| anyhow::anyhow!("negative length"))?;
                let end = ptr
                    .checked_add(len)
                    .ok_or_else(|| anyhow::anyhow!("name range overflows"))?;

                let data = memory.data(&caller);
                let bytes = data
                    .get(ptr..end)
                    .ok_or_else(|| anyhow::anyhow!("name range out of bounds"))?;
                let name = std::str::from_utf8(bytes)
                    .map_err(|e| anyhow::anyhow!("declared name is not UTF-8: {e}"))?
                    .to_string();

                caller.data_mut().exports.name = Some(name);
                Ok(())
            },
        )
        .map_err(|e| SandboxError::Setup {
            message: format!("failed to link export surface: {e:#}"),
        })?;

    Ok(())
}

/// Memory limiter for evaluation stores.
struct MemoryLimiter {
    max_memory_bytes: usize,
}

impl ResourceLimiter for MemoryLimiter {
    fn memory_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired > self.max_memory_bytes {
            tracing::warn!(
                "Memory limit exceeded: {} > {}",
                desired,
                self.max_memory_bytes
            );
            Ok(false)
        } else {
            tracing::trace!("Memory growing: {} -> {} bytes", current, desired);
            Ok(true)
        }
    }

    fn table_growing(
        &mut self,
        _current: usize,
        _desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        Ok(true)
    }
}
