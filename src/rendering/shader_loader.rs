use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{naga, PollType, RenderPipeline};

const SHARED_MODULES_FOLDER: &str = "shared";

pub(crate) type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    /// Relative to the shader folder.
    pub path: &'static str,
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

impl PipelineCacheEntry {
    pub fn set_pipeline(&mut self, pipeline: wgpu::RenderPipeline) {
        self.0 = Some(pipeline);
    }
}

pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    pub(crate) fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    pub fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }

    fn get_entry_mut(&mut self, id: PipelineId) -> Option<&mut PipelineCacheEntry> {
        self.pipelines.get_mut(id)
    }
}

struct ShaderPaths {
    root: PathBuf,
    shared: PathBuf,
}

// Compiles shaders to pipelines, and recompiles them on a watcher thread when they change.
pub(crate) struct ShaderLoader {
    pub cache: PipelineCache,
    device: wgpu::Device,
    paths: Arc<ShaderPaths>,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    composer: Arc<RwLock<Composer>>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ShaderLoader {
    pub fn new(
        device: wgpu::Device,
        cache_builder: PipelineCacheBuilder,
        shader_folder: &Path,
    ) -> anyhow::Result<Self> {
        let root = shader_folder
            .canonicalize()
            .with_context(|| format!("Shader folder {} not found", shader_folder.display()))?;
        let paths = Arc::new(ShaderPaths {
            shared: root.join(SHARED_MODULES_FOLDER),
            root,
        });

        let cache = cache_builder.build();
        let (send_new_pipelines, recv_new_pipelines) = channel();

        let composer = create_composer(&paths.shared)?;
        let composer = Arc::new(RwLock::new(composer));

        let device_loader = device.clone();
        let shaders = cache.shaders.clone();
        let composer_watcher = composer.clone();
        let paths_watcher = paths.clone();

        let mut debouncer = new_debouncer_opt(
            notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
            move |res: DebounceEventResult| {
                let events = match res {
                    Ok(events) => events,
                    Err(e) => {
                        log::error!("Error debouncing shader changes: {}", e);
                        return;
                    }
                };

                for event in events {
                    if event.kind != DebouncedEventKind::Any {
                        continue;
                    }

                    // A shared module change can affect every shader
                    let affected: Vec<&ShaderEntry> = if event.path.starts_with(&paths_watcher.shared)
                    {
                        if let Err(e) = add_shared_module(&composer_watcher, &event.path) {
                            log::error!("Failed to reload shared shader module: {:#}", e);
                            continue;
                        }
                        shaders.iter().map(|(_, entry)| entry).collect()
                    } else {
                        shaders
                            .iter()
                            .map(|(_, entry)| entry)
                            .filter(|entry| event.path.ends_with(entry.def.path))
                            .collect()
                    };

                    for entry in affected {
                        match compile_file(
                            &device_loader,
                            &paths_watcher.root,
                            &entry.def,
                            &entry.factory,
                            &composer_watcher,
                        ) {
                            Ok(pipeline) => {
                                if send_new_pipelines
                                    .send((entry.def.name, entry.pipeline_id, pipeline))
                                    .is_err()
                                {
                                    return;
                                }
                            }
                            Err(e) => log::error!("Failed to reload shader: {:#}", e),
                        }
                    }
                }
            },
        )
        .context("Failed to create shader watcher")?;

        debouncer
            .watcher()
            .watch(&paths.root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", paths.root.display()))?;

        let mut shader_loader = Self {
            device,
            cache,
            paths,
            receiver: recv_new_pipelines,
            composer,
            _debouncer: debouncer,
        };

        shader_loader.create_all_pipelines()?;

        Ok(shader_loader)
    }

    fn create_all_pipelines(&mut self) -> anyhow::Result<()> {
        let shaders = self.cache.shaders.clone();

        for (_, shader) in shaders.iter() {
            let pipeline = compile_file(
                &self.device,
                &self.paths.root,
                &shader.def,
                &shader.factory,
                &self.composer,
            )
            .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;

            if let Some(entry) = self.cache.get_entry_mut(shader.pipeline_id) {
                entry.set_pipeline(pipeline);
            }
        }

        Ok(())
    }

    pub(crate) fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.get_entry_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.set_pipeline(pipeline);
            }
        }
    }
}

fn compile_file(
    device: &wgpu::Device,
    shader_folder: &Path,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
    composer: &RwLock<Composer>,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path = shader_folder.join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    let file_path = path.to_string_lossy().to_string();

    let module = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;

        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &file_path,
                source: &shader_code,
                ..Default::default()
            })
            .with_context(|| format!("Failed to compose {}", file_path))?
    };

    // wgpu validates again when the module is created
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate Naga module")?;

    let shader_code = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to convert Naga module to WGSL string")?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        anyhow::bail!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        );
    }

    pipeline
}

fn add_shared_module(composer: &RwLock<Composer>, path: &Path) -> anyhow::Result<()> {
    if path.extension().map_or(true, |ext| ext != "wgsl") {
        return Ok(());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read shared shader module {}", path.display()))?;
    let file_path = path.to_string_lossy().to_string();

    let mut composer = composer
        .write()
        .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;

    composer
        .add_composable_module(ComposableModuleDescriptor {
            source: &source,
            file_path: &file_path,
            language: ShaderLanguage::Wgsl,
            ..Default::default()
        })
        .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;

    Ok(())
}

fn create_composer(shared_folder: &Path) -> anyhow::Result<Composer> {
    let composer = RwLock::new(Composer::default());

    let shared_files = std::fs::read_dir(shared_folder).with_context(|| {
        format!(
            "Failed to read shared shader modules directory {}",
            shared_folder.display()
        )
    })?;

    for entry in shared_files {
        let path = entry
            .context("Failed to read entry in shared shader modules directory")?
            .path();

        if path.is_file() {
            add_shared_module(&composer, &path)?;
        }
    }

    composer
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))
}
