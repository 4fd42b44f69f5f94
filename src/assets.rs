use std::{
    path::PathBuf,
    sync::mpsc::{channel, Receiver, Sender},
};

use anyhow::Context;

use crate::{asset_pipeline::materials::MaterialOverride, story::actor::Actor};

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub actor: Actor,
    pub path: PathBuf,
    pub material_override: Option<MaterialOverride>,
}

impl ModelRequest {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub struct LoadedModel {
    pub request: ModelRequest,
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
    pub images: Vec<gltf::image::Data>,
}

struct LoadResult {
    request: ModelRequest,
    result: anyhow::Result<(
        gltf::Document,
        Vec<gltf::buffer::Data>,
        Vec<gltf::image::Data>,
    )>,
}

/// Decodes glTF files on the rayon pool. Finished loads are collected with [`poll`].
///
/// [`poll`]: AssetLoader::poll
pub struct AssetLoader {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    pending: usize,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            sender,
            receiver,
            pending: 0,
        }
    }

    pub fn request(&mut self, request: ModelRequest) {
        log::info!(
            "Loading {} for {}",
            request.path.display(),
            request.actor.name()
        );

        let sender = self.sender.clone();
        self.pending += 1;

        rayon::spawn(move || {
            let result = gltf::import(&request.path)
                .with_context(|| format!("Failed to load model {}", request.path.display()));

            // The loader may be gone if the window closed mid-load
            let _ = sender.send(LoadResult { request, result });
        });
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Returns every model that finished loading since the last call. Failures are logged
    /// and dropped.
    pub fn poll(&mut self) -> Vec<LoadedModel> {
        let mut loaded = Vec::new();

        while let Ok(LoadResult { request, result }) = self.receiver.try_recv() {
            self.pending = self.pending.saturating_sub(1);

            match result {
                Ok((document, buffers, images)) => loaded.push(LoadedModel {
                    request,
                    document,
                    buffers,
                    images,
                }),
                Err(e) => log::error!("{} will not be shown: {:#}", request.actor.name(), e),
            }
        }

        loaded
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn failed_loads_are_dropped() {
        let mut loader = AssetLoader::new();
        loader.request(ModelRequest {
            actor: Actor::Country,
            path: PathBuf::from("does/not/exist/colombia.glb"),
            material_override: None,
        });
        assert_eq!(loader.pending(), 1);

        let mut loaded = Vec::new();
        for _ in 0..500 {
            loaded.extend(loader.poll());
            if loader.pending() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(loader.pending(), 0);
        assert!(loaded.is_empty());
    }

    #[test]
    fn file_name_is_the_last_path_component() {
        let request = ModelRequest {
            actor: Actor::Landmark,
            path: PathBuf::from("assets/Monserrate.glb"),
            material_override: None,
        };
        assert_eq!(request.file_name(), "Monserrate.glb");
    }
}
