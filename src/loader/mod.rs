//! Asset loading
//!
//! The compiled program, its string table and the asset manifest are read
//! through an [`AssetRepository`]. Everything is loaded and validated before
//! a session starts; any failure here is fatal.

pub mod csv;

use crate::config::AssetConfig;
use crate::error::LoadError;
use crate::render::ImageAsset;
use crate::types::{Program, StringTable};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A looping audio track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackAsset {
    pub name: String,
    pub path: PathBuf,
    pub length_secs: f64,
}

/// Images and tracks the script may refer to by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetManifest {
    pub ui_frame: ImageAsset,
    pub default_background: String,
    pub backgrounds: Vec<ImageAsset>,
    #[serde(default)]
    pub portraits: Vec<ImageAsset>,
    #[serde(default)]
    pub tracks: Vec<TrackAsset>,
}

impl AssetManifest {
    /// Make relative asset paths relative to `base`
    pub fn resolve_against(&mut self, base: &Path) {
        let images = std::iter::once(&mut self.ui_frame)
            .chain(self.backgrounds.iter_mut())
            .chain(self.portraits.iter_mut())
            .map(|image| &mut image.path);
        let tracks = self.tracks.iter_mut().map(|track| &mut track.path);
        for path in images.chain(tracks) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Everything a session needs, loaded and validated
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    pub program: Program,
    pub strings: StringTable,
    pub manifest: AssetManifest,
}

/// Source of game data
#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn load_program(&self) -> Result<Program, LoadError>;
    async fn load_string_table(&self, locale: &str) -> Result<StringTable, LoadError>;
    async fn load_manifest(&self) -> Result<AssetManifest, LoadError>;
}

/// Reads game data from the paths in an [`AssetConfig`]
pub struct FileSystemAssetRepository {
    config: AssetConfig,
}

impl FileSystemAssetRepository {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    async fn read(path: &Path) -> Result<String, LoadError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl AssetRepository for FileSystemAssetRepository {
    async fn load_program(&self) -> Result<Program, LoadError> {
        let path = &self.config.program;
        let json = Self::read(path).await?;
        let program: Program = serde_json::from_str(&json)
            .map_err(|e| LoadError::invalid_format(path, e.to_string()))?;
        program
            .validate()
            .map_err(|e| LoadError::invalid_format(path, format!("{e:#}")))?;
        Ok(program)
    }

    async fn load_string_table(&self, locale: &str) -> Result<StringTable, LoadError> {
        let path = &self.config.strings;
        let text = Self::read(path).await?;
        csv::parse_string_table(&text, locale)
            .map_err(|e| LoadError::invalid_format(path, format!("{e:#}")))
    }

    async fn load_manifest(&self) -> Result<AssetManifest, LoadError> {
        let path = &self.config.manifest;
        let json = Self::read(path).await?;
        let mut manifest: AssetManifest = serde_json::from_str(&json)
            .map_err(|e| LoadError::invalid_format(path, e.to_string()))?;
        if let Some(base) = path.parent() {
            manifest.resolve_against(base);
        }
        Ok(manifest)
    }
}

/// Load program, strings and manifest concurrently
pub async fn load_assets(
    repository: &dyn AssetRepository,
    locale: &str,
) -> Result<LoadedAssets, LoadError> {
    let (program, strings, manifest) = tokio::try_join!(
        repository.load_program(),
        repository.load_string_table(locale),
        repository.load_manifest(),
    )?;
    info!(
        "[Loader] loaded program '{}' ({} nodes), {} lines for {}",
        program.name,
        program.nodes.len(),
        strings.len(),
        strings.locale
    );
    Ok(LoadedAssets {
        program,
        strings,
        manifest,
    })
}

/// Blocking wrapper around [`load_assets`] for synchronous hosts.
///
/// Must not be called from inside an async runtime.
pub fn load_blocking(
    repository: &dyn AssetRepository,
    locale: &str,
) -> Result<LoadedAssets, LoadError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(LoadError::Runtime {
            message: "load_blocking called inside an async runtime; await load_assets instead"
                .to_string(),
        });
    }
    let rt = tokio::runtime::Runtime::new().map_err(|e| LoadError::Runtime {
        message: format!("failed to create async runtime: {e}"),
    })?;
    rt.block_on(load_assets(repository, locale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PROGRAM: &str = r#"{
        "name": "Main",
        "nodes": {
            "Start": {
                "name": "Start",
                "instructions": [
                    { "op": "run_line", "line_id": "line:hello" },
                    { "op": "stop" }
                ]
            }
        }
    }"#;

    const MANIFEST: &str = r#"{
        "ui_frame": { "name": "ui", "path": "ui.png", "width": 800, "height": 600 },
        "default_background": "barracks",
        "backgrounds": [
            { "name": "barracks", "path": "/abs/barracks.png", "width": 517, "height": 600 }
        ],
        "tracks": [
            { "name": "music", "path": "music.ogg", "length_secs": 93.5 }
        ]
    }"#;

    fn fixture(name: &str, program: &str) -> AssetConfig {
        let dir = std::env::temp_dir().join(format!(
            "cloister-loader-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Main.json"), program).unwrap();
        fs::write(dir.join("Main-Lines.csv"), "id,text\nline:hello,Hello\n").unwrap();
        fs::write(dir.join("manifest.json"), MANIFEST).unwrap();
        AssetConfig {
            program: dir.join("Main.json"),
            strings: dir.join("Main-Lines.csv"),
            manifest: dir.join("manifest.json"),
            locale: "en-US".to_string(),
        }
    }

    #[tokio::test]
    async fn loads_all_three_files() {
        let config = fixture("ok", PROGRAM);
        let dir = config.manifest.parent().unwrap().to_path_buf();
        let repository = FileSystemAssetRepository::new(config);

        let assets = load_assets(&repository, "en-US").await.unwrap();
        assert!(assets.program.node("Start").is_some());
        assert_eq!(assets.strings.lines["line:hello"], "Hello");
        assert_eq!(assets.manifest.ui_frame.path, dir.join("ui.png"));
        assert_eq!(
            assets.manifest.backgrounds[0].path,
            PathBuf::from("/abs/barracks.png")
        );
        assert_eq!(assets.manifest.tracks[0].path, dir.join("music.ogg"));
    }

    #[tokio::test]
    async fn invalid_program_is_a_format_error() {
        let repository = FileSystemAssetRepository::new(fixture("bad", "{ not json"));
        let err = load_assets(&repository, "en-US").await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidFormat { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let mut config = fixture("missing", PROGRAM);
        config.strings = config.strings.with_file_name("nope.csv");
        let repository = FileSystemAssetRepository::new(config);
        let err = load_assets(&repository, "en-US").await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn blocking_load_refuses_to_nest_runtimes() {
        let repository = FileSystemAssetRepository::new(fixture("nested", PROGRAM));
        let err = load_blocking(&repository, "en-US").unwrap_err();
        assert!(matches!(err, LoadError::Runtime { .. }));
    }

    #[test]
    fn blocking_load_outside_runtime() {
        let repository = FileSystemAssetRepository::new(fixture("blocking", PROGRAM));
        let assets = load_blocking(&repository, "en-US").unwrap();
        assert_eq!(assets.program.name, "Main");
    }
}
