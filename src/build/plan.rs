//! Build state machine: `BuildPlan` (unbuilt) -> `StagedBuild` (built) ->
//! `Artifact` (installed).
//!
//! Staging happens in a hidden directory inside the store; installation is a
//! single rename, so a store never contains a half-written artifact.

use super::artifact::{Artifact, ArtifactManifest, MANIFEST_FILE, store_dir_name};
use super::descriptor::{BuildDescriptor, PostBuildStep};
use super::hashing::artifact_id;
use super::source::{SourceFile, read_source_tree};
use crate::error::{Result, VoxError};
use crate::fs::atomic_write_file;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// A build whose inputs have been snapshotted and hashed.
#[derive(Debug)]
pub struct BuildPlan {
    descriptor: BuildDescriptor,
    sources: Vec<SourceFile>,
    id: String,
}

impl BuildPlan {
    /// Snapshot the source tree and compute the artifact id.
    pub fn new(descriptor: &BuildDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let sources = read_source_tree(&descriptor.source)?;
        let id = artifact_id(descriptor, &sources)?;

        tracing::debug!(
            package = %descriptor.name,
            files = sources.len(),
            id = %id,
            "planned build"
        );

        Ok(Self {
            descriptor: descriptor.clone(),
            sources,
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Where this artifact lives once installed in `store`.
    pub fn install_path(&self, store: &Path) -> PathBuf {
        store.join(store_dir_name(&self.id, &self.descriptor.name))
    }

    /// The artifact, if `store` already holds it.
    pub fn installed_in(&self, store: &Path) -> Result<Option<Artifact>> {
        let path = self.install_path(store);
        if path.join(MANIFEST_FILE).is_file() {
            Ok(Some(Artifact::open(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Materialize the artifact tree in a staging directory inside `store`.
    ///
    /// On failure the staging directory is removed; nothing is left behind.
    pub fn stage(self, store: &Path) -> Result<StagedBuild> {
        fs::create_dir_all(store).map_err(|e| {
            VoxError::Build(format!(
                "failed to create store '{}': {}",
                store.display(),
                e
            ))
        })?;

        let final_path = self.install_path(store);
        let staging = store.join(format!(
            ".staging-{}",
            store_dir_name(&self.id, &self.descriptor.name)
        ));
        if staging.exists() {
            remove_tree(&staging)?;
        }

        match self.populate(&staging, &final_path) {
            Ok(()) => Ok(StagedBuild {
                staging,
                final_path,
            }),
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                Err(e)
            }
        }
    }

    fn populate(&self, staging: &Path, final_path: &Path) -> Result<()> {
        let name = &self.descriptor.name;
        let lib_dir = staging.join("lib").join(name);

        for file in &self.sources {
            write_file(&lib_dir.join(&file.relative), &file.contents)?;
        }

        for step in &self.descriptor.post_build {
            match step {
                PostBuildStep::CopyAuxFile { file } => {
                    let source = self
                        .sources
                        .iter()
                        .find(|s| &s.relative == file)
                        .ok_or_else(|| {
                            VoxError::Build(format!(
                                "auxiliary file '{}' is missing from source tree '{}'",
                                file,
                                self.descriptor.source.display()
                            ))
                        })?;
                    write_file(&staging.join("share").join(name).join(file), &source.contents)?;
                }
                PostBuildStep::RemoveFixtures { globs } => {
                    let removed = self.remove_fixtures(&lib_dir, globs)?;
                    tracing::debug!(package = %name, removed, "removed test fixtures");
                }
            }
        }

        let entry = lib_dir.join(&self.descriptor.entry_point);
        if !entry.is_file() {
            return Err(VoxError::Build(format!(
                "entry point '{}' is not in the installed tree of '{}'",
                self.descriptor.entry_point, name
            )));
        }

        let launcher = launcher_script(
            &self.descriptor.interpreter,
            &final_path.join("lib").join(name).join(&self.descriptor.entry_point),
        );
        let bin = staging.join("bin").join(&self.descriptor.binary);
        write_file(&bin, launcher.as_bytes())?;
        set_mode(&bin, 0o755)?;

        let manifest = ArtifactManifest {
            name: name.clone(),
            id: self.id.clone(),
            binary: self.descriptor.binary.clone(),
            entry_point: self.descriptor.entry_point.clone(),
            interpreter: self.descriptor.interpreter.clone(),
            dependencies: self.descriptor.dependencies.pins(),
            aux_file: self.descriptor.aux_file().map(str::to_string),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| VoxError::Build(format!("failed to encode manifest: {}", e)))?;
        atomic_write_file(staging.join(MANIFEST_FILE), &format!("{}\n", json))?;

        Ok(())
    }

    /// Delete library files matching `globs`, then prune emptied directories.
    fn remove_fixtures(&self, lib_dir: &Path, globs: &[String]) -> Result<usize> {
        let set = build_globset(globs)?;
        let mut removed = 0;

        for file in self.sources.iter().filter(|f| set.is_match(&f.relative)) {
            let path = lib_dir.join(&file.relative);
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    VoxError::Build(format!("failed to remove '{}': {}", path.display(), e))
                })?;
                removed += 1;
            }
        }

        prune_empty_dirs(lib_dir)?;
        Ok(removed)
    }
}

/// An artifact tree fully written to its staging directory.
#[derive(Debug)]
pub struct StagedBuild {
    staging: PathBuf,
    final_path: PathBuf,
}

impl StagedBuild {
    /// Move the staged tree into its content-addressed store path.
    ///
    /// If the store already holds this artifact, the staged copy is dropped
    /// and the existing one is returned. Installed files are made read-only.
    pub fn install(self) -> Result<Artifact> {
        if self.final_path.join(MANIFEST_FILE).is_file() {
            remove_tree(&self.staging)?;
            return Artifact::open(&self.final_path);
        }

        make_read_only(&self.staging)?;
        fs::rename(&self.staging, &self.final_path).map_err(|e| {
            let _ = fs::remove_dir_all(&self.staging);
            VoxError::Build(format!(
                "failed to install artifact at '{}': {}",
                self.final_path.display(),
                e
            ))
        })?;

        Artifact::open(&self.final_path)
    }
}

/// Plan, stage and install `descriptor` into `store`.
///
/// Identical inputs yield the identical artifact; an existing one is reused.
pub fn build(descriptor: &BuildDescriptor, store: &Path) -> Result<Artifact> {
    let plan = BuildPlan::new(descriptor)?;
    if let Some(existing) = plan.installed_in(store)? {
        tracing::info!(package = %descriptor.name, path = %existing.path.display(), "artifact already installed");
        return Ok(existing);
    }

    let artifact = plan.stage(store)?.install()?;
    tracing::info!(package = %descriptor.name, path = %artifact.path.display(), "installed artifact");
    Ok(artifact)
}

fn launcher_script(interpreter: &str, entry: &Path) -> String {
    let entry = entry.display().to_string();
    format!(
        "#!/bin/sh\nexec {} {} \"$@\"\n",
        shell_words::quote(interpreter),
        shell_words::quote(&entry)
    )
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            VoxError::Build(format!("invalid fixture glob '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| VoxError::Build(format!("failed to build fixture globset: {}", e)))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            VoxError::Build(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    fs::write(path, contents)
        .map_err(|e| VoxError::Build(format!("failed to write '{}': {}", path.display(), e)))
}

/// Remove empty directories below `dir` (but not `dir` itself).
fn prune_empty_dirs(dir: &Path) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            prune_empty_dirs(&path)?;
            let is_empty = fs::read_dir(&path)
                .map(|mut it| it.next().is_none())
                .unwrap_or(false);
            if is_empty {
                fs::remove_dir(&path).map_err(|e| {
                    VoxError::Build(format!("failed to remove '{}': {}", path.display(), e))
                })?;
            }
        }
    }
    Ok(())
}

fn remove_tree(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .map_err(|e| VoxError::Build(format!("failed to remove '{}': {}", path.display(), e)))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
        VoxError::Build(format!(
            "failed to set permissions on '{}': {}",
            path.display(),
            e
        ))
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Mark every regular file below `dir` read-only.
fn make_read_only(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| VoxError::Build(format!("failed to read '{}': {}", dir.display(), e)))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            make_read_only(&path)?;
        } else {
            let mut perms = fs::metadata(&path)
                .map_err(|e| VoxError::Build(format!("failed to stat '{}': {}", path.display(), e)))?
                .permissions();
            perms.set_readonly(true);
            fs::set_permissions(&path, perms).map_err(|e| {
                VoxError::Build(format!(
                    "failed to set permissions on '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
