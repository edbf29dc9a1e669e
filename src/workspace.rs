//! Workspace management: `.tabrecon/` config and persisted results

use crate::config::ReconConfig;
use crate::error::{ReconError, Result};
use crate::result::{ComparisonResult, Summary};
use crate::store::{EvictionPolicy, ResultHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const WORKSPACE_DIR: &str = ".tabrecon";
const LATEST: &str = "latest";
const SUMMARY_SUFFIX: &str = ".summary.json";

/// Manages the .tabrecon workspace directory
#[derive(Debug, Clone)]
pub struct ReconWorkspace {
    /// Project root directory (where .tabrecon/ lives)
    pub root: PathBuf,
    /// .tabrecon/ directory path
    pub recon_dir: PathBuf,
    /// .tabrecon/results/ directory path
    pub results_dir: PathBuf,
}

/// Small companion file written next to each result so listings never
/// read the rows
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultMeta {
    created: DateTime<Utc>,
    summary: Summary,
}

/// Listing entry of a persisted result
#[derive(Debug, Clone, Serialize)]
pub struct StoredResult {
    pub handle: ResultHandle,
    pub created: DateTime<Utc>,
    pub summary: Summary,
    pub size_bytes: u64,
}

impl ReconWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start) {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Walk up from `start_dir` looking for `.tabrecon/`, stopping at a git root
    fn find_existing(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(Self::from_root(current.to_path_buf()));
            }
            if current.join(".git").exists() {
                return None;
            }
            current = current.parent()?;
        }
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);
        workspace.initialize(false)?;
        log::info!("Created tabrecon workspace at: {}", workspace.root.display());
        Ok(workspace)
    }

    pub fn from_root(root: PathBuf) -> Self {
        let recon_dir = root.join(WORKSPACE_DIR);
        let results_dir = recon_dir.join("results");
        Self {
            root,
            recon_dir,
            results_dir,
        }
    }

    /// Create directories, config and .gitignore entry; `force` rewrites the config
    pub fn initialize(&self, force: bool) -> Result<()> {
        fs::create_dir_all(&self.results_dir)?;
        self.create_config_with_force(force)?;
        self.ensure_gitignore()
    }

    pub fn config_path(&self) -> PathBuf {
        self.recon_dir.join("config.json")
    }

    pub fn create_config_with_force(&self, force: bool) -> Result<()> {
        let config_path = self.config_path();
        if config_path.exists() && !force {
            return Ok(());
        }
        ReconConfig::default().save(&config_path)
    }

    pub fn load_config(&self) -> Result<ReconConfig> {
        ReconConfig::load(&self.config_path())
    }

    /// Ensure .gitignore excludes stored results
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let entry = ".tabrecon/results/";
        let block = format!("# Ignore reconciliation results\n{}\n", entry);

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.lines().any(|line| line.trim() == entry) {
                let new_content = if content.is_empty() || content.ends_with('\n') {
                    format!("{}{}", content, block)
                } else {
                    format!("{}\n{}", content, block)
                };
                fs::write(gitignore_path, new_content)?;
                log::info!("Updated .gitignore with tabrecon entries");
            }
        } else {
            fs::write(gitignore_path, block)?;
            log::info!("Created .gitignore with tabrecon entries");
        }

        Ok(())
    }

    pub fn result_path(&self, handle: &ResultHandle) -> PathBuf {
        self.results_dir.join(format!("{}.json", handle))
    }

    pub fn summary_path(&self, handle: &ResultHandle) -> PathBuf {
        self.results_dir.join(format!("{}{}", handle, SUMMARY_SUFFIX))
    }

    /// Persist a result and its listing summary
    pub fn save_result(&self, handle: &ResultHandle, result: &ComparisonResult) -> Result<PathBuf> {
        fs::create_dir_all(&self.results_dir)?;
        let meta = ResultMeta {
            created: result.created,
            summary: result.summary.clone(),
        };
        write_atomic(&self.summary_path(handle), &serde_json::to_vec(&meta)?)?;

        let path = self.result_path(handle);
        write_atomic(&path, &serde_json::to_vec(result)?)?;
        log::debug!("Persisted result {} to {}", handle.short(), path.display());
        Ok(path)
    }

    pub fn load_result(&self, handle: &ResultHandle) -> Result<ComparisonResult> {
        let path = self.result_path(handle);
        if !path.exists() {
            return Err(ReconError::not_found(handle.as_str()));
        }
        let content = fs::read(&path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Resolve a full handle, a unique handle prefix, or `latest`
    pub fn resolve_handle(&self, reference: &str) -> Result<ResultHandle> {
        if reference == LATEST {
            return self
                .list_results()?
                .pop()
                .map(|entry| entry.handle)
                .ok_or_else(|| ReconError::not_found(LATEST));
        }

        let handles = self.handles()?;
        let matches: Vec<&ResultHandle> = handles
            .iter()
            .filter(|h| h.as_str().starts_with(reference))
            .collect();

        match matches.as_slice() {
            [] => Err(ReconError::not_found(reference)),
            [single] => Ok((*single).clone()),
            _ => match handles.iter().find(|h| h.as_str() == reference) {
                Some(exact) => Ok(exact.clone()),
                None => Err(ReconError::invalid_input(format!(
                    "Handle prefix '{}' is ambiguous ({} results)",
                    reference,
                    matches.len()
                ))),
            },
        }
    }

    /// Handles of every persisted result, sorted by name
    pub fn handles(&self) -> Result<Vec<ResultHandle>> {
        let mut handles = Vec::new();
        if !self.results_dir.exists() {
            return Ok(handles);
        }

        for entry in WalkDir::new(&self.results_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || name.ends_with(SUMMARY_SUFFIX) {
                continue;
            }
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    handles.push(ResultHandle::from(stem));
                }
            }
        }

        handles.sort();
        Ok(handles)
    }

    /// Persisted results, oldest first
    pub fn list_results(&self) -> Result<Vec<StoredResult>> {
        let mut results = Vec::new();
        for handle in self.handles()? {
            let path = self.result_path(&handle);
            let size_bytes = fs::metadata(&path)?.len();
            match self.load_meta(&handle) {
                Ok(meta) => results.push(StoredResult {
                    handle,
                    created: meta.created,
                    summary: meta.summary,
                    size_bytes,
                }),
                Err(e) => log::warn!("Skipping unreadable result {}: {}", path.display(), e),
            }
        }
        results.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.handle.cmp(&b.handle)));
        Ok(results)
    }

    /// Listing summary, rebuilt from the full result when the companion
    /// file is missing or damaged
    fn load_meta(&self, handle: &ResultHandle) -> Result<ResultMeta> {
        let meta_path = self.summary_path(handle);
        if meta_path.exists() {
            match serde_json::from_slice(&fs::read(&meta_path)?) {
                Ok(meta) => return Ok(meta),
                Err(e) => log::warn!("Rebuilding summary {}: {}", meta_path.display(), e),
            }
        }

        let result = self.load_result(handle)?;
        let meta = ResultMeta {
            created: result.created,
            summary: result.summary,
        };
        if let Err(e) = write_atomic(&meta_path, &serde_json::to_vec(&meta)?) {
            log::warn!("Could not write {}: {}", meta_path.display(), e);
        }
        Ok(meta)
    }

    /// Delete a persisted result; returns whether it existed
    pub fn remove_result(&self, handle: &ResultHandle) -> Result<bool> {
        let meta_path = self.summary_path(handle);
        if meta_path.exists() {
            fs::remove_file(meta_path)?;
        }

        let path = self.result_path(handle);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    pub fn clear_results(&self) -> Result<usize> {
        let handles = self.handles()?;
        for handle in &handles {
            self.remove_result(handle)?;
        }
        Ok(handles.len())
    }

    /// Apply the eviction policy to persisted results
    ///
    /// `MaxEntries` keeps the newest `max` results, `Ttl` drops results older
    /// than the limit. Returns the removed handles.
    pub fn prune(&self, policy: EvictionPolicy) -> Result<Vec<ResultHandle>> {
        if policy == EvictionPolicy::Manual {
            return Ok(Vec::new());
        }
        let results = self.list_results()?;
        let doomed: Vec<ResultHandle> = match policy {
            EvictionPolicy::Manual => Vec::new(),
            EvictionPolicy::MaxEntries { max } => {
                let excess = results.len().saturating_sub(max);
                results.into_iter().take(excess).map(|r| r.handle).collect()
            }
            EvictionPolicy::Ttl { seconds } => {
                let cutoff = Utc::now() - chrono::Duration::seconds(seconds as i64);
                results
                    .into_iter()
                    .filter(|r| r.created < cutoff)
                    .map(|r| r.handle)
                    .collect()
            }
        };

        for handle in &doomed {
            self.remove_result(handle)?;
            log::info!("Evicted result {}", handle.short());
        }
        Ok(doomed)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
