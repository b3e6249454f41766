//! Docblock scanning for `docmap build`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use docmap_core::{BuildParams, Docmap, DocmapConfig};

/// Options for `docmap build`, layered over the configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Replace the configured globs when non-empty.
    pub globs: Vec<String>,

    /// Replace the configured excludes when non-empty.
    pub exclude: Vec<String>,

    pub out_path: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub mdx: bool,
    pub no_save: bool,
    pub clear: bool,
}

impl BuildOptions {
    /// Override `params` with the flags that were given.
    pub fn apply(&self, params: &mut BuildParams, cwd: &Path) {
        if !self.globs.is_empty() {
            params.globs.clone_from(&self.globs);
        }
        if !self.exclude.is_empty() {
            params.exclude.clone_from(&self.exclude);
        }
        if let Some(out) = &self.out_path {
            params.out_path = Some(cwd.join(out));
        }
        if let Some(out) = &self.out_dir {
            params.out_dir = Some(cwd.join(out));
        }
        params.mdx |= self.mdx;
        params.save &= !self.no_save;
        params.clear |= self.clear;
    }
}

/// Build the docmap of the package containing `cwd`.
pub fn build_docmap(mut config: DocmapConfig, cwd: &Path, options: BuildOptions) -> Result<()> {
    options.apply(&mut config.build, cwd);

    let docmap = Docmap::from_config(config)
        .context("Invalid docmap settings")?
        .with_cwd(cwd);
    let report = docmap.build().context("Failed to build docmap")?;

    let entries = report.file.generated.as_ref().map_or(0, |g| g.map.len());
    info!(
        files = report.files_parsed,
        entries,
        written = report.written.len(),
        "build complete"
    );
    if !docmap.config().build.save {
        info!("nothing written (--no-save)");
    }
    Ok(())
}
