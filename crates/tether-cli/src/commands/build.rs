//! Build command implementation.
//!
//! The hook that runs when a platform build happens without live reload:
//! compile once and write the chunks to the output directory.

use std::path::PathBuf;

use crate::cli::BuildArgs;
use crate::config::{ConfigProvider, FileConfigProvider};
use crate::dev::Compiler;
use crate::error::Result;
use crate::ui;

/// Execute the build command.
///
/// # Errors
///
/// Only with `--bail`: configuration, compiler and entry errors.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let provider = FileConfigProvider::new(&args.project.project_root)
        .with_config_path(args.project.config.clone());
    run(&args, &provider).await.map(|_| ())
}

/// Compile with `provider`'s configuration. Returns the files written, empty
/// when the run was skipped or failed without `--bail`.
pub async fn run(args: &BuildArgs, provider: &dyn ConfigProvider) -> Result<Vec<PathBuf>> {
    if args.project.livereload {
        tracing::debug!("live reload requested; serve owns this run");
        return Ok(Vec::new());
    }
    if args.project.targets().is_empty() {
        tracing::debug!("no platforms requested; nothing to build");
        return Ok(Vec::new());
    }

    match compile(args, provider).await {
        Err(err) if !args.bail => {
            ui::error(&format!("Build failed: {err}"));
            Ok(Vec::new())
        }
        result => result,
    }
}

async fn compile(args: &BuildArgs, provider: &dyn ConfigProvider) -> Result<Vec<PathBuf>> {
    let config = provider.load()?;
    let root = &args.project.project_root;

    let (compiler, missing) = if args.bail {
        (Compiler::new(&config, root)?, Vec::new())
    } else {
        Compiler::new_lenient(&config, root)
    };
    let output = compiler.build_with(args.bail).await?;
    for skipped in missing.iter().chain(&output.skipped) {
        ui::warning(&skipped.to_string());
    }

    let out_dir = root.join(&config.out_dir);
    let written = compiler.emit(&output, &out_dir).await?;

    ui::success(&format!(
        "Built {} chunk(s) into {} in {}ms",
        written.len(),
        out_dir.display(),
        output.duration_ms
    ));
    Ok(written)
}
