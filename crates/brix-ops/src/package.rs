//! Target packaging: zip a target's template directory into the output
//! container file.

use std::fs::File;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use brix_core::target::Target;
use brix_util::errors::BrixError;
use brix_util::fs::ensure_dir;

/// Write one declared target's container file to `build/<filename>`.
///
/// The template directory is zipped as-is; entries keep their
/// template-relative paths with forward slashes, sorted for a deterministic
/// archive layout. Returns the written file's path.
pub fn package_target(project_root: &Path, target: &Target) -> miette::Result<PathBuf> {
    if !target.path.is_dir() {
        return Err(BrixError::Build {
            message: format!(
                "Target \"{}\" has no template directory at {}",
                target.name,
                target.path.display()
            ),
        }
        .into());
    }

    let build_dir = project_root.join("build");
    ensure_dir(&build_dir).map_err(BrixError::Io)?;
    let output = build_dir.join(&target.filename);

    let file = File::create(&output).map_err(BrixError::Io)?;
    let mut zip = ZipWriter::new(file);

    let mut files = Vec::new();
    collect_files(&target.path, &mut files);
    files.sort();

    for path in &files {
        let name = entry_name(&target.path, path)?;
        zip.start_file(name, SimpleFileOptions::default())
            .map_err(|e| zip_error(&output, e))?;
        let mut source = File::open(path).map_err(BrixError::Io)?;
        std::io::copy(&mut source, &mut zip).map_err(BrixError::Io)?;
    }
    zip.finish().map_err(|e| zip_error(&output, e))?;

    tracing::debug!(
        target = %target.name,
        output = %output.display(),
        entries = files.len(),
        "packaged target"
    );
    Ok(output)
}

/// Template-relative, forward-slash entry name for one file.
fn entry_name(template: &Path, path: &Path) -> miette::Result<String> {
    let relative = path.strip_prefix(template).map_err(|_| BrixError::Build {
        message: format!("File {} escapes its template directory", path.display()),
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

fn zip_error(output: &Path, e: zip::result::ZipError) -> BrixError {
    BrixError::Build {
        message: format!("Failed to write {}: {e}", output.display()),
    }
}
