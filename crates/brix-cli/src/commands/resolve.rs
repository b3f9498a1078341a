//! Handler for `brix resolve`.

use miette::Result;

use brix_ops::ops_resolve;

pub async fn exec(offline: bool) -> Result<()> {
    let cwd = std::env::current_dir().map_err(brix_util::errors::BrixError::Io)?;
    let project_root = brix_ops::locate_project(&cwd)?;

    ops_resolve::resolve(&project_root, offline).await
}
