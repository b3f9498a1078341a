//! Handler for `brix tree`.

use miette::Result;

use brix_ops::ops_tree::{self, TreeOptions};

pub async fn exec(depth: Option<usize>, offline: bool) -> Result<()> {
    let cwd = std::env::current_dir().map_err(brix_util::errors::BrixError::Io)?;
    let project_root = brix_ops::locate_project(&cwd)?;

    let opts = TreeOptions { depth, offline };
    ops_tree::tree(&project_root, &opts).await
}
