//! Handler for `brix build`.

use miette::Result;

use brix_ops::ops_build::{self, BuildOptions};

pub async fn exec(target: Option<String>, offline: bool, verbose: bool) -> Result<()> {
    let cwd = std::env::current_dir().map_err(brix_util::errors::BrixError::Io)?;
    let project_root = brix_ops::locate_project(&cwd)?;

    let opts = BuildOptions {
        target,
        offline,
        verbose,
    };
    ops_build::build(&project_root, &opts).await?;
    Ok(())
}
