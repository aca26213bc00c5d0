use crate::metadata::BuildMetadata;
use crate::Result;
use std::path::Path;

pub async fn run(root: &Path, json: bool) -> Result<()> {
    let meta = BuildMetadata::resolve(root).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("{}", meta);
    }

    Ok(())
}
