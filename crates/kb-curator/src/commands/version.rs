pub fn run() -> anyhow::Result<()> {
    println!("kb-curator {}", env!("CARGO_PKG_VERSION"));
    println!("Post-compaction knowledge-base curation for AI coding assistants");
    Ok(())
}
