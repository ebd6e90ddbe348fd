use std::{env, io};

use anyhow::Context;
use log::{debug, info, warn};
use post_index::mr::mapper::{Mapper, MapperConfig};

fn main() -> anyhow::Result<()> {
    // stderr is the error channel, stdout carries postings only.
    env_logger::init();

    let ignored = env::args().skip(1).count();
    if ignored > 0 {
        warn!("[Mapper] No arguments are accepted, ignoring {} argument(s)", ignored);
    }

    let mapper = Mapper::new(MapperConfig::default());
    debug!("[Mapper] Configuration: {:?}", mapper.config());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = mapper
        .run(stdin.lock(), stdout.lock())
        .context("Map phase aborted")?;

    info!(
        "[Mapper] {} row(s) read | {} row(s) skipped | {} token(s) skipped | {} posting(s) emitted",
        summary.rows,
        summary.skipped_rows,
        summary.skipped_tokens,
        summary.emitted
    );

    Ok(())
}
