use std::time::Instant;

use flog::{FlogConfig, LogOptions, LoggerFactory, Severity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("flog-load");
    let factory = LoggerFactory::new(FlogConfig::default().with_root(&dir));
    let logger = factory.get(Some("load"), Some(Severity::Info))?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.info("load_test", LogOptions::new().attr("iteration", i));
        // Below threshold: neither enriched nor serialized.
        logger.debug("load_test", LogOptions::new().attr("iteration", i));
    }

    let elapsed = start.elapsed();
    println!("wrote {} lines to {} in {:?} (~{:.0} lines/s)",
        n,
        dir.join("load.log").display(),
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
