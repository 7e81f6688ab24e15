use anyhow::{bail, Result};

use crate::cli::config::Config;
use crate::cli::InitArgs;

pub fn execute_init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            args.path.display()
        );
    }

    let config = Config::default();
    config.save(&args.path)?;

    eprintln!("Created {}", args.path.display());
    eprintln!("  listen: {}", config.bind_addr());
    eprintln!("  holder_timeout_secs: {}", config.holder_timeout_secs);
    eprintln!("  holder_attempts: {}", config.holder_attempts);
    eprintln!();
    eprintln!("Next: query-aggregator serve");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::load_config_from_path;

    #[test]
    fn writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agg.toml");

        execute_init(InitArgs {
            path: path.clone(),
            force: false,
        })
        .unwrap();

        assert_eq!(load_config_from_path(&path).unwrap(), Config::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agg.toml");
        std::fs::write(&path, "port = 1\n").unwrap();

        let err = execute_init(InitArgs {
            path: path.clone(),
            force: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        execute_init(InitArgs { path, force: true }).unwrap();
    }
}
