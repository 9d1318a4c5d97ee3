//! Configuration commands.

use std::path::Path;

use crate::cli::PathArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &CliConfig, path: &Path) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Output(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Checks the configuration, returning every problem found.
pub fn problems(config: &CliConfig, paths: &PathArgs) -> Vec<String> {
    let mut problems = Vec::new();
    match config.sync.scope() {
        Ok(scope) if !scope.is_valid() => {
            problems.push(format!("[sync] scope '{}' is not a valid range", scope));
        }
        Ok(_) => {}
        Err(e) => problems.push(e.to_string()),
    }
    if config.sync.note_extension.trim_start_matches('.').is_empty() {
        problems.push("[sync] note_extension must not be empty".to_string());
    }
    if config.sync.triage_folder.trim().is_empty() {
        problems.push("[sync] triage_folder must not be empty".to_string());
    }
    let resolved = config.resolve_paths(paths);
    if !resolved.daily_notes.is_dir() {
        problems.push(format!(
            "daily notes directory {} does not exist",
            resolved.daily_notes.display()
        ));
    }
    problems
}

/// Validate the configuration.
pub fn validate(config: &CliConfig, paths: &PathArgs) -> CliResult<()> {
    let problems = problems(config, paths);
    if !problems.is_empty() {
        return Err(CliError::Config(problems.join("; ")));
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn flags(vault: &Path) -> PathArgs {
        PathArgs {
            vault: Some(vault.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_vault_has_no_problems() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Daily Notes")).unwrap();
        assert!(problems(&CliConfig::default(), &flags(dir.path())).is_empty());
        assert!(validate(&CliConfig::default(), &flags(dir.path())).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::parse("[sync]\nscope = \"2025-03-09..2025-03-01\"\ntriage_folder = \" \"\n").unwrap();
        let found = problems(&config, &flags(dir.path()));
        assert_eq!(found.len(), 3, "{:?}", found);
        assert!(found[0].contains("not a valid range"));
        assert!(found[2].contains("does not exist"));
    }

    #[test]
    fn unknown_scope_is_reported() {
        let config = CliConfig::parse("[sync]\nscope = \"fortnight\"\n").unwrap();
        let found = problems(&config, &flags(&PathBuf::from("/nonexistent")));
        assert!(found[0].contains("fortnight"));
    }
}
