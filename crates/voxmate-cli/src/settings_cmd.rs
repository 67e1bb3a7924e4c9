//! `voxmate settings`: show and edit the persisted user settings.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use voxmate_core::session::SessionStore;
use voxmate_core::settings::{Settings, SETTING_KEYS};
use voxmate_providers::registry::{find_provider, ValidationReport};
use voxmate_providers::validate_settings;

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show all settings (API key masked)
    Show,

    /// Set one setting, e.g. `settings set speechRate 1.2`
    Set { key: String, value: String },

    /// Restore the defaults
    Reset,
}

pub fn dispatch(store: &SessionStore, cmd: SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = store.load_settings();
            print_settings(&settings);
            print_report(&validate_settings(&settings));
        }
        SettingsCommands::Set { key, value } => {
            let mut settings = store.load_settings();
            apply(&mut settings, &key, &value)?;
            store
                .save_settings(&settings)
                .context("failed to save settings")?;
            let shown = settings.get(&key).unwrap_or_default();
            println!("{} {} = {}", "✓".green(), key.bold(), shown);
            print_report(&validate_settings(&settings));
        }
        SettingsCommands::Reset => {
            store.reset_settings().context("failed to reset settings")?;
            println!("{} Settings restored to defaults", "✓".green());
        }
    }
    Ok(())
}

/// Apply one `key = value` edit.
///
/// Switching provider also switches to that provider's default model when
/// the current one is not offered there.
pub fn apply(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        bail!(
            "unknown setting '{key}'. Known settings: {}",
            SETTING_KEYS.join(", ")
        );
    }
    settings.set(key, value)?;

    if key == "llmProvider" {
        if let Some(spec) = find_provider(&settings.llm_provider) {
            if !spec.offers(&settings.model_name) {
                settings.model_name = spec.default_model().to_string();
                println!(
                    "{}",
                    format!("  model switched to {}", settings.model_name).dimmed()
                );
            }
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!();
    println!("{}", "⚙ Settings".cyan().bold());
    for key in SETTING_KEYS {
        let value = settings.get(key).unwrap_or_default();
        println!("  {:<16} {}", key.bold(), value);
    }
    println!();
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("  {} {}", "✗".red(), error);
    }
    for warning in &report.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }
}
