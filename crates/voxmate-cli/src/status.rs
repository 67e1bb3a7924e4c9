//! `voxmate status`: show configuration, backend health and whether the
//! saved settings would be accepted.

use anyhow::Result;
use colored::Colorize;

use voxmate_core::config::{get_config_path, load_config};
use voxmate_core::session::SessionStore;
use voxmate_core::settings::mask_api_key;
use voxmate_providers::registry::find_provider;
use voxmate_providers::{check_status, validate_settings, BackendClient};

fn mark(ok: bool, missing: &str) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        missing.red().to_string()
    }
}

/// Run the status command.
pub async fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();
    let data_dir = config.storage.data_path();
    let store = SessionStore::new(&data_dir);
    let settings = store.load_settings();

    println!();
    println!("{}", "🎙 Voxmate Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        mark(config_path.exists(), "(defaults)")
    );
    println!(
        "  {:<18} {} {}",
        "Data dir:".bold(),
        data_dir.display(),
        mark(data_dir.exists(), "(not created yet)")
    );
    println!(
        "  {:<18} {}",
        "Conversations:".bold(),
        store.load().len()
    );

    // Backend
    println!();
    print!("  {:<18} {} ", "Backend:".bold(), config.backend.api_base);
    let backend = BackendClient::new(&config.backend.api_base, config.backend.chat_timeout())?;
    match check_status(&backend).await {
        Ok(status) => {
            let version = status.version.as_deref().unwrap_or("?");
            println!("{} {}", "✓".green(), format!("{} v{version}", status.status).dimmed());
            let mut services: Vec<_> = status.services.iter().collect();
            services.sort();
            for (name, state) in services {
                println!("    {:<16} {}", name, state.dimmed());
            }
        }
        Err(e) => println!("{} {}", "✗".red(), e.to_string().dimmed()),
    }

    // Settings
    println!();
    let provider = find_provider(&settings.llm_provider)
        .map(|p| p.display_name)
        .unwrap_or(settings.llm_provider.as_str());
    println!(
        "  {:<18} {} / {}",
        "Chat:".bold(),
        provider,
        settings.model_name
    );
    let key_status = if settings.api_key.is_empty() {
        "· not configured".dimmed().to_string()
    } else {
        format!("{} {}", "✓".green(), mask_api_key(&settings.api_key).dimmed())
    };
    println!("  {:<18} {}", "API key:".bold(), key_status);
    println!(
        "  {:<18} {} {} {}",
        "Speech:".bold(),
        if settings.enable_tts { "on".green() } else { "off".dimmed() },
        settings.tts_engine,
        settings.voice_select.dimmed()
    );
    println!(
        "  {:<18} {} {}",
        "Recognition:".bold(),
        settings.asr_engine,
        settings.asr_language.dimmed()
    );

    let report = validate_settings(&settings);
    if report.is_valid() && report.warnings.is_empty() {
        println!("  {:<18} {}", "Validation:".bold(), "✓".green());
    } else {
        println!("  {}", "Validation:".bold());
        for error in &report.errors {
            println!("    {} {}", "✗".red(), error);
        }
        for warning in &report.warnings {
            println!("    {} {}", "⚠".yellow(), warning);
        }
    }

    println!();
    Ok(())
}
