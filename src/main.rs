//! Entry point for the translation inspection tool.
//!
//! ワークスペースの設定を読み込み、利用可能な言語と欠落キーを報告する。

use site_i18n_engine::I18nEngine;
use site_i18n_engine::config::ConfigManager;
use site_i18n_engine::diagnostics::missing_translations;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Ok(workspace_root) = std::env::current_dir() else {
        tracing::error!("failed to determine workspace root");
        return;
    };

    let mut config_manager = ConfigManager::new();
    if let Err(error) = config_manager.load_settings(Some(workspace_root.clone())) {
        tracing::error!(%error, "failed to load configuration");
        return;
    }

    let engine = I18nEngine::new(&workspace_root, config_manager.get_settings());

    let available = engine.loader().available_languages();
    tracing::info!(languages = ?available, "available translations");

    let report = missing_translations(engine.loader()).await;
    if report.is_empty() {
        tracing::info!("no missing translation keys");
        return;
    }
    for missing in report {
        tracing::warn!(language = %missing.language, key = %missing.key, "missing translation");
    }
}
