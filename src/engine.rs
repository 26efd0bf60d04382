//! i18n エンジンの組み立て
//!
//! ローダー・永続ストア・配信チャネル・スロット監視タスクを設定から構築し、
//! コンシューマーごとのストアを払い出す。シングルトンではなく注入可能な
//! オブジェクトとして扱う。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::broadcast::LanguageBroadcaster;
use crate::config::EngineSettings;
use crate::loader::TranslationLoader;
use crate::persist::{
    PreferenceStore,
    spawn_preference_watcher,
};
use crate::store::TranslationStore;
use crate::surface::{
    RenderingSurface,
    spawn_surface_sync,
};

/// i18n サブシステム一式
///
/// drop するとスロット監視タスクも停止する。
pub struct I18nEngine {
    /// テーブルのローダー
    loader: Arc<TranslationLoader>,
    /// 言語設定の永続ストア
    prefs: Arc<PreferenceStore>,
    /// ページ内の配信チャネル
    broadcaster: LanguageBroadcaster,
    /// スロット監視タスク
    watcher: JoinHandle<()>,
}

impl I18nEngine {
    /// 設定からエンジンを構築する
    #[must_use]
    pub fn new(workspace_root: &Path, settings: &EngineSettings) -> Self {
        let loader = Arc::new(
            TranslationLoader::new(
                workspace_root.join(&settings.locale_dir),
                settings.default_language,
            )
            .with_file_pattern(&settings.file_pattern),
        );
        let prefs =
            Arc::new(PreferenceStore::new(workspace_root.join(&settings.preference_slot)));
        let broadcaster = LanguageBroadcaster::new(settings.broadcast.capacity);

        let watcher = spawn_preference_watcher(
            prefs.as_ref().clone(),
            broadcaster.clone(),
            Duration::from_millis(settings.watcher.poll_interval_ms),
        );

        Self { loader, prefs, broadcaster, watcher }
    }

    /// 新しいコンシューマー用のストアを作成する（初回ロード込み）
    pub async fn create_store(&self) -> TranslationStore {
        TranslationStore::initialize(
            self.loader.clone(),
            self.prefs.clone(),
            self.broadcaster.clone(),
        )
        .await
    }

    /// 外部レンダリングサーフェスを言語変更に追従させる
    #[must_use]
    pub fn attach_surface(&self, surface: Arc<dyn RenderingSurface>) -> JoinHandle<()> {
        spawn_surface_sync(&self.broadcaster, surface)
    }

    /// テーブルのローダー
    #[must_use]
    pub const fn loader(&self) -> &Arc<TranslationLoader> {
        &self.loader
    }

    /// 言語設定の永続ストア
    #[must_use]
    pub const fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.prefs
    }

    /// ページ内の配信チャネル
    #[must_use]
    pub const fn broadcaster(&self) -> &LanguageBroadcaster {
        &self.broadcaster
    }
}

impl Drop for I18nEngine {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl std::fmt::Debug for I18nEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nEngine")
            .field("loader", &"<TranslationLoader>")
            .field("prefs", &"<PreferenceStore>")
            .field("broadcaster", &"<LanguageBroadcaster>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tempfile::TempDir;
    use tokio::time::timeout;

    use super::*;
    use crate::store::LoadPhase;
    use crate::test_utils::write_locale;
    use crate::types::LanguageCode;

    /// ロケール一式を持つワークスペースを作る
    fn setup_workspace() -> (TempDir, EngineSettings) {
        let workspace = TempDir::new().unwrap();
        let locale_dir = workspace.path().join("i18n");
        std::fs::create_dir_all(&locale_dir).unwrap();
        write_locale(&locale_dir, "en", &json!({"which": "en"}));
        write_locale(&locale_dir, "fr", &json!({"which": "fr"}));

        let mut settings = EngineSettings::default();
        settings.watcher.poll_interval_ms = 10;
        (workspace, settings)
    }

    #[tokio::test]
    async fn engine_builds_a_working_store() {
        let (workspace, settings) = setup_workspace();
        let engine = I18nEngine::new(workspace.path(), &settings);

        let store = engine.create_store().await;

        assert_eq!(store.lang(), LanguageCode::En);
        assert_eq!(store.lookup("which", None), "en");
    }

    #[tokio::test]
    async fn engine_watcher_reconciles_external_slot_write() {
        let (workspace, settings) = setup_workspace();
        let engine = I18nEngine::new(workspace.path(), &settings);
        let store = engine.create_store().await;

        // 別プロセスがスロットを書き換えたことにする
        std::fs::write(workspace.path().join("site-lang"), "fr").unwrap();

        let mut receiver = store.subscribe();
        let snapshot = timeout(
            Duration::from_secs(2),
            receiver.wait_for(|snapshot| {
                snapshot.lang == LanguageCode::Fr && snapshot.phase == LoadPhase::Ready
            }),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.table.lookup("which", None), "fr");
    }

    #[tokio::test]
    async fn two_stores_from_one_engine_converge() {
        let (workspace, settings) = setup_workspace();
        let engine = I18nEngine::new(workspace.path(), &settings);

        let first = engine.create_store().await;
        let second = engine.create_store().await;

        first.change_language(LanguageCode::Fr).await;

        let mut receiver = second.subscribe();
        let snapshot = timeout(
            Duration::from_secs(2),
            receiver.wait_for(|snapshot| {
                snapshot.lang == LanguageCode::Fr && snapshot.phase == LoadPhase::Ready
            }),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.table.lookup("which", None), "fr");
        assert_eq!(first.lookup("which", None), "fr");
    }
}
