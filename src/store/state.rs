//! コンシューマーごとの翻訳状態ストア
//!
//! 各 UI コンシューマーが 1 つずつ保持するストア。言語変更は配信チャネル
//! 経由で全インスタンスに伝播し、ロード完了後は全員が同じ言語へ収束する。
//!
//! # 状態遷移
//!
//! `Uninitialized -> Loading -> Ready`、言語変更（自発・外部観測ともに）の
//! たびに `Ready -> Loading`。終端状態はなく、drop まで生き続ける。

use std::sync::Arc;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};

use tokio::sync::{
    broadcast,
    watch,
};
use tokio::task::JoinHandle;

use crate::broadcast::{
    ChangeOrigin,
    LanguageBroadcaster,
    LanguageChange,
};
use crate::loader::TranslationLoader;
use crate::persist::PreferenceStore;
use crate::store::TranslationTable;
use crate::types::{
    LanguageCode,
    TextDirection,
};

/// ストアインスタンスのロードフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// 初回ロード前
    #[default]
    Uninitialized,
    /// テーブル取得中
    Loading,
    /// テーブル取得済み
    Ready,
}

/// ストアの観測可能なスナップショット
#[derive(Debug, Clone)]
pub struct LanguageSnapshot {
    /// 現在の言語
    pub lang: LanguageCode,
    /// ロードフェーズ
    pub phase: LoadPhase,
    /// 現在のテーブル
    pub table: Arc<TranslationTable>,
}

/// コンシューマーごとの翻訳状態ストア
///
/// drop すると配信チャネルの購読も終了する。
pub struct TranslationStore {
    /// テーブルのローダー
    loader: Arc<TranslationLoader>,
    /// 言語設定の永続ストア
    prefs: Arc<PreferenceStore>,
    /// ページ内の配信チャネル
    broadcaster: LanguageBroadcaster,
    /// 観測用スナップショット
    state: watch::Sender<LanguageSnapshot>,
    /// 古いロード結果を破棄するための世代カウンター
    generation: Arc<AtomicU64>,
    /// 配信チャネルの購読タスク
    listener: JoinHandle<()>,
}

impl TranslationStore {
    /// 新しいストアを作成する（初回ロードは行わない）
    ///
    /// 永続化された言語があればそれを、なければデフォルト言語を書き込んで
    /// 採用する。作成と同時に配信チャネルの購読を開始する。
    #[must_use]
    pub fn new(
        loader: Arc<TranslationLoader>,
        prefs: Arc<PreferenceStore>,
        broadcaster: LanguageBroadcaster,
    ) -> Self {
        let lang = prefs.initialize(loader.default_language());
        let (state, _) = watch::channel(LanguageSnapshot {
            lang,
            phase: LoadPhase::Uninitialized,
            table: Arc::new(TranslationTable::new()),
        });
        let generation = Arc::new(AtomicU64::new(0));

        let listener = spawn_change_listener(
            broadcaster.subscribe(),
            loader.clone(),
            state.clone(),
            generation.clone(),
        );

        Self { loader, prefs, broadcaster, state, generation, listener }
    }

    /// ストアを作成して初回ロードまで済ませる
    pub async fn initialize(
        loader: Arc<TranslationLoader>,
        prefs: Arc<PreferenceStore>,
        broadcaster: LanguageBroadcaster,
    ) -> Self {
        let store = Self::new(loader, prefs, broadcaster);
        store.reload().await;
        store
    }

    /// 現在の言語
    #[must_use]
    pub fn lang(&self) -> LanguageCode {
        self.state.borrow().lang
    }

    /// 現在の言語の描画方向
    #[must_use]
    pub fn direction(&self) -> TextDirection {
        self.lang().direction()
    }

    /// テーブル取得中かどうか
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().phase == LoadPhase::Loading
    }

    /// 現在のロードフェーズ
    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase
    }

    /// 現在のスナップショット
    #[must_use]
    pub fn snapshot(&self) -> LanguageSnapshot {
        self.state.borrow().clone()
    }

    /// スナップショットの購読を開始する
    ///
    /// 同期読み取りには `borrow()`、変更待ちには `changed()` / `wait_for()`。
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LanguageSnapshot> {
        self.state.subscribe()
    }

    /// キーを現在のテーブルで解決する
    ///
    /// 欠損時は `fallback`、それもなければキー名をそのまま返す。失敗しない。
    #[must_use]
    pub fn lookup(&self, key: &str, fallback: Option<&str>) -> String {
        self.state.borrow().table.lookup(key, fallback)
    }

    /// 言語を変更する
    ///
    /// 現在の言語と同じ場合は何もしない（再取得も通知もなし）。それ以外は
    /// 状態更新 → 永続化 → 配信 → 再ロードの順で行う。
    pub async fn change_language(&self, code: LanguageCode) {
        if self.lang() == code {
            tracing::debug!(%code, "language unchanged, skipping");
            return;
        }

        self.state.send_modify(|snapshot| {
            snapshot.lang = code;
            snapshot.phase = LoadPhase::Loading;
        });

        // 永続化は配信に先行する（通知を受けた側がスロットを読んでも新しい値が見える）
        self.prefs.write(code);
        self.broadcaster.publish(LanguageChange { code, origin: ChangeOrigin::Local });

        self.reload().await;
    }

    /// 現在の言語のテーブルを取得し直す
    pub async fn reload(&self) {
        reload(&self.loader, &self.state, &self.generation).await;
    }

    /// ロード完了（`Ready`）まで待つ
    pub async fn wait_until_ready(&self) {
        let mut receiver = self.state.subscribe();
        // self が送信側を保持している間はエラーにならない
        let _ = receiver.wait_for(|snapshot| snapshot.phase == LoadPhase::Ready).await;
    }
}

impl Drop for TranslationStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl std::fmt::Debug for TranslationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.state.borrow();
        f.debug_struct("TranslationStore")
            .field("lang", &snapshot.lang)
            .field("phase", &snapshot.phase)
            .field("loader", &"<TranslationLoader>")
            .field("prefs", &"<PreferenceStore>")
            .finish_non_exhaustive()
    }
}

/// テーブルを取得して状態へ反映する
///
/// 完了時点で要求した言語が現在の言語と一致しない場合、またはより新しい
/// ロードが開始されていた場合は、結果を破棄する（古い応答で上書きしない）。
async fn reload(
    loader: &TranslationLoader,
    state: &watch::Sender<LanguageSnapshot>,
    generation: &AtomicU64,
) {
    let my_generation = generation.fetch_add(1, Ordering::SeqCst) + 1;
    let requested = state.borrow().lang;

    state.send_modify(|snapshot| snapshot.phase = LoadPhase::Loading);

    let outcome = loader.load(requested).await;

    if generation.load(Ordering::SeqCst) != my_generation {
        tracing::debug!(%requested, "discarding superseded translation load");
        return;
    }

    let _applied = state.send_if_modified(|snapshot| {
        if snapshot.lang != requested {
            // すでに別の言語へ切り替わっている。新しいロードが状態を確定させる。
            tracing::debug!(%requested, current = %snapshot.lang, "discarding stale translation load");
            return false;
        }

        match outcome.resolved {
            Some(resolved) => {
                tracing::debug!(%requested, %resolved, "translation table updated");
                snapshot.table = Arc::new(outcome.table);
            }
            None if snapshot.table.is_empty() => {
                snapshot.table = Arc::new(outcome.table);
            }
            None => {
                // 完全失敗。直前のテーブルを空で上書きしない。
                tracing::warn!(%requested, "translation load failed entirely, keeping previous table");
            }
        }
        snapshot.phase = LoadPhase::Ready;
        true
    });
}

/// 配信チャネルを購読して外部からの言語変更を反映するタスクを起動する
fn spawn_change_listener(
    mut receiver: broadcast::Receiver<LanguageChange>,
    loader: Arc<TranslationLoader>,
    state: watch::Sender<LanguageSnapshot>,
    generation: Arc<AtomicU64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let change = match receiver.recv().await {
                Ok(change) => change,
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // 取りこぼした分は後続の通知で追いつく
                    tracing::warn!(skipped, "language change notifications lagged");
                    continue;
                }
            };

            if state.borrow().lang == change.code {
                continue;
            }

            tracing::debug!(code = %change.code, origin = ?change.origin, "applying observed language change");
            state.send_modify(|snapshot| {
                snapshot.lang = change.code;
                snapshot.phase = LoadPhase::Loading;
            });
            reload(&loader, &state, &generation).await;
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use googletest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::time::timeout;

    use super::*;
    use crate::test_utils::{
        write_locale,
        write_standard_locales,
    };

    /// テスト用のストア一式を組み立てる
    fn build_store_parts(
        locale_dir: &std::path::Path,
        prefs_path: std::path::PathBuf,
    ) -> (Arc<TranslationLoader>, Arc<PreferenceStore>, LanguageBroadcaster) {
        let loader = Arc::new(TranslationLoader::new(locale_dir, LanguageCode::En));
        let prefs = Arc::new(PreferenceStore::new(prefs_path));
        let broadcaster = LanguageBroadcaster::default();
        (loader, prefs, broadcaster)
    }

    #[tokio::test]
    async fn initialize_defaults_to_english_on_first_visit() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());
        let prefs_path = dir.path().join("site-lang");

        let (loader, prefs, broadcaster) = build_store_parts(dir.path(), prefs_path.clone());
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        assert_eq!(store.lang(), LanguageCode::En);
        assert_that!(store.is_loading(), eq(false));
        assert_eq!(store.phase(), LoadPhase::Ready);
        assert_eq!(store.lookup("nav.home", None), "Home");
        // 初回訪問でスロットが書き込まれる
        assert_eq!(std::fs::read_to_string(prefs_path).unwrap(), "en");
    }

    #[tokio::test]
    async fn initialize_adopts_persisted_language() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());
        let prefs_path = dir.path().join("site-lang");
        std::fs::write(&prefs_path, "fr").unwrap();

        let (loader, prefs, broadcaster) = build_store_parts(dir.path(), prefs_path);
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        assert_eq!(store.lang(), LanguageCode::Fr);
        assert_eq!(store.lookup("which", None), "fr");
    }

    #[tokio::test]
    async fn change_language_loads_the_new_table() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());
        let prefs_path = dir.path().join("site-lang");

        let (loader, prefs, broadcaster) = build_store_parts(dir.path(), prefs_path.clone());
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        store.change_language(LanguageCode::Fr).await;

        assert_eq!(store.lang(), LanguageCode::Fr);
        assert_that!(store.is_loading(), eq(false));
        assert_eq!(store.lookup("nav.home", None), "Accueil");
        assert_eq!(std::fs::read_to_string(prefs_path).unwrap(), "fr");
    }

    #[tokio::test]
    async fn change_language_to_current_code_is_a_noop() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let mut receiver = broadcaster.subscribe();
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        let before = store.snapshot();
        store.change_language(LanguageCode::En).await;
        let after = store.snapshot();

        // 通知なし・再取得なし
        assert_that!(
            matches!(receiver.try_recv(), Err(broadcast::error::TryRecvError::Empty)),
            eq(true)
        );
        assert_that!(Arc::ptr_eq(&before.table, &after.table), eq(true));
        assert_eq!(after.phase, LoadPhase::Ready);
    }

    #[tokio::test]
    async fn change_language_falls_back_but_honors_the_selection() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        // de.json は存在しない
        store.change_language(LanguageCode::De).await;

        assert_eq!(store.lang(), LanguageCode::De);
        assert_that!(store.is_loading(), eq(false));
        assert_eq!(store.lookup("which", None), "en");
    }

    #[tokio::test]
    async fn total_load_failure_keeps_the_previous_table() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;
        assert_eq!(store.lookup("which", None), "en");

        // すべてのリソースを失わせる
        std::fs::remove_file(dir.path().join("en.json")).unwrap();
        std::fs::remove_file(dir.path().join("fr.json")).unwrap();
        std::fs::remove_file(dir.path().join("ar.json")).unwrap();

        store.change_language(LanguageCode::Fr).await;

        // 一度成功したテーブルが空で置き換わることはない
        assert_eq!(store.lang(), LanguageCode::Fr);
        assert_eq!(store.phase(), LoadPhase::Ready);
        assert_eq!(store.lookup("which", None), "en");
    }

    #[tokio::test]
    async fn store_applies_externally_observed_change() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let store =
            TranslationStore::initialize(loader, prefs, broadcaster.clone()).await;

        broadcaster.publish(LanguageChange {
            code: LanguageCode::Ar,
            origin: ChangeOrigin::External,
        });

        let mut receiver = store.subscribe();
        let snapshot = timeout(
            Duration::from_secs(2),
            receiver.wait_for(|snapshot| {
                snapshot.lang == LanguageCode::Ar && snapshot.phase == LoadPhase::Ready
            }),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.table.lookup("which", None), "ar");
        assert_eq!(store.direction(), TextDirection::RightToLeft);
    }

    #[tokio::test]
    async fn concurrent_changes_converge_on_a_single_language() {
        let dir = TempDir::new().unwrap();
        write_standard_locales(dir.path());

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        // キャンセルはしない。古い応答は破棄され、最後に配信された言語へ収束する。
        tokio::join!(
            store.change_language(LanguageCode::Fr),
            store.change_language(LanguageCode::Ar),
        );

        let mut receiver = store.subscribe();
        let snapshot = timeout(
            Duration::from_secs(2),
            receiver.wait_for(|snapshot| {
                snapshot.lang == LanguageCode::Ar && snapshot.phase == LoadPhase::Ready
            }),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.table.lookup("which", None), "ar");
    }

    #[tokio::test]
    async fn lookup_uses_caller_fallback_for_missing_keys() {
        let dir = TempDir::new().unwrap();
        write_locale(dir.path(), "en", &json!({"nav": {"home": "Home"}}));

        let (loader, prefs, broadcaster) =
            build_store_parts(dir.path(), dir.path().join("site-lang"));
        let store = TranslationStore::initialize(loader, prefs, broadcaster).await;

        assert_eq!(store.lookup("nav.missing", Some("Fallback")), "Fallback");
        assert_eq!(store.lookup("nav.missing", None), "nav.missing");
    }
}
