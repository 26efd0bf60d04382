//! 言語設定の永続化
//!
//! 単一スロット（小さなファイル）に現在の言語コードを保持する。ストレージ
//! 障害は致命的エラーにせず、ログに残してメモリ上のデフォルトへ縮退する。
//! スロットは複数プロセス間の同期チャネルでもあり、last-writer-wins。

use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::broadcast::{
    ChangeOrigin,
    LanguageBroadcaster,
    LanguageChange,
};
use crate::types::LanguageCode;

/// 言語コードを 1 スロットだけ保持する永続ストア
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    /// スロットのファイルパス
    path: PathBuf,
}

impl PreferenceStore {
    /// 指定したパスのスロットを扱うストアを作成する
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// スロットのパス
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// スロットを読み取る
    ///
    /// 欠損・読み取り失敗・未知のタグはすべて `None`。
    #[must_use]
    pub fn read(&self) -> Option<LanguageCode> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::debug!(path = %self.path.display(), %error, "preference slot not readable");
                return None;
            }
        };

        match raw.parse() {
            Ok(code) => Some(code),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "ignoring invalid persisted language");
                None
            }
        }
    }

    /// スロットへ書き込む
    ///
    /// 書き込み失敗は警告ログのみ（メモリ上の状態はそのまま使われる）。
    pub fn write(&self, code: LanguageCode) {
        if let Err(error) = std::fs::write(&self.path, code.as_str()) {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist language preference");
        }
    }

    /// 初回アクセス時の初期化
    ///
    /// 保存済みの値があればそれを、なければ `default` を書き込んで返す。
    pub fn initialize(&self, default: LanguageCode) -> LanguageCode {
        self.read().unwrap_or_else(|| {
            tracing::debug!(%default, "no persisted language, writing first-visit default");
            self.write(default);
            default
        })
    }
}

/// 外部プロセスによるスロット書き換えを監視するタスクを起動する
///
/// 変更を検知すると `ChangeOrigin::External` の通知を配信する。返り値の
/// ハンドルを abort するまで動き続ける。
#[must_use]
pub fn spawn_preference_watcher(
    prefs: PreferenceStore,
    broadcaster: LanguageBroadcaster,
    poll_interval: Duration,
) -> JoinHandle<()> {
    // 基準値はタスク起動前に読む（起動直後の書き換えを取りこぼさない）
    let mut last_seen = prefs.read();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let current = prefs.read();
            if current == last_seen {
                continue;
            }
            last_seen = current;

            if let Some(code) = current {
                tracing::debug!(%code, "persisted preference changed externally");
                broadcaster.publish(LanguageChange { code, origin: ChangeOrigin::External });
            }
        }
    })
}
