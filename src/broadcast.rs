//! 言語変更の配信チャネル
//!
//! 同一ページ内の全 `TranslationStore` インスタンスへ言語変更を伝播する。
//! 永続化スロットの書き込みは配信に先行する（通知を受けた側がスロットを
//! 読み直しても新しい値が見える）。

use tokio::sync::broadcast;

use crate::types::LanguageCode;

/// チャネルの既定バッファ容量
const DEFAULT_CAPACITY: usize = 16;

/// 言語変更の発生元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// ページ内のストアが `change_language` を呼んだ
    Local,
    /// 永続化スロットが別プロセスによって書き換えられた
    External,
}

/// 言語変更の通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageChange {
    /// 新しく選択された言語
    pub code: LanguageCode,
    /// 変更の発生元
    pub origin: ChangeOrigin,
}

/// ページスコープの publish/subscribe チャネル
///
/// Clone しても同じチャネルを共有する。購読は `Receiver` の drop で終了する。
#[derive(Debug, Clone)]
pub struct LanguageBroadcaster {
    /// 送信側チャネル
    tx: broadcast::Sender<LanguageChange>,
}

impl Default for LanguageBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LanguageBroadcaster {
    /// 指定したバッファ容量でチャネルを作成する
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 新しい購読を開始する
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LanguageChange> {
        self.tx.subscribe()
    }

    /// 言語変更を配信する
    ///
    /// 購読者がいない場合もエラーにはしない。
    pub fn publish(&self, change: LanguageChange) {
        match self.tx.send(change) {
            Ok(receivers) => {
                tracing::debug!(code = %change.code, receivers, "language change published");
            }
            Err(_) => {
                tracing::debug!(code = %change.code, "language change dropped (no subscribers)");
            }
        }
    }

    /// 現在の購読者数
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
