//! 外部レンダリングサーフェスとの連携
//!
//! ビジュアルプログラミングのキャンバス本体は外部コラボレーターであり、この
//! クレートの責務は言語コードとシリアライズ済みプログラムを渡すところまで。
//! サーフェスは渡された言語で自前のローカライズ語彙を読み込み直す。

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::broadcast::LanguageBroadcaster;
use crate::types::LanguageCode;

/// シリアライズされたプログラム文書
///
/// サーフェスの load/save/execute にそのまま渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedProgram {
    /// XML 文書
    Xml(String),
    /// JSON 文書
    Json(serde_json::Value),
}

/// 外部レンダリングサーフェスの契約
pub trait RenderingSurface: Send + Sync {
    /// サーフェス固有のロケールタグを適用する
    fn apply_locale(&self, locale: &str);

    /// シリアライズ済みプログラムを読み込む
    fn load_program(&self, program: &SerializedProgram);
}

/// サーフェス側のロケールタグへ変換する
///
/// 2 つのコードだけ表記が異なる: `pt` は `pt-br`、`zh` は `zh-hans`。
#[must_use]
pub const fn surface_locale(code: LanguageCode) -> &'static str {
    match code {
        LanguageCode::Pt => "pt-br",
        LanguageCode::Zh => "zh-hans",
        _ => code.as_str(),
    }
}

/// 言語変更をサーフェスへ反映し続けるタスクを起動する
///
/// 配信チャネルを購読し、変更のたびに変換済みロケールタグを適用する。
#[must_use]
pub fn spawn_surface_sync(
    broadcaster: &LanguageBroadcaster,
    surface: Arc<dyn RenderingSurface>,
) -> JoinHandle<()> {
    let mut receiver = broadcaster.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    let locale = surface_locale(change.code);
                    tracing::debug!(code = %change.code, locale, "applying locale to rendering surface");
                    surface.apply_locale(locale);
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "surface locale notifications lagged");
                }
            }
        }
    })
}
