//! 翻訳の欠落レポート
//!
//! デフォルト言語のキー集合を基準に、各言語で欠けているキーを列挙する。
//! 欠けたキーは実行時に per-key フォールバックで隠れるため、保守者が
//! 気付くための手段として使う。

use std::collections::BTreeSet;

use crate::loader::TranslationLoader;
use crate::types::LanguageCode;

/// ある言語から欠けている翻訳キー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTranslation {
    /// 対象の言語
    pub language: LanguageCode,
    /// 欠けているキー（ドット区切り）
    pub key: String,
}

/// 各言語の欠落キーを列挙する
///
/// デフォルト言語に存在してその言語に存在しないキーが対象。デフォルト言語の
/// テーブルが取得できない場合は比較基準がないため空のレポートを返す。
pub async fn missing_translations(loader: &TranslationLoader) -> Vec<MissingTranslation> {
    let default_language = loader.default_language();
    let reference = loader.load(default_language).await;
    if reference.resolved != Some(default_language) {
        tracing::warn!(%default_language, "reference table unavailable, skipping missing-key report");
        return Vec::new();
    }
    let reference_keys: BTreeSet<String> = reference.table.flatten(".").into_keys().collect();

    let mut report = Vec::new();
    for outcome in loader.load_all().await {
        if outcome.requested == default_language {
            continue;
        }
        // フォールバックで解決されたテーブルは比較対象にならない
        if outcome.resolved != Some(outcome.requested) {
            tracing::warn!(language = %outcome.requested, "table unavailable, skipping in missing-key report");
            continue;
        }

        let present: BTreeSet<String> = outcome.table.flatten(".").into_keys().collect();
        for key in reference_keys.difference(&present) {
            report.push(MissingTranslation { language: outcome.requested, key: key.clone() });
        }
    }

    report
}
