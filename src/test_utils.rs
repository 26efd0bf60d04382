//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::path::Path;

use serde_json::{
    Value,
    json,
};

/// ロケールディレクトリに翻訳リソースを書き込む
pub(crate) fn write_locale(dir: &Path, code: &str, table: &Value) {
    std::fs::write(dir.join(format!("{code}.json")), table.to_string()).unwrap();
}

/// マーカーキー付きの標準的なロケール一式を書き込む
///
/// 各テーブルは `which` キーに自分の言語コードを持ち、どの言語のテーブルが
/// 見えているかを検証できる。
pub(crate) fn write_standard_locales(dir: &Path) {
    write_locale(
        dir,
        "en",
        &json!({
            "which": "en",
            "nav": { "home": "Home", "editor": "Editor" },
            "editor": { "run": "Run Project" }
        }),
    );
    write_locale(
        dir,
        "fr",
        &json!({
            "which": "fr",
            "nav": { "home": "Accueil", "editor": "Éditeur" },
            "editor": { "run": "Exécuter le projet" }
        }),
    );
    write_locale(
        dir,
        "ar",
        &json!({
            "which": "ar",
            "nav": { "home": "الرئيسية", "editor": "المحرر" },
            "editor": { "run": "تشغيل المشروع" }
        }),
    );
}
