//! 翻訳テーブルのローダー
//!
//! 言語コードから `<locale_dir>/<code>.json` を取得する。取得失敗はデフォルト
//! 言語へのフォールバックで回復し、呼び出し元へエラーは返さない。
//! アプリケーション状態への副作用はない（永続化・配信はストア側の責務）。

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use globset::Glob;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::store::TranslationTable;
use crate::types::LanguageCode;

/// 単一リソースの取得エラー（ローダー内部でのみ使用）
#[derive(Error, Debug)]
enum FetchError {
    /// リソースの読み取りに失敗
    #[error("failed to read translation resource: {0}")]
    Io(#[from] std::io::Error),

    /// リソースの JSON パースに失敗
    #[error("failed to parse translation resource: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 1 回のロード結果
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// 要求された言語
    pub requested: LanguageCode,
    /// 実際にテーブルを解決できた言語（完全失敗時は `None`）
    pub resolved: Option<LanguageCode>,
    /// 解決されたテーブル（完全失敗時は空）
    pub table: TranslationTable,
}

/// 言語コードごとの翻訳テーブルを取得するローダー
#[derive(Debug, Clone)]
pub struct TranslationLoader {
    /// 翻訳リソースのディレクトリ
    locale_dir: PathBuf,
    /// リソースのファイルパターン（既定: `*.json`）
    file_pattern: String,
    /// フォールバック先の言語
    default_language: LanguageCode,
}

impl TranslationLoader {
    /// 新しいローダーを作成する
    pub fn new(locale_dir: impl Into<PathBuf>, default_language: LanguageCode) -> Self {
        Self {
            locale_dir: locale_dir.into(),
            file_pattern: "*.json".to_string(),
            default_language,
        }
    }

    /// リソースのファイルパターンを差し替える
    #[must_use]
    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// フォールバック先の言語
    #[must_use]
    pub const fn default_language(&self) -> LanguageCode {
        self.default_language
    }

    /// 言語コードに対応するリソースパス
    #[must_use]
    pub fn resource_path(&self, code: LanguageCode) -> PathBuf {
        self.locale_dir.join(format!("{}.json", code.as_str()))
    }

    /// 翻訳テーブルを取得する
    ///
    /// 1. 要求された言語のリソースを試す
    /// 2. 失敗したらデフォルト言語へフォールバック
    /// 3. それも失敗したら空テーブル
    ///
    /// どの場合も呼び出し元へはエラーを返さない。
    pub async fn load(&self, code: LanguageCode) -> LoadOutcome {
        match self.fetch(code).await {
            Ok(table) => LoadOutcome { requested: code, resolved: Some(code), table },
            Err(error) => {
                tracing::warn!(%code, %error, "failed to load translations");
                self.load_fallback(code).await
            }
        }
    }

    /// デフォルト言語へのフォールバックロード
    async fn load_fallback(&self, requested: LanguageCode) -> LoadOutcome {
        if requested == self.default_language {
            return LoadOutcome {
                requested,
                resolved: None,
                table: TranslationTable::new(),
            };
        }

        match self.fetch(self.default_language).await {
            Ok(table) => {
                tracing::debug!(%requested, fallback = %self.default_language, "using fallback translations");
                LoadOutcome { requested, resolved: Some(self.default_language), table }
            }
            Err(error) => {
                tracing::warn!(fallback = %self.default_language, %error, "failed to load fallback translations");
                LoadOutcome { requested, resolved: None, table: TranslationTable::new() }
            }
        }
    }

    /// 単一リソースを取得する
    async fn fetch(&self, code: LanguageCode) -> Result<TranslationTable, FetchError> {
        let path = self.resource_path(code);
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(content.parse()?)
    }

    /// ロケールディレクトリに存在する対応言語を列挙する
    ///
    /// ファイルパターンに一致し、ファイル名（拡張子抜き）が対応コードとして
    /// 解釈できるものだけを返す。順序は `LanguageCode::all()` に従う。
    #[must_use]
    pub fn available_languages(&self) -> Vec<LanguageCode> {
        let Ok(glob) = Glob::new(&self.file_pattern) else {
            tracing::warn!(pattern = %self.file_pattern, "invalid locale file pattern");
            return Vec::new();
        };
        let matcher = glob.compile_matcher();

        let mut found = HashSet::new();
        for result in WalkBuilder::new(&self.locale_dir).max_depth(Some(1)).build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "failed to read locale directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(name) = path.file_name() else {
                continue;
            };
            if !matcher.is_match(name) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(code) = stem.parse::<LanguageCode>() {
                found.insert(code);
            }
        }

        LanguageCode::all().iter().copied().filter(|code| found.contains(code)).collect()
    }

    /// 利用可能な全言語のテーブルを並行ロードする
    pub async fn load_all(&self) -> Vec<LoadOutcome> {
        let futures: Vec<_> =
            self.available_languages().into_iter().map(|code| self.load(code)).collect();

        futures::future::join_all(futures).await
    }

    /// 翻訳リソースのディレクトリ
    #[must_use]
    pub fn locale_dir(&self) -> &Path {
        &self.locale_dir
    }
}
