//! 翻訳テーブルとコンシューマーごとの状態ストア
mod state;
mod table;

pub use state::{
    LanguageSnapshot,
    LoadPhase,
    TranslationStore,
};
pub use table::TranslationTable;
