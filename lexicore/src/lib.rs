//! # Lexicore
//!
//! Lexicoreは、CLDF（Cross-Linguistic Data Formats）語彙リストを概念で
//! 整列された一つのエンティティグラフへ集約するライブラリです。
//!
//! ## 概要
//!
//! このライブラリは、複数のソースデータセットから言語・語義・概念・
//! フォームを読み込み、共有されたConcepticonグロスでデータセット横断の
//! 概念統合を行います。分かち書きされた書記素列は転写システムで音へ
//! 解決され、言語ごとの音素インベントリと、その厳密・近似類似度の計算に
//! 使われます。
//!
//! ## 主な機能
//!
//! - **データセット横断の概念統合**: 共有グロスによる整列（メタデータは先勝ち）
//! - **二層の音表現**: データセットスコープの書記素とコーパス全体の音素
//! - **転写の検証**: 境界マーカーの正規化と未知音を含む列の棄却
//! - **インベントリ類似度**: Jaccard係数と貪欲な二部最良マッチ
//! - **特徴量の実行契約**: 要件検査付きの類型論的特徴量の適用
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use lexicore::{Dataset, Wordlist};
//! # use lexicore::transcription::{SoundDescriptor, SoundKind, TranscriptionSystem};
//! # struct Plain;
//! # impl TranscriptionSystem for Plain {
//! #     fn resolve(&self, g: &str) -> SoundDescriptor {
//! #         match g {
//! #             "+" | "_" => SoundDescriptor::marker(g),
//! #             _ => SoundDescriptor {
//! #                 grapheme: g.to_string(),
//! #                 name: format!("{g} consonant"),
//! #                 kind: SoundKind::Consonant,
//! #                 features: [g.to_string()].into_iter().collect(),
//! #             },
//! #         }
//! #     }
//! # }
//!
//! let languages = "ID,Name,Glottocode\nAnyi,Anyi,anyi1247\n";
//! let parameters = "ID,Name,Concepticon_ID,Concepticon_Gloss\nall,all,98,ALL\n";
//! let forms = "ID,Language_ID,Parameter_ID,Value,Form,Segments\n\
//!     1,Anyi,all,nn,nn,n n\n";
//!
//! let dataset = Dataset::from_readers(
//!     "dummy",
//!     languages.as_bytes(),
//!     parameters.as_bytes(),
//!     forms.as_bytes(),
//! )?;
//!
//! let wordlist = Wordlist::new(vec![dataset], Arc::new(Plain))?;
//! assert_eq!(wordlist.width(), 1);
//! assert_eq!(wordlist.height(), 1);
//!
//! let anyi = wordlist.language_idx("dummy-Anyi").unwrap();
//! let form = wordlist.language(anyi).forms()[0];
//! assert_eq!(wordlist.phoneme_strings(form).unwrap(), vec!["n", "n"]);
//! assert_eq!(wordlist.sound_inventory(anyi).len(), 1);
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// CLDFデータセットの入力表現
pub mod dataset;

/// エラー型の定義
pub mod errors;

/// 特徴量評価の契約
pub mod features;

/// 挿入順を保つ名前付きコレクション
pub mod index;

/// 音素インベントリと類似度計算
pub mod inventory;

/// エンティティグラフの型定義
pub mod models;

/// 転写システムのインターフェース
pub mod transcription;

/// 内部ユーティリティ関数
pub mod utils;

/// 転写検証と正規化
pub mod validate;

/// 語彙リストの集約
pub mod wordlist;

#[cfg(test)]
mod test_utils;

// Re-exports
pub use dataset::Dataset;
pub use errors::{LexicoreError, Result};
pub use inventory::{Aspect, Inventory};
pub use wordlist::Wordlist;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
