//! 特徴量評価の契約
//!
//! 特徴量とは、一つの言語を受け取り類型論的な値（真偽値・数値・カテゴリ
//! コード）を返す呼び出し可能な単位です。特徴量のカタログ自体はこの
//! クレートの範囲外ですが、その実行契約をここで定義します:
//!
//! - 各特徴量は必要とするデータを要件として宣言する
//! - 実行前にすべての要件が検査され、一つでも満たされなければ、満たされ
//!   なかった要件の名前をすべて挙げるエラーで呼び出しが拒否される
//!   （fail-fast。部分実行はしない）
//! - 特徴量内部の予期しないエラーは、言語・データセットの文脈とともに
//!   記録された上で再送出される。静かな抑止は下流の集計統計を痕跡なく
//!   破壊するため、決して行わない
//! - 一括実行では(言語, 特徴量)のペア単位で失敗が隔離され、一つの失敗が
//!   コーパス全体の走査を中断しない

use crate::errors::{LexicoreError, Result};
use crate::models::LanguageIdx;
use crate::wordlist::Wordlist;

/// 特徴量が宣言できるデータ要件
///
/// それぞれが一つの言語に対する述語です。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// 空でない音素インベントリを持つこと
    SoundInventory,
    /// 音ごとの出現リストを備えた音素インベントリを持つこと
    InventoryWithOccurrences,
    /// 書記素分節を持つフォームがあること
    SegmentedForms,
    /// 概念に対応づけられたフォームがあること
    ConceptLinkedForms,
}

impl Requirement {
    /// 要件の名前を返します。エラー報告に使われます。
    pub fn name(self) -> &'static str {
        match self {
            Self::SoundInventory => "inventory",
            Self::InventoryWithOccurrences => "inventory_with_occurrences",
            Self::SegmentedForms => "graphemes",
            Self::ConceptLinkedForms => "concepts",
        }
    }

    /// 言語が要件を満たすかどうかを検査します。
    pub fn check(self, wordlist: &Wordlist, language: LanguageIdx) -> bool {
        match self {
            Self::SoundInventory => !wordlist.sound_inventory(language).is_empty(),
            Self::InventoryWithOccurrences => {
                let inventory = wordlist.sound_inventory(language);
                inventory
                    .iter()
                    .next()
                    .is_some_and(|sound| !sound.occurrences.is_empty())
            }
            Self::SegmentedForms => !wordlist.segmented_forms(language).is_empty(),
            Self::ConceptLinkedForms => !wordlist.language(language).concepts().is_empty(),
        }
    }
}

/// 特徴量の計算結果
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
    /// 真偽値
    Bool(bool),
    /// 整数値
    Int(i64),
    /// 実数値
    Float(f64),
    /// カテゴリコード
    Category(String),
    /// 必要なデータが欠けていることを示す番兵値
    Missing,
}

/// 一つの類型論的特徴量
pub trait Feature {
    /// 特徴量の識別子を返します。
    fn id(&self) -> &str;

    /// この特徴量が宣言する要件を返します。
    fn requires(&self) -> &[Requirement];

    /// 特徴量を計算します。
    ///
    /// 要件検査は呼び出し側（[`apply`]）の責任です。この関数が直接呼ばれる
    /// ことは想定されていません。
    fn compute(&self, wordlist: &Wordlist, language: LanguageIdx) -> Result<FeatureValue>;
}

/// クロージャから特徴量を作る便利型
pub struct FeatureFn<F> {
    id: String,
    requires: Vec<Requirement>,
    func: F,
}

impl<F> FeatureFn<F>
where
    F: Fn(&Wordlist, LanguageIdx) -> Result<FeatureValue>,
{
    /// 新しい特徴量を作成します。
    pub fn new<S: Into<String>>(id: S, requires: Vec<Requirement>, func: F) -> Self {
        Self {
            id: id.into(),
            requires,
            func,
        }
    }
}

impl<F> Feature for FeatureFn<F>
where
    F: Fn(&Wordlist, LanguageIdx) -> Result<FeatureValue>,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn requires(&self) -> &[Requirement] {
        &self.requires
    }

    fn compute(&self, wordlist: &Wordlist, language: LanguageIdx) -> Result<FeatureValue> {
        (self.func)(wordlist, language)
    }
}

/// 要件検査付きで特徴量を一つの言語に適用します。
///
/// # エラー
///
/// 満たされなかった要件がある場合、その名前をすべて挙げる
/// [`LexicoreError::MissingRequirement`]を返し、計算本体は実行されません。
/// 計算内部のエラーは言語・データセットの文脈を記録した上でそのまま
/// 返されます。
pub fn apply(
    feature: &dyn Feature,
    wordlist: &Wordlist,
    language: LanguageIdx,
) -> Result<FeatureValue> {
    let missing: Vec<&'static str> = feature
        .requires()
        .iter()
        .filter(|requirement| !requirement.check(wordlist, language))
        .map(|requirement| requirement.name())
        .collect();
    if !missing.is_empty() {
        return Err(LexicoreError::missing_requirement(feature.id(), missing));
    }
    feature.compute(wordlist, language).map_err(|e| {
        let lang = wordlist.language(language);
        log::debug!(
            "feature '{}' failed; dataset: {}; language: {}",
            feature.id(),
            lang.dataset,
            lang.id
        );
        e
    })
}

/// 一括実行での一つの(言語, 特徴量)ペアの結果
pub struct FeatureOutcome {
    /// 対象の言語
    pub language: LanguageIdx,
    /// 特徴量の識別子
    pub feature: String,
    /// 計算結果。失敗も観測可能な形で保持されます。
    pub result: Result<FeatureValue>,
}

/// 特徴量のコレクション
///
/// 宣言された順序で適用されます。
pub struct FeatureCollection {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureCollection {
    /// 新しいコレクションを作成します。
    pub fn new(features: Vec<Box<dyn Feature>>) -> Self {
        Self { features }
    }

    /// 特徴量の数を返します。
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// コレクションが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// すべての特徴量をすべての言語に適用します。
    ///
    /// 失敗は(言語, 特徴量)のペア単位で隔離されます。一つのペアの失敗が
    /// 走査全体を中断することはなく、失敗は警告として記録された上で
    /// 結果列に保持されます。
    pub fn apply_all(&self, wordlist: &Wordlist) -> Vec<FeatureOutcome> {
        let mut outcomes = vec![];
        for i in 0..wordlist.width() as u32 {
            let language = LanguageIdx(i);
            for feature in &self.features {
                let result = apply(feature.as_ref(), wordlist, language);
                if let Err(e) = &result {
                    log::warn!(
                        "feature '{}' failed for language '{}': {e}",
                        feature.id(),
                        wordlist.language(language).id
                    );
                }
                outcomes.push(FeatureOutcome {
                    language,
                    feature: feature.id().to_string(),
                    result,
                });
            }
        }
        outcomes
    }
}
