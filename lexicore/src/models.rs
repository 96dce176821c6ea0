//! エンティティグラフの基本モデル
//!
//! このモジュールは、[`Wordlist`](crate::wordlist::Wordlist)が構築する
//! エンティティ（言語・語義・概念・フォーム・書記素・音素）と、それらを
//! 相互参照するための型付きインデックスを定義します。
//!
//! エンティティ間の参照はすべて、背後のコレクションへのu32位置を包む
//! 軽量なインデックス構造体で表現されます。エンティティは単一のロード
//! パスで一度だけ作成され、その後は構造的に不変です。

use std::sync::OnceLock;

use crate::inventory::Inventory;
use crate::transcription::{SoundDescriptor, TranscriptionSystem};

/// 言語コレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LanguageIdx(pub(crate) u32);

/// 語義コレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SenseIdx(pub(crate) u32);

/// 概念コレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConceptIdx(pub(crate) u32);

/// フォームコレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FormIdx(pub(crate) u32);

/// 書記素コレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GraphemeIdx(pub(crate) u32);

/// 音素コレクション内の位置
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SoundIdx(pub(crate) u32);

/// 一つの出現位置
///
/// ある書記素または音素が、どのフォームの何番目の分節に現れたかを表します。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occurrence {
    /// 出現したフォーム
    pub form: FormIdx,
    /// フォームの分節列の中での位置
    pub position: usize,
}

/// 言語行から取り込まれる記述メタデータ
///
/// すべての列が欠けうるため、明示的な`Option`フィールドで保持します。
#[derive(Clone, Debug, Default)]
pub struct LanguageData {
    /// 言語名
    pub name: Option<String>,
    /// Glottologコード
    pub glottocode: Option<String>,
    /// マクロエリア
    pub macroarea: Option<String>,
    /// 緯度
    pub latitude: Option<f64>,
    /// 経度
    pub longitude: Option<f64>,
    /// 語族
    pub family: Option<String>,
    /// 下位グループ
    pub subgroup: Option<String>,
}

/// 一つのデータセットに証言された一つの言語変種
///
/// 識別子は`{データセットID}-{ローカルID}`の複合キーです。同じ現実の言語が
/// 二つのデータセットに現れた場合、音韻・語彙の証言がソースごとに異なるため、
/// 意図的に統合せず二つの別エンティティとして扱います。
pub struct Language {
    /// 複合キー
    pub id: String,
    /// 所属データセットID
    pub dataset: String,
    /// 記述メタデータ（読み取り専用）
    pub data: LanguageData,
    pub(crate) forms: Vec<FormIdx>,
    pub(crate) senses: Vec<SenseIdx>,
    pub(crate) concepts: Vec<ConceptIdx>,
    pub(crate) inventory: OnceLock<Inventory>,
}

impl Language {
    /// この言語に属するフォームを挿入順で返します。
    pub fn forms(&self) -> &[FormIdx] {
        &self.forms
    }

    /// この言語のフォームが参照した語義を初出順で返します。
    pub fn senses(&self) -> &[SenseIdx] {
        &self.senses
    }

    /// この言語のフォームが参照した概念を初出順で返します。
    pub fn concepts(&self) -> &[ConceptIdx] {
        &self.concepts
    }
}

/// 一つのソースデータセットに現れた語義ラベル
///
/// 識別子は`{データセットID}-{ローカルID}`です。等価性は識別子ではなく
/// 正規化された名前テキストで判定されます（概念の同一性より意図的に緩い、
/// 値としての等価性です）。
#[derive(Debug)]
pub struct Sense {
    /// 複合キー
    pub id: String,
    /// 所属データセットID
    pub dataset: String,
    /// データセット固有の語義ラベル
    pub name: Option<String>,
    pub(crate) forms: Vec<FormIdx>,
}

impl Sense {
    /// この語義の下に集められたフォームを返します。
    pub fn forms(&self) -> &[FormIdx] {
        &self.forms
    }

    /// 等価性判定に使う正規化された名前を返します。
    fn normalized_name(&self) -> Option<String> {
        self.name.as_deref().map(|n| n.trim().to_lowercase())
    }
}

impl PartialEq for Sense {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_name() == other.normalized_name()
    }
}

/// データセット横断の意味単位
///
/// 統制語彙のグロス（Concepticonグロス）を共有するすべてのデータセットから
/// フォームと語義を蓄積します。識別子は空白を除去したグロス文字列そのもの
/// （大文字小文字は保持）。記述メタデータは最初のデータセットのものが
/// 勝ちます。
pub struct Concept {
    /// 共有グロス（識別子）
    pub id: String,
    /// 人間可読な名前（小文字化したグロス）
    pub name: String,
    /// Concepticonの標準ID（最初の出現から凍結）
    pub concepticon_id: Option<String>,
    /// Concepticonの標準グロス
    pub concepticon_gloss: String,
    pub(crate) forms: Vec<FormIdx>,
    pub(crate) senses: Vec<SenseIdx>,
}

impl Concept {
    /// すべてのデータセットから蓄積されたフォームを返します。
    pub fn forms(&self) -> &[FormIdx] {
        &self.forms
    }

    /// このグロスに対応づけられた語義を返します。
    pub fn senses(&self) -> &[SenseIdx] {
        &self.senses
    }
}

/// 一つのデータセットにおける一つの証言された語形
///
/// 識別子は`{データセットID}-{ローカルID}`です。言語・概念（欠けうる）・
/// 語義への参照を保持します。書記素分節は常に保持されますが、音韻列は
/// すべての分節が既知の音に解決された場合にのみ設定されます。
pub struct Form {
    /// 複合キー
    pub id: String,
    /// 所属データセットID
    pub dataset: String,
    /// この語形が属する言語
    pub language: LanguageIdx,
    /// 対応づけられた概念。語義にConcepticon対応がない場合は`None`です。
    pub concept: Option<ConceptIdx>,
    /// ソースデータセットでの語義
    pub sense: SenseIdx,
    /// ソースに書かれたままの値
    pub value: Option<String>,
    /// 正書形
    pub form: Option<String>,
    /// ソースが与えた分かち書き分節列（生の書記素）
    pub segments: Vec<String>,
    pub(crate) graphemes: Vec<GraphemeIdx>,
    pub(crate) phonemes: Option<Vec<SoundIdx>>,
}

impl Form {
    /// 分節列に対応する書記素エンティティを返します。
    ///
    /// ソースが分節を与えなかった場合は空です。
    pub fn graphemes(&self) -> &[GraphemeIdx] {
        &self.graphemes
    }

    /// 正規化済みの音韻列を返します。
    ///
    /// 分節のいずれかが未知音に解決された場合、列全体が`None`になります。
    /// 部分的な解決は音韻分析に使えないためです。
    pub fn phonemes(&self) -> Option<&[SoundIdx]> {
        self.phonemes.as_deref()
    }
}

/// コーパスに証言された正規化済みの入力記号
///
/// 識別子は`{データセットID}-{記号}`です。正書法の慣習はソースごとに
/// 異なるため、書記素はデータセットスコープで重複排除されます。
pub struct Grapheme {
    /// 複合キー
    pub id: String,
    /// 所属データセットID
    pub dataset: String,
    /// 記号そのもの
    pub grapheme: String,
    /// 転写システムによる解決結果
    pub descriptor: SoundDescriptor,
    pub(crate) occurrences: Vec<Occurrence>,
}

impl Grapheme {
    /// この記号のすべての出現を記録順で返します。
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }
}

/// 転写システムが解決した正準的な音素
///
/// 書記素と異なり、コーパス全体で正準文字列により重複排除されます。
/// 言語ごとの出現リストは[`Wordlist`](crate::wordlist::Wordlist)側の
/// 二次インデックスに保持されます。
pub struct Sound {
    /// 正準文字列（識別子）
    pub id: String,
    /// 転写システムの記述子
    pub descriptor: SoundDescriptor,
    pub(crate) graphemes: Vec<GraphemeIdx>,
}

impl Sound {
    /// この音に解決されたソース書記素を初出順で返します。
    pub fn graphemes(&self) -> &[GraphemeIdx] {
        &self.graphemes
    }

    /// 二つの音の類似度を計算します。
    ///
    /// 計算は転写システムに委譲されますが、マーカーと未知音は比較可能な
    /// 音韻素性を持たないため、自分自身とのみ一致します（類似度1）。
    /// それ以外との類似度は常に0です。
    pub fn similarity(&self, other: &Sound, ts: &dyn TranscriptionSystem) -> f64 {
        descriptor_similarity(&self.descriptor, &other.descriptor, ts)
    }
}

impl PartialEq for Sound {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// マーカー・未知音の特別規則を適用した記述子類似度
pub(crate) fn descriptor_similarity(
    a: &SoundDescriptor,
    b: &SoundDescriptor,
    ts: &dyn TranscriptionSystem,
) -> f64 {
    if a.kind.is_featureless() || b.kind.is_featureless() {
        if a.grapheme == b.grapheme {
            return 1.0;
        }
        return 0.0;
    }
    ts.similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sense(id: &str, name: Option<&str>) -> Sense {
        Sense {
            id: id.to_string(),
            dataset: "dummy".to_string(),
            name: name.map(str::to_string),
            forms: vec![],
        }
    }

    #[test]
    fn test_sense_equality_is_by_normalized_name() {
        assert_eq!(sense("a-1", Some("Arm")), sense("b-2", Some("arm ")));
        assert_ne!(sense("a-1", Some("arm")), sense("a-2", Some("hand")));
        // 名前を持たない語義同士は値として等しい
        assert_eq!(sense("a-1", None), sense("b-9", None));
    }
}
