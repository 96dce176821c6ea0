//! 転写システムのインターフェース
//!
//! このモジュールは、生の書記素を正準的な音素記述子へ解決する外部協調者
//! （転写システム）の契約を定義します。転写システムは純粋関数として扱われ、
//! 常に明示的な依存としてコンストラクタに渡されます。暗黙のグローバルな
//! デフォルトは存在しません。

use std::collections::BTreeSet;

use crate::utils::jaccard;

/// 記述子の分類タグ
///
/// 転写システムが書記素に割り当てる音の種類です。実行時の型分岐の代わりに、
/// このタグ付き列挙型のバリアント別アクセサを使用します。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// 子音
    Consonant,
    /// 母音
    Vowel,
    /// 二重母音
    Diphthong,
    /// 子音クラスター
    Cluster,
    /// 声調
    Tone,
    /// 形態素境界などのマーカー
    Marker,
    /// 転写システムが解決できなかった記号
    UnknownSound,
}

impl SoundKind {
    /// 分類タグの名前を返します。
    pub fn name(self) -> &'static str {
        match self {
            Self::Consonant => "consonant",
            Self::Vowel => "vowel",
            Self::Diphthong => "diphthong",
            Self::Cluster => "cluster",
            Self::Tone => "tone",
            Self::Marker => "marker",
            Self::UnknownSound => "unknownsound",
        }
    }

    /// 子音的な音（子音またはクラスター）かどうかを返します。
    pub fn is_consonantal(self) -> bool {
        matches!(self, Self::Consonant | Self::Cluster)
    }

    /// 母音的な音（母音または二重母音）かどうかを返します。
    pub fn is_vocalic(self) -> bool {
        matches!(self, Self::Vowel | Self::Diphthong)
    }

    /// マーカーかどうかを返します。
    pub fn is_marker(self) -> bool {
        matches!(self, Self::Marker)
    }

    /// 未知音かどうかを返します。
    pub fn is_unknown(self) -> bool {
        matches!(self, Self::UnknownSound)
    }

    /// 音韻的素性を持たない種類（マーカーまたは未知音)かどうかを返します。
    ///
    /// この種類の音は自分自身とのみ一致します（類似度1）。それ以外との
    /// 類似度は常に0です。
    pub fn is_featureless(self) -> bool {
        matches!(self, Self::Marker | Self::UnknownSound)
    }
}

/// 転写システムによる書記素の解決結果
///
/// 正準文字列・分類タグ・素性集合を保持します。正準文字列が一致する
/// 二つの記述子は同じ音を表します。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundDescriptor {
    /// 正準的な音素文字列（コーパス全体での重複排除キー）
    pub grapheme: String,

    /// 人間可読な名前（例: "voiced bilabial nasal consonant"）
    pub name: String,

    /// 分類タグ
    pub kind: SoundKind,

    /// 素性集合（調音位置・調音方法・発声など）
    pub features: BTreeSet<String>,
}

/// 量的素性として扱う素性名。`*_by_quality`ビューの計算で取り除かれます。
const QUANTITY_FEATURES: [&str; 4] = ["long", "mid-long", "ultra-long", "ultra-short"];

impl SoundDescriptor {
    /// 未知音の記述子を生成します。
    pub fn unknown<S: Into<String>>(grapheme: S) -> Self {
        Self {
            grapheme: grapheme.into(),
            name: "unknownsound".to_string(),
            kind: SoundKind::UnknownSound,
            features: BTreeSet::new(),
        }
    }

    /// マーカーの記述子を生成します。
    pub fn marker<S: Into<String>>(grapheme: S) -> Self {
        Self {
            grapheme: grapheme.into(),
            name: "marker".to_string(),
            kind: SoundKind::Marker,
            features: BTreeSet::new(),
        }
    }

    /// 量的素性（長短など）を取り除いた音質キーを返します。
    ///
    /// 長母音とその短い対応音は同じ音質キーを持ちます。
    /// [`Inventory`](crate::inventory::Inventory)の`*_by_quality`ビューが
    /// 長短のペアを一つの音質エントリに畳み込む際に使用します。
    pub fn quality_key(&self) -> String {
        let mut parts: Vec<&str> = self
            .features
            .iter()
            .map(String::as_str)
            .filter(|f| !QUANTITY_FEATURES.contains(f))
            .collect();
        parts.push(self.kind.name());
        parts.join(" ")
    }

    /// 量的素性を持つかどうかを返します。
    pub fn has_quantity(&self) -> bool {
        QUANTITY_FEATURES.iter().any(|q| self.features.contains(*q))
    }
}

/// 書記素を正準的な音素記述子へ解決する転写システム
///
/// 実装は純粋でなければなりません。同じ書記素に対して常に同じ記述子を
/// 返し、解決できない記号には[`SoundKind::UnknownSound`]の記述子を
/// 返します（エラーにはしません）。
pub trait TranscriptionSystem: Send + Sync {
    /// 書記素を記述子へ解決します。
    ///
    /// # 引数
    ///
    /// * `grapheme` - ソースデータセットに書かれたままの転写記号
    fn resolve(&self, grapheme: &str) -> SoundDescriptor;

    /// 二つの記述子の類似度を計算します。
    ///
    /// # 戻り値
    ///
    /// `[0, 1]`の範囲の類似度。デフォルト実装は素性集合のJaccard係数です。
    /// マーカー・未知音の特別扱いはここではなく
    /// [`Sound::similarity`](crate::models::Sound::similarity)が行います。
    fn similarity(&self, a: &SoundDescriptor, b: &SoundDescriptor) -> f64 {
        if a.grapheme == b.grapheme {
            return 1.0;
        }
        let fa = a.features.iter().map(String::as_str).collect();
        let fb = b.features.iter().map(String::as_str).collect();
        jaccard(&fa, &fb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accessors() {
        assert!(SoundKind::Cluster.is_consonantal());
        assert!(SoundKind::Diphthong.is_vocalic());
        assert!(!SoundKind::Vowel.is_consonantal());
        assert!(SoundKind::Marker.is_featureless());
        assert!(SoundKind::UnknownSound.is_featureless());
        assert_eq!(SoundKind::Tone.name(), "tone");
    }

    #[test]
    fn test_quality_key_strips_quantity() {
        let long_a = SoundDescriptor {
            grapheme: "aː".to_string(),
            name: "long unrounded open front vowel".to_string(),
            kind: SoundKind::Vowel,
            features: ["long", "unrounded", "open", "front"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        let short_a = SoundDescriptor {
            grapheme: "a".to_string(),
            name: "unrounded open front vowel".to_string(),
            kind: SoundKind::Vowel,
            features: ["unrounded", "open", "front"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        assert!(long_a.has_quantity());
        assert!(!short_a.has_quantity());
        assert_eq!(long_a.quality_key(), short_a.quality_key());
    }
}
