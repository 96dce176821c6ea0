//! 音素インベントリとその類似度計算
//!
//! [`Inventory`]は、一つの言語に証言されたすべての音（または明示的な
//! 書記素リストから臨時に構築された音の集まり）に対する読み取り専用の
//! 問い合わせビューです。型別のサブビュー（子音・母音・声調など）は
//! すべて単一の背後コレクションに対する純粋なフィルタであり、独立した
//! 記憶領域を持ちません。
//!
//! 二つの類似度計算を提供します:
//!
//! - [`strict_similarity`](Inventory::strict_similarity): 正準文字列の
//!   集合に対するJaccard係数
//! - [`approximate_similarity`](Inventory::approximate_similarity): 音の
//!   類似度による貪欲な二部最良マッチ
//!
//! 貪欲マッチは真の割当問題の解ではなく、意図的な近似です。決定的な
//! タイブレーク（挿入順で最初に最高スコアへ到達した相手を確保する）を
//! 持ち、反復しても同じ結果になります。

use std::sync::Arc;

use hashbrown::HashSet;

use crate::errors::Result;
use crate::index::{IndexBuilder, IndexedTuple};
use crate::models::{descriptor_similarity, Occurrence};
use crate::transcription::{SoundDescriptor, SoundKind, TranscriptionSystem};
use crate::utils::jaccard;

/// インベントリ内の一つの音
///
/// コーパス全体の[`Sound`](crate::models::Sound)と異なり、このインベントリの
/// スコープ（一つの言語、または臨時のリスト）での出現情報を持ちます。
pub struct InventorySound {
    /// 正準文字列
    pub grapheme: String,
    /// 転写システムの記述子
    pub descriptor: SoundDescriptor,
    /// この音に解決されたソース書記素（初出順、重複なし）
    pub graphemes_in_source: Vec<String>,
    /// このスコープでの出現。臨時のインベントリでは空です。
    pub occurrences: Vec<Occurrence>,
}

/// サブビューの名前
///
/// 類似度計算の対象となる側面を指定します。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aspect {
    /// すべての音（デフォルト）
    Sounds,
    /// 子音のみ
    Consonants,
    /// 母音のみ
    Vowels,
    /// 音質のみで区別した子音
    ConsonantsByQuality,
    /// 音質のみで区別した母音
    VowelsByQuality,
    /// 子音的な音（子音とクラスター）
    ConsonantSounds,
    /// 母音的な音（母音と二重母音）
    VowelSounds,
    /// 声調
    Tones,
    /// マーカー
    Markers,
    /// クラスター
    Clusters,
    /// 二重母音
    Diphthongs,
    /// 未知音
    UnknownSounds,
}

impl Aspect {
    /// 側面の名前を返します。
    pub fn name(self) -> &'static str {
        match self {
            Self::Sounds => "sounds",
            Self::Consonants => "consonants",
            Self::Vowels => "vowels",
            Self::ConsonantsByQuality => "consonants_by_quality",
            Self::VowelsByQuality => "vowels_by_quality",
            Self::ConsonantSounds => "consonant_sounds",
            Self::VowelSounds => "vowel_sounds",
            Self::Tones => "tones",
            Self::Markers => "markers",
            Self::Clusters => "clusters",
            Self::Diphthongs => "diphthongs",
            Self::UnknownSounds => "unknownsounds",
        }
    }
}

/// デフォルトの側面（すべての音）
const DEFAULT_ASPECTS: [Aspect; 1] = [Aspect::Sounds];

/// 音の読み取り専用コレクション
pub struct Inventory {
    /// 由来した言語の識別子。臨時のインベントリでは`None`です。
    pub id: Option<String>,
    ts: Arc<dyn TranscriptionSystem>,
    sounds: IndexedTuple<InventorySound>,
}

impl Inventory {
    /// 明示的な書記素リストから臨時のインベントリを構築します。
    ///
    /// 各書記素は転写システムで解決され、正準文字列で重複排除されます。
    /// 同じ音へ解決された書記素は一つのエントリに畳み込まれるため、
    /// インベントリの大きさは相異なる正準音の数に等しくなります。
    ///
    /// # エラー
    ///
    /// 相異なる音の数がu32の範囲を超えた場合は
    /// [`LexicoreError::TryFromInt`](crate::errors::LexicoreError::TryFromInt)を
    /// 返します。
    pub fn from_graphemes<I, S>(ts: Arc<dyn TranscriptionSystem>, graphemes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = IndexBuilder::new("inventory");
        for grapheme in graphemes {
            let grapheme = grapheme.as_ref();
            let descriptor = ts.resolve(grapheme);
            let canonical = descriptor.grapheme.clone();
            let idx = builder.get_or_insert_with(&canonical, || InventorySound {
                grapheme: canonical.clone(),
                descriptor,
                graphemes_in_source: vec![],
                occurrences: vec![],
            })?;
            let entry = builder.at_mut(idx);
            if !entry.graphemes_in_source.iter().any(|g| g == grapheme) {
                entry.graphemes_in_source.push(grapheme.to_string());
            }
        }
        Ok(Self {
            id: None,
            ts,
            sounds: builder.freeze(),
        })
    }

    /// 構築済みの音コレクションからインベントリを作成します。
    pub(crate) fn from_parts(
        id: Option<String>,
        ts: Arc<dyn TranscriptionSystem>,
        sounds: IndexedTuple<InventorySound>,
    ) -> Self {
        Self { id, ts, sounds }
    }

    /// 背後の音コレクションを返します。
    pub fn sounds(&self) -> &IndexedTuple<InventorySound> {
        &self.sounds
    }

    /// 正準文字列から音を取得します。
    pub fn get(&self, grapheme: &str) -> Option<&InventorySound> {
        self.sounds.get(grapheme)
    }

    /// 相異なる音の数を返します。
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// インベントリが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// すべての音を挿入順で反復します。
    pub fn iter(&self) -> impl Iterator<Item = &InventorySound> {
        self.sounds.iter()
    }

    fn by_kind(&self, pred: fn(SoundKind) -> bool) -> Vec<&InventorySound> {
        self.sounds.iter().filter(|s| pred(s.descriptor.kind)).collect()
    }

    /// 量的素性だけで区別される音を音質エントリに畳み込みます。
    ///
    /// 長短で区別される変種は、量的素性を取り除いた音質が、量的素性を
    /// 持たない音として既にインベントリに存在する場合に限り除外されます。
    /// 存在しない音質エントリを新たに作ることはなく、量的変種同士が
    /// 互いを消し合うこともありません。
    fn by_quality<'a>(&self, sounds: Vec<&'a InventorySound>) -> Vec<&'a InventorySound> {
        let qualities: Vec<String> = sounds.iter().map(|s| s.descriptor.quality_key()).collect();
        sounds
            .iter()
            .enumerate()
            .filter(|(i, s)| {
                if !s.descriptor.has_quantity() {
                    return true;
                }
                !sounds.iter().enumerate().any(|(j, o)| {
                    !o.descriptor.has_quantity()
                        && o.grapheme != s.grapheme
                        && qualities[j] == qualities[*i]
                })
            })
            .map(|(_, s)| *s)
            .collect()
    }

    /// 子音のサブビューを返します。
    pub fn consonants(&self) -> Vec<&InventorySound> {
        self.by_kind(|k| k == SoundKind::Consonant)
    }

    /// 母音のサブビューを返します。
    pub fn vowels(&self) -> Vec<&InventorySound> {
        self.by_kind(|k| k == SoundKind::Vowel)
    }

    /// 音質のみで区別した子音のサブビューを返します。
    pub fn consonants_by_quality(&self) -> Vec<&InventorySound> {
        self.by_quality(self.consonants())
    }

    /// 音質のみで区別した母音のサブビューを返します。
    pub fn vowels_by_quality(&self) -> Vec<&InventorySound> {
        self.by_quality(self.vowels())
    }

    /// 子音的な音（クラスターを含む）のサブビューを返します。
    pub fn consonant_sounds(&self) -> Vec<&InventorySound> {
        self.by_kind(SoundKind::is_consonantal)
    }

    /// 母音的な音（二重母音を含む）のサブビューを返します。
    pub fn vowel_sounds(&self) -> Vec<&InventorySound> {
        self.by_kind(SoundKind::is_vocalic)
    }

    /// 声調のサブビューを返します。
    pub fn tones(&self) -> Vec<&InventorySound> {
        self.by_kind(|k| k == SoundKind::Tone)
    }

    /// マーカーのサブビューを返します。
    pub fn markers(&self) -> Vec<&InventorySound> {
        self.by_kind(SoundKind::is_marker)
    }

    /// クラスターのサブビューを返します。
    pub fn clusters(&self) -> Vec<&InventorySound> {
        self.by_kind(|k| k == SoundKind::Cluster)
    }

    /// 二重母音のサブビューを返します。
    pub fn diphthongs(&self) -> Vec<&InventorySound> {
        self.by_kind(|k| k == SoundKind::Diphthong)
    }

    /// 未知音のサブビューを返します。
    pub fn unknownsounds(&self) -> Vec<&InventorySound> {
        self.by_kind(SoundKind::is_unknown)
    }

    /// 側面名からサブビューを取得します。
    pub fn aspect(&self, aspect: Aspect) -> Vec<&InventorySound> {
        match aspect {
            Aspect::Sounds => self.sounds.iter().collect(),
            Aspect::Consonants => self.consonants(),
            Aspect::Vowels => self.vowels(),
            Aspect::ConsonantsByQuality => self.consonants_by_quality(),
            Aspect::VowelsByQuality => self.vowels_by_quality(),
            Aspect::ConsonantSounds => self.consonant_sounds(),
            Aspect::VowelSounds => self.vowel_sounds(),
            Aspect::Tones => self.tones(),
            Aspect::Markers => self.markers(),
            Aspect::Clusters => self.clusters(),
            Aspect::Diphthongs => self.diphthongs(),
            Aspect::UnknownSounds => self.unknownsounds(),
        }
    }

    /// すべての音を側面として厳密類似度を計算します。
    ///
    /// [`strict_similarity_by`](Self::strict_similarity_by)を参照してください。
    pub fn strict_similarity(&self, other: &Inventory) -> f64 {
        self.strict_similarity_by(other, &DEFAULT_ASPECTS)
    }

    /// 集合ベースの厳密類似度を計算します。
    ///
    /// 側面ごとに正準文字列の集合のJaccard係数を取り、側面間の算術平均を
    /// 返します。両側とも空の側面は寄与しません。どの側面も寄与しない
    /// 場合は0.0です。計算は対称です。
    pub fn strict_similarity_by(&self, other: &Inventory, aspects: &[Aspect]) -> f64 {
        let mut scores = vec![];
        for &aspect in aspects {
            let a: HashSet<&str> = self
                .aspect(aspect)
                .into_iter()
                .map(|s| s.grapheme.as_str())
                .collect();
            let b: HashSet<&str> = other
                .aspect(aspect)
                .into_iter()
                .map(|s| s.grapheme.as_str())
                .collect();
            if !a.is_empty() || !b.is_empty() {
                scores.push(jaccard(&a, &b));
            }
        }
        mean(&scores)
    }

    /// すべての音を側面として近似類似度を計算します。
    ///
    /// [`approximate_similarity_by`](Self::approximate_similarity_by)を
    /// 参照してください。
    pub fn approximate_similarity(&self, other: &Inventory) -> f64 {
        self.approximate_similarity_by(other, &DEFAULT_ASPECTS)
    }

    /// 貪欲な二部最良マッチによる近似類似度を計算します。
    ///
    /// 側面ごと・方向ごとに、元側の各音に対してまだ確保されていない相手側の
    /// 最高スコアの音を貪欲に確保します。相手側に残った音は0点のペアとして
    /// 数えます。方向スコアは全ペアの平均、側面スコアは両方向の平均、最終
    /// スコアは側面の平均です。
    ///
    /// 片側だけが空の側面は0として寄与し、両側とも空の側面は飛ばされます。
    /// すべての側面が飛ばされた場合は0.0です。
    pub fn approximate_similarity_by(&self, other: &Inventory, aspects: &[Aspect]) -> f64 {
        let mut scores = vec![];
        for &aspect in aspects {
            let a = self.aspect(aspect);
            let b = other.aspect(aspect);
            if !a.is_empty() && !b.is_empty() {
                let forward = self.best_match_score(&a, &b);
                let backward = self.best_match_score(&b, &a);
                scores.push((forward + backward) / 2.0);
            } else if !a.is_empty() || !b.is_empty() {
                scores.push(0.0);
            }
        }
        mean(&scores)
    }

    /// 一方向の貪欲マッチスコアを計算します。
    ///
    /// タイブレークは決定的です: 元側は挿入順に走査され、最高スコアに最初に
    /// 到達した相手側の音が確保されます。正のスコアを持つ相手が残っていない
    /// 音は何も確保しません。
    fn best_match_score(&self, src: &[&InventorySound], tgt: &[&InventorySound]) -> f64 {
        let mut claimed = vec![false; tgt.len()];
        let mut scores = vec![];
        for sound in src {
            let mut best: Option<(usize, f64)> = None;
            for (j, candidate) in tgt.iter().enumerate() {
                if claimed[j] {
                    continue;
                }
                let sim = descriptor_similarity(
                    &sound.descriptor,
                    &candidate.descriptor,
                    self.ts.as_ref(),
                );
                if sim > best.map_or(0.0, |(_, s)| s) {
                    best = Some((j, sim));
                }
            }
            if let Some((j, sim)) = best {
                claimed[j] = true;
                scores.push(sim);
            }
        }
        scores.extend(claimed.iter().filter(|&&c| !c).map(|_| 0.0));
        mean(&scores)
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}
