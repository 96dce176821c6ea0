//! 語彙リストの集約モジュール
//!
//! このモジュールは、複数のCLDFデータセットを概念で整列された一つの
//! 相互参照付きエンティティグラフへ集約します。主な機能:
//!
//! - データセットごとの三段階（言語→語義/概念→フォーム）のロードパス
//! - 共有グロスによるデータセット横断の概念統合（メタデータは先勝ち）
//! - 書記素（データセットスコープ）と音素（コーパス全体）の重複排除登録
//! - 言語ごとの音素インベントリの遅延導出とキャッシュ
//! - フォーム単位の表形式エクスポート
//!
//! データセットは呼び出し側が与えた順序で処理されます。順序は共有概念の
//! 記述メタデータがどのデータセットから凍結されるかにのみ影響し、
//! 正しさには影響しません。
//!
//! # 使用例
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
//!     1,Anyi,all,mm,mm,m m\n";
//! let dataset = Dataset::from_readers(
//!     "dummy",
//!     languages.as_bytes(),
//!     parameters.as_bytes(),
//!     forms.as_bytes(),
//! )?;
//!
//! let wordlist = Wordlist::new(vec![dataset], Arc::new(Plain))?;
//! assert_eq!(wordlist.height(), 1);
//! assert_eq!(wordlist.width(), 1);
//! assert_eq!(wordlist.len(), 1);
//!
//! let anyi = wordlist.language_idx("dummy-Anyi").unwrap();
//! assert_eq!(wordlist.language(anyi).forms().len(), 1);
//! assert_eq!(wordlist.sound_inventory(anyi).len(), 1);
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::dataset::{Dataset, ParameterRow};
use crate::errors::{LexicoreError, Result};
use crate::index::{IndexBuilder, IndexedTuple};
use crate::inventory::{Inventory, InventorySound};
use crate::models::{
    Concept, ConceptIdx, Form, FormIdx, Grapheme, GraphemeIdx, Language, LanguageData,
    LanguageIdx, Occurrence, Sense, SenseIdx, Sound, SoundIdx,
};
use crate::transcription::{SoundDescriptor, TranscriptionSystem};
use crate::validate::valid_sounds;

/// 一つのフォームに対する同源語セットへの割り当て
#[derive(Clone, Debug)]
pub struct CognateEntry {
    /// 同源語セットの識別子
    pub cognateset: String,
    /// 寄与・手法フィールド
    pub contribution: Option<String>,
}

/// 被覆率計算の対象となるフォームの側面
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAspect {
    /// すべてのフォーム
    Forms,
    /// 書記素分節を持つフォーム
    SegmentedForms,
    /// 解決済みの音韻列を持つフォーム
    PhonemicForms,
}

/// デフォルトの概念ID導出関数
///
/// パラメータ行からConcepticonグロスを取り出し、空白を除去して返します。
/// 対応がない語義（データセットローカルの語義）では`None`を返します。
pub fn default_concept_id(row: &ParameterRow) -> Option<String> {
    row.concepticon_gloss
        .as_deref()
        .map(str::trim)
        .filter(|gloss| !gloss.is_empty())
        .map(str::to_string)
}

/// 概念で整列された一つ以上のデータセットのコレクション
///
/// ロードは構築時に一度だけ行われ、以降グラフは読み取り専用です。
pub struct Wordlist {
    ts: Arc<dyn TranscriptionSystem>,
    dataset_ids: Vec<String>,
    languages: IndexedTuple<Language>,
    senses: IndexedTuple<Sense>,
    concepts: IndexedTuple<Concept>,
    forms: IndexedTuple<Form>,
    graphemes: IndexedTuple<Grapheme>,
    sounds: IndexedTuple<Sound>,
    /// (音素, 言語) ごとの出現リスト。主レジストリから分離された二次
    /// インデックスで、「この音は何か」と「どこに現れるか」の所有境界を
    /// 分けています。
    sound_occurrences: HashMap<(u32, u32), Vec<Occurrence>>,
    cognates: HashMap<u32, Vec<CognateEntry>>,
    forms_with_phonemes: Vec<FormIdx>,
    forms_with_graphemes: Vec<FormIdx>,
}

impl Wordlist {
    /// データセット列と転写システムからエンティティグラフを構築します。
    ///
    /// 概念の統合キーは[`default_concept_id`]で導出されます。
    ///
    /// # エラー
    ///
    /// フォーム行が未登録の言語・語義を参照した場合は
    /// [`LexicoreError::ReferentialIntegrity`]でロード全体が中断されます。
    /// ソースデータの破損を静かに飲み込むことはありません。
    pub fn new(datasets: Vec<Dataset>, ts: Arc<dyn TranscriptionSystem>) -> Result<Self> {
        Self::with_concept_id_factory(datasets, ts, default_concept_id)
    }

    /// 概念ID導出関数を指定してエンティティグラフを構築します。
    ///
    /// # 引数
    ///
    /// * `datasets` - 処理順に並んだデータセット
    /// * `ts` - 転写システム
    /// * `concept_id_factory` - パラメータ行から統合キーを導出する関数。
    ///   `None`を返した語義はどの概念にも結び付けられません。
    pub fn with_concept_id_factory<F>(
        datasets: Vec<Dataset>,
        ts: Arc<dyn TranscriptionSystem>,
        concept_id_factory: F,
    ) -> Result<Self>
    where
        F: Fn(&ParameterRow) -> Option<String>,
    {
        let mut builder = WordlistBuilder::new(ts);
        for dataset in &datasets {
            builder.add_dataset(dataset, &concept_id_factory)?;
        }
        Ok(builder.freeze())
    }

    /// 構築に使われた転写システムを返します。
    pub fn transcription_system(&self) -> &Arc<dyn TranscriptionSystem> {
        &self.ts
    }

    /// ロード順のデータセットIDを返します。
    pub fn dataset_ids(&self) -> &[String] {
        &self.dataset_ids
    }

    /// 言語のコレクションを返します。
    pub fn languages(&self) -> &IndexedTuple<Language> {
        &self.languages
    }

    /// 語義のコレクションを返します。
    pub fn senses(&self) -> &IndexedTuple<Sense> {
        &self.senses
    }

    /// 概念のコレクションを返します。
    pub fn concepts(&self) -> &IndexedTuple<Concept> {
        &self.concepts
    }

    /// フォームのコレクションを返します。
    pub fn forms(&self) -> &IndexedTuple<Form> {
        &self.forms
    }

    /// 書記素のコレクションを返します。
    pub fn graphemes(&self) -> &IndexedTuple<Grapheme> {
        &self.graphemes
    }

    /// 音素のコレクションを返します。
    pub fn sounds(&self) -> &IndexedTuple<Sound> {
        &self.sounds
    }

    /// グラフの高さ（概念数）を返します。
    pub fn height(&self) -> usize {
        self.concepts.len()
    }

    /// グラフの幅（言語数）を返します。
    pub fn width(&self) -> usize {
        self.languages.len()
    }

    /// フォームの総数を返します。
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// グラフが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// 複合キーから言語の位置を取得します。
    pub fn language_idx(&self, id: &str) -> Option<LanguageIdx> {
        self.languages.idx(id).map(LanguageIdx)
    }

    /// グロスから概念の位置を取得します。
    pub fn concept_idx(&self, gloss: &str) -> Option<ConceptIdx> {
        self.concepts.idx(gloss).map(ConceptIdx)
    }

    /// 複合キーからフォームの位置を取得します。
    pub fn form_idx(&self, id: &str) -> Option<FormIdx> {
        self.forms.idx(id).map(FormIdx)
    }

    /// 位置から言語を取得します。
    pub fn language(&self, idx: LanguageIdx) -> &Language {
        self.languages.at(idx.0)
    }

    /// 位置から語義を取得します。
    pub fn sense(&self, idx: SenseIdx) -> &Sense {
        self.senses.at(idx.0)
    }

    /// 位置から概念を取得します。
    pub fn concept(&self, idx: ConceptIdx) -> &Concept {
        self.concepts.at(idx.0)
    }

    /// 位置からフォームを取得します。
    pub fn form(&self, idx: FormIdx) -> &Form {
        self.forms.at(idx.0)
    }

    /// 位置から書記素を取得します。
    pub fn grapheme(&self, idx: GraphemeIdx) -> &Grapheme {
        self.graphemes.at(idx.0)
    }

    /// 位置から音素を取得します。
    pub fn sound(&self, idx: SoundIdx) -> &Sound {
        self.sounds.at(idx.0)
    }

    /// 解決済みの音韻列を持つフォームの導出ビューを返します。
    pub fn forms_with_phonemes(&self) -> &[FormIdx] {
        &self.forms_with_phonemes
    }

    /// 書記素分節を持つフォームの導出ビューを返します。
    pub fn forms_with_graphemes(&self) -> &[FormIdx] {
        &self.forms_with_graphemes
    }

    /// ある言語の、書記素分節を持つフォームを返します。
    pub fn segmented_forms(&self, idx: LanguageIdx) -> Vec<FormIdx> {
        self.language(idx)
            .forms()
            .iter()
            .copied()
            .filter(|&f| !self.form(f).graphemes.is_empty())
            .collect()
    }

    /// ある言語の、解決済みの音韻列を持つフォームを返します。
    pub fn phonemic_forms(&self, idx: LanguageIdx) -> Vec<FormIdx> {
        self.language(idx)
            .forms()
            .iter()
            .copied()
            .filter(|&f| self.form(f).phonemes.is_some())
            .collect()
    }

    /// ある音素のある言語での出現リストを返します。
    pub fn sound_occurrences(&self, sound: SoundIdx, language: LanguageIdx) -> &[Occurrence] {
        self.sound_occurrences
            .get(&(sound.0, language.0))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// あるフォームの同源語セット割り当てを返します。
    pub fn cognates(&self, form: FormIdx) -> &[CognateEntry] {
        self.cognates
            .get(&form.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// フォームの音韻列を正準文字列の列として返します。
    pub fn phoneme_strings(&self, form: FormIdx) -> Option<Vec<&str>> {
        self.form(form).phonemes().map(|phonemes| {
            phonemes
                .iter()
                .map(|&s| self.sound(s).id.as_str())
                .collect()
        })
    }

    /// ある言語の音素インベントリを返します。
    ///
    /// 初回アクセス時に(音素, 言語)二次インデックスから導出され、以降は
    /// キャッシュされた同じインベントリが返されます。
    pub fn sound_inventory(&self, idx: LanguageIdx) -> &Inventory {
        self.language(idx)
            .inventory
            .get_or_init(|| self.build_inventory(idx))
    }

    fn build_inventory(&self, idx: LanguageIdx) -> Inventory {
        let mut builder = IndexBuilder::new("inventory");
        for (i, sound) in self.sounds.iter().enumerate() {
            let key = (i as u32, idx.0);
            let Some(occurrences) = self.sound_occurrences.get(&key) else {
                continue;
            };
            let mut graphemes_in_source: Vec<String> = vec![];
            for occ in occurrences {
                let segment = &self.form(occ.form).segments[occ.position];
                if !graphemes_in_source.iter().any(|g| g == segment) {
                    graphemes_in_source.push(segment.clone());
                }
            }
            // コーパス挿入順なので言語ごとにも決定的。エントリ数は凍結済み
            // 音素レジストリ（u32位置）の部分集合なので登録は失敗しない。
            let _ = builder
                .get_or_insert_with(&sound.id, || InventorySound {
                    grapheme: sound.id.clone(),
                    descriptor: sound.descriptor.clone(),
                    graphemes_in_source,
                    occurrences: occurrences.clone(),
                })
                .expect("bounded by the frozen sound registry");
        }
        Inventory::from_parts(
            Some(self.language(idx).id.clone()),
            self.ts.clone(),
            builder.freeze(),
        )
    }

    /// 概念ごとに、言語順のフォームリストを返します。
    ///
    /// # 引数
    ///
    /// * `concepts` - 対象とする概念グロス。`None`ですべての概念。
    /// * `languages` - 対象とする言語の複合キー。`None`ですべての言語。
    pub fn iter_forms_by_concepts(
        &self,
        concepts: Option<&[&str]>,
        languages: Option<&[&str]>,
    ) -> Vec<(ConceptIdx, Vec<Vec<FormIdx>>)> {
        let concept_idxs: Vec<ConceptIdx> = match concepts {
            Some(ids) => ids.iter().filter_map(|id| self.concept_idx(id)).collect(),
            None => (0..self.concepts.len() as u32).map(ConceptIdx).collect(),
        };
        let language_idxs: Vec<LanguageIdx> = match languages {
            Some(ids) => ids.iter().filter_map(|id| self.language_idx(id)).collect(),
            None => (0..self.languages.len() as u32).map(LanguageIdx).collect(),
        };
        concept_idxs
            .into_iter()
            .map(|cidx| {
                let per_language = language_idxs
                    .iter()
                    .map(|&lidx| {
                        self.concept(cidx)
                            .forms()
                            .iter()
                            .copied()
                            .filter(|&f| self.form(f).language == lidx)
                            .collect()
                    })
                    .collect();
                (cidx, per_language)
            })
            .collect()
    }

    /// 言語ごとの概念被覆数を言語順で返します。
    ///
    /// 指定された側面を満たすフォームによって証言された、相異なる概念の
    /// 数を数えます。
    pub fn coverage(&self, aspect: FormAspect) -> Vec<(LanguageIdx, usize)> {
        (0..self.languages.len() as u32)
            .map(LanguageIdx)
            .map(|lidx| {
                let mut seen: HashSet<u32> = HashSet::new();
                for &fidx in self.language(lidx).forms() {
                    let form = self.form(fidx);
                    let matches = match aspect {
                        FormAspect::Forms => true,
                        FormAspect::SegmentedForms => !form.graphemes.is_empty(),
                        FormAspect::PhonemicForms => form.phonemes.is_some(),
                    };
                    if matches {
                        if let Some(cidx) = form.concept {
                            seen.insert(cidx.0);
                        }
                    }
                }
                (lidx, seen.len())
            })
            .collect()
    }

    /// フォーム単位の表をTSVとして書き出します。
    ///
    /// 一行が一つのフォームに対応します。ヘッダ行は常に書き出されます。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合は[`LexicoreError::StdIo`]を返します。
    pub fn write_forms<W: Write>(&self, mut wtr: W, options: &ExportOptions) -> Result<()> {
        let header: Vec<&str> = options.columns.iter().map(|c| c.name()).collect();
        writeln!(wtr, "{}", header.join("\t"))?;
        for (i, form) in self.forms.iter().enumerate() {
            let idx = FormIdx(i as u32);
            let language = self.languages.at(form.language.0);
            if let Some(filter) = &options.language_filter {
                if !filter(language) {
                    continue;
                }
            }
            if let Some(filter) = &options.form_filter {
                if !filter(form) {
                    continue;
                }
            }
            let row: Vec<String> = options
                .columns
                .iter()
                .map(|c| self.export_cell(idx, form, language, *c))
                .collect();
            writeln!(wtr, "{}", row.join("\t"))?;
        }
        Ok(())
    }

    fn export_cell(
        &self,
        idx: FormIdx,
        form: &Form,
        language: &Language,
        column: ExportColumn,
    ) -> String {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        match column {
            ExportColumn::FormId => form.id.clone(),
            ExportColumn::LanguageId => language.id.clone(),
            ExportColumn::LanguageName => opt(&language.data.name),
            ExportColumn::Glottocode => opt(&language.data.glottocode),
            ExportColumn::Family => opt(&language.data.family),
            ExportColumn::ConceptId => form
                .concept
                .map(|c| self.concept(c).id.clone())
                .unwrap_or_default(),
            ExportColumn::SenseName => opt(&self.sense(form.sense).name),
            ExportColumn::Value => opt(&form.value),
            ExportColumn::Form => opt(&form.form),
            ExportColumn::Segments => form.segments.join(" "),
            ExportColumn::Phonemes => form
                .phonemes()
                .map(|phonemes| {
                    phonemes
                        .iter()
                        .map(|&s| self.sound(s).id.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default(),
            ExportColumn::Cognates => self
                .cognates
                .get(&idx.0)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| e.cognateset.as_str())
                        .collect::<Vec<_>>()
                        .join(";")
                })
                .unwrap_or_default(),
        }
    }
}

/// エクスポートする列
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportColumn {
    /// フォームの複合キー
    FormId,
    /// 言語の複合キー
    LanguageId,
    /// 言語名
    LanguageName,
    /// Glottologコード
    Glottocode,
    /// 語族
    Family,
    /// 概念グロス
    ConceptId,
    /// 語義ラベル
    SenseName,
    /// ソースの値
    Value,
    /// 正書形
    Form,
    /// 書記素分節（空白区切り）
    Segments,
    /// 正規化済み音韻列（空白区切り）
    Phonemes,
    /// 同源語セット（セミコロン区切り）
    Cognates,
}

impl ExportColumn {
    /// ヘッダ行に使う列名を返します。
    pub fn name(self) -> &'static str {
        match self {
            Self::FormId => "ID",
            Self::LanguageId => "Language_ID",
            Self::LanguageName => "Language_Name",
            Self::Glottocode => "Glottocode",
            Self::Family => "Family",
            Self::ConceptId => "Concept_ID",
            Self::SenseName => "Sense_Name",
            Self::Value => "Value",
            Self::Form => "Form",
            Self::Segments => "Segments",
            Self::Phonemes => "Phonemes",
            Self::Cognates => "Cognates",
        }
    }
}

/// エクスポートの設定
///
/// グラフの部分集合が必要な場合は、グラフを変更するのではなく、ここで
/// フィルタを指定します。
pub struct ExportOptions {
    /// 書き出す列の集合
    pub columns: Vec<ExportColumn>,
    /// 言語フィルタ。`None`ですべての言語。
    pub language_filter: Option<Box<dyn Fn(&Language) -> bool>>,
    /// フォームフィルタ。`None`ですべてのフォーム。
    pub form_filter: Option<Box<dyn Fn(&Form) -> bool>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            columns: vec![
                ExportColumn::FormId,
                ExportColumn::LanguageId,
                ExportColumn::ConceptId,
                ExportColumn::Value,
                ExportColumn::Form,
                ExportColumn::Segments,
            ],
            language_filter: None,
            form_filter: None,
        }
    }
}

/// 構築中の語彙リスト
///
/// 可変のビルダーコレクションを保持し、[`freeze`](Self::freeze)で
/// 読み取り専用の[`Wordlist`]へ変換します。
struct WordlistBuilder {
    ts: Arc<dyn TranscriptionSystem>,
    dataset_ids: Vec<String>,
    languages: IndexBuilder<Language>,
    senses: IndexBuilder<Sense>,
    concepts: IndexBuilder<Concept>,
    forms: IndexBuilder<Form>,
    graphemes: IndexBuilder<Grapheme>,
    sounds: IndexBuilder<Sound>,
    sound_occurrences: HashMap<(u32, u32), Vec<Occurrence>>,
    cognates: HashMap<u32, Vec<CognateEntry>>,
    /// 語義 → 対応づけられた概念
    sense_concepts: HashMap<u32, Option<u32>>,
    /// 言語スコープの概念・語義ビューの初参照検出
    language_concepts_seen: HashSet<(u32, u32)>,
    language_senses_seen: HashSet<(u32, u32)>,
    /// 音素への書記素リンクの重複排除
    sound_graphemes_seen: HashSet<(u32, u32)>,
}

impl WordlistBuilder {
    fn new(ts: Arc<dyn TranscriptionSystem>) -> Self {
        Self {
            ts,
            dataset_ids: vec![],
            languages: IndexBuilder::new("languages"),
            senses: IndexBuilder::new("senses"),
            concepts: IndexBuilder::new("concepts"),
            forms: IndexBuilder::new("forms"),
            graphemes: IndexBuilder::new("graphemes"),
            sounds: IndexBuilder::new("sounds"),
            sound_occurrences: HashMap::new(),
            cognates: HashMap::new(),
            sense_concepts: HashMap::new(),
            language_concepts_seen: HashSet::new(),
            language_senses_seen: HashSet::new(),
            sound_graphemes_seen: HashSet::new(),
        }
    }

    /// 一つのデータセットをグラフへ取り込みます。
    ///
    /// 言語→語義/概念→フォーム→同源語の順でパスを実行します。フォームは
    /// 先行パスで構築済みの言語・語義を参照するため、この順序は必須です。
    fn add_dataset<F>(&mut self, dataset: &Dataset, concept_id_factory: &F) -> Result<()>
    where
        F: Fn(&ParameterRow) -> Option<String>,
    {
        let dsid = dataset.id.as_str();
        self.dataset_ids.push(dsid.to_string());

        for row in &dataset.languages {
            let id = format!("{dsid}-{}", row.id);
            self.languages.insert(
                &id,
                Language {
                    id: id.clone(),
                    dataset: dsid.to_string(),
                    data: LanguageData {
                        name: row.name.clone(),
                        glottocode: row.glottocode.clone(),
                        macroarea: row.macroarea.clone(),
                        latitude: row.latitude,
                        longitude: row.longitude,
                        family: row.family.clone(),
                        subgroup: row.subgroup.clone(),
                    },
                    forms: vec![],
                    senses: vec![],
                    concepts: vec![],
                    inventory: Default::default(),
                },
            )?;
        }

        for row in &dataset.parameters {
            let id = format!("{dsid}-{}", row.id);
            let sense_idx = self.senses.insert(
                &id,
                Sense {
                    id: id.clone(),
                    dataset: dsid.to_string(),
                    name: row.name.clone(),
                    forms: vec![],
                },
            )?;
            let concept_idx = concept_id_factory(row)
                .map(|gloss| gloss.trim().to_string())
                .filter(|gloss| !gloss.is_empty())
                .map(|gloss| -> Result<u32> {
                    // 最初の出現が記述メタデータを凍結し、後続のデータセットは
                    // フォームと語義を蓄積するだけになる
                    let idx = self.concepts.get_or_insert_with(&gloss, || Concept {
                        id: gloss.clone(),
                        name: gloss.to_lowercase(),
                        concepticon_id: row.concepticon_id.clone(),
                        concepticon_gloss: gloss.clone(),
                        forms: vec![],
                        senses: vec![],
                    })?;
                    self.concepts.at_mut(idx).senses.push(SenseIdx(sense_idx));
                    Ok(idx)
                })
                .transpose()?;
            self.sense_concepts.insert(sense_idx, concept_idx);
        }

        for row in &dataset.forms {
            self.add_form(dsid, row)?;
        }

        for row in &dataset.cognates {
            let key = format!("{dsid}-{}", row.form_id);
            let form_idx = self
                .forms
                .idx(&key)
                .ok_or_else(|| LexicoreError::referential_integrity("CognateTable", &key))?;
            self.cognates
                .entry(form_idx)
                .or_default()
                .push(CognateEntry {
                    cognateset: row.cognateset_id.clone(),
                    contribution: row.contribution.clone(),
                });
        }

        Ok(())
    }

    fn add_form(&mut self, dsid: &str, row: &crate::dataset::FormRow) -> Result<()> {
        let id = format!("{dsid}-{}", row.id);
        if self.forms.contains_key(&id) {
            return Err(LexicoreError::duplicate_key("forms", &id));
        }
        let language_key = format!("{dsid}-{}", row.language_id);
        let language_idx = self
            .languages
            .idx(&language_key)
            .ok_or_else(|| LexicoreError::referential_integrity("FormTable", &language_key))?;
        let sense_key = format!("{dsid}-{}", row.parameter_id);
        let sense_idx = self
            .senses
            .idx(&sense_key)
            .ok_or_else(|| LexicoreError::referential_integrity("FormTable", &sense_key))?;
        let concept_idx = self.sense_concepts[&sense_idx];

        // このフォームが次に占める位置。出現情報の登録に先立って確定する。
        let form_idx = FormIdx(self.forms.len() as u32);

        let mut grapheme_idxs = vec![];
        let mut descriptors = vec![];
        for (position, segment) in row.segments.iter().enumerate() {
            let descriptor = self.ts.resolve(segment);
            let grapheme_key = format!("{dsid}-{segment}");
            let grapheme_idx = self.graphemes.get_or_insert_with(&grapheme_key, || Grapheme {
                id: grapheme_key.clone(),
                dataset: dsid.to_string(),
                grapheme: segment.clone(),
                descriptor: descriptor.clone(),
                occurrences: vec![],
            })?;
            self.graphemes
                .at_mut(grapheme_idx)
                .occurrences
                .push(Occurrence {
                    form: form_idx,
                    position,
                });
            if descriptor.kind.is_unknown() {
                log::warn!("unknown sound '{segment}' in form '{id}'");
            } else {
                let sound_idx = self.register_sound(&descriptor)?;
                if self.sound_graphemes_seen.insert((sound_idx, grapheme_idx)) {
                    self.sounds
                        .at_mut(sound_idx)
                        .graphemes
                        .push(GraphemeIdx(grapheme_idx));
                }
                self.sound_occurrences
                    .entry((sound_idx, language_idx))
                    .or_default()
                    .push(Occurrence {
                        form: form_idx,
                        position,
                    });
            }
            grapheme_idxs.push(GraphemeIdx(grapheme_idx));
            descriptors.push(descriptor);
        }

        // 正規化が通ったときのみ音韻列が割り当てられる。正規化は境界列を
        // 正準マーカーに置き換えるため、ここで改めて登録する。
        let phonemes = valid_sounds(&descriptors)
            .map(|cleaned| {
                cleaned
                    .iter()
                    .map(|descriptor| self.register_sound(descriptor).map(SoundIdx))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        self.forms.insert(
            &id,
            Form {
                id: id.clone(),
                dataset: dsid.to_string(),
                language: LanguageIdx(language_idx),
                concept: concept_idx.map(ConceptIdx),
                sense: SenseIdx(sense_idx),
                value: row.value.clone(),
                form: row.form.clone(),
                segments: row.segments.clone(),
                graphemes: grapheme_idxs,
                phonemes,
            },
        )?;

        self.languages.at_mut(language_idx).forms.push(form_idx);
        self.senses.at_mut(sense_idx).forms.push(form_idx);
        if self.language_senses_seen.insert((language_idx, sense_idx)) {
            self.languages
                .at_mut(language_idx)
                .senses
                .push(SenseIdx(sense_idx));
        }
        if let Some(cidx) = concept_idx {
            self.concepts.at_mut(cidx).forms.push(form_idx);
            if self.language_concepts_seen.insert((language_idx, cidx)) {
                self.languages
                    .at_mut(language_idx)
                    .concepts
                    .push(ConceptIdx(cidx));
            }
        }
        Ok(())
    }

    /// 正準文字列によるコーパス全体の音素登録
    fn register_sound(&mut self, descriptor: &SoundDescriptor) -> Result<u32> {
        self.sounds.get_or_insert_with(&descriptor.grapheme, || Sound {
            id: descriptor.grapheme.clone(),
            descriptor: descriptor.clone(),
            graphemes: vec![],
        })
    }

    /// ビルダーを読み取り専用の[`Wordlist`]へ変換します。
    ///
    /// フォーム全体に対する二つの導出ビュー（音韻列あり・分節あり）は
    /// ここで一度だけ計算されます。
    fn freeze(self) -> Wordlist {
        let forms = self.forms.freeze();
        let mut forms_with_phonemes = vec![];
        let mut forms_with_graphemes = vec![];
        for i in 0..forms.len() {
            let idx = FormIdx(i as u32);
            let form = forms.at(idx.0);
            if form.phonemes.is_some() {
                forms_with_phonemes.push(idx);
            }
            if !form.graphemes.is_empty() {
                forms_with_graphemes.push(idx);
            }
        }
        Wordlist {
            ts: self.ts,
            dataset_ids: self.dataset_ids,
            languages: self.languages.freeze(),
            senses: self.senses.freeze(),
            concepts: self.concepts.freeze(),
            forms,
            graphemes: self.graphemes.freeze(),
            sounds: self.sounds.freeze(),
            sound_occurrences: self.sound_occurrences,
            cognates: self.cognates,
            forms_with_phonemes,
            forms_with_graphemes,
        }
    }
}
