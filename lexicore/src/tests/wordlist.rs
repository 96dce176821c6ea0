use crate::dataset::{CognateRow, Dataset, ParameterRow};
use crate::errors::LexicoreError;
use crate::models::SoundIdx;
use crate::test_utils::{form_row, language_row, parameter_row, test_transcription};
use crate::utils::iter_syllables;
use crate::wordlist::{ExportOptions, FormAspect, Wordlist};

/// 二つのデータセットを持つ標準のフィクスチャ
///
/// `ARM`グロスが両方のデータセットに現れ、`LEG`は最初のデータセットに
/// しか現れません。
fn two_datasets() -> Vec<Dataset> {
    let mut ds_a = Dataset::new("carvalhopurus");
    ds_a.languages = vec![
        language_row("Apurina", "Apurinã"),
        language_row("Yine", "Yine"),
    ];
    ds_a.parameters = vec![
        ParameterRow {
            id: "1_arm".to_string(),
            name: Some("arm".to_string()),
            concepticon_id: Some("1673".to_string()),
            concepticon_gloss: Some("ARM".to_string()),
        },
        parameter_row("2_leg", "leg", "LEG"),
    ];
    ds_a.forms = vec![
        form_row("1", "Apurina", "1_arm", "m a n e"),
        form_row("2", "Yine", "1_arm", "m a n"),
        form_row("3", "Apurina", "2_leg", "k i t i"),
    ];

    let mut ds_b = Dataset::new("bodtkhobwa");
    ds_b.languages = vec![language_row("Bwa", "Bwa")];
    ds_b.parameters = vec![ParameterRow {
        id: "arm".to_string(),
        name: Some("upper limb".to_string()),
        concepticon_id: Some("9999".to_string()),
        concepticon_gloss: Some("ARM".to_string()),
    }];
    ds_b.forms = vec![form_row("1", "Bwa", "arm", "b a")];

    vec![ds_a, ds_b]
}

/// 共有グロスによる概念統合と先勝ちメタデータのテスト
#[test]
fn test_concepts_unify_across_datasets() {
    let wl = Wordlist::new(two_datasets(), test_transcription()).unwrap();

    assert_eq!(wl.width(), 3);
    assert_eq!(wl.height(), 2);
    assert_eq!(wl.len(), 4);

    let arm = wl.concept(wl.concept_idx("ARM").unwrap());
    assert_eq!(arm.name, "arm");
    assert_eq!(arm.concepticon_gloss, "ARM");
    // 記述メタデータは最初のデータセットから凍結され、二番目の
    // データセットはフォームと語義を蓄積するだけになる
    assert_eq!(arm.concepticon_id.as_deref(), Some("1673"));
    assert_eq!(arm.senses().len(), 2);
    assert_eq!(arm.forms().len(), 3);

    let leg = wl.concept(wl.concept_idx("LEG").unwrap());
    assert_eq!(leg.forms().len(), 1);
}

/// 複合キーによる言語の分離のテスト
#[test]
fn test_languages_are_dataset_scoped() {
    let wl = Wordlist::new(two_datasets(), test_transcription()).unwrap();
    let apurina = wl.language_idx("carvalhopurus-Apurina").unwrap();
    let bwa = wl.language_idx("bodtkhobwa-Bwa").unwrap();
    assert_eq!(wl.language(apurina).forms().len(), 2);
    assert_eq!(wl.language(bwa).forms().len(), 1);
    assert!(wl.language_idx("Apurina").is_none());
}

/// 同じ入力からの二回のロードが同一のグラフを生むことのテスト
#[test]
fn test_loading_is_deterministic() {
    let wl1 = Wordlist::new(two_datasets(), test_transcription()).unwrap();
    let wl2 = Wordlist::new(two_datasets(), test_transcription()).unwrap();

    assert_eq!(wl1.height(), wl2.height());
    assert_eq!(wl1.width(), wl2.width());
    assert_eq!(wl1.len(), wl2.len());

    let ids1: Vec<&str> = wl1.sounds().iter().map(|s| s.id.as_str()).collect();
    let ids2: Vec<&str> = wl2.sounds().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids1, ids2);

    for i in 0..wl1.width() {
        let idx = crate::models::LanguageIdx(i as u32);
        assert_eq!(wl1.language(idx).id, wl2.language(idx).id);
        assert_eq!(
            wl1.language(idx).forms().len(),
            wl2.language(idx).forms().len()
        );
    }
}

/// 未解決参照によるロード中断のテスト
#[test]
fn test_unresolved_reference_aborts_loading() {
    let mut ds = Dataset::new("broken");
    ds.languages = vec![language_row("Apurina", "Apurinã")];
    ds.parameters = vec![parameter_row("1_arm", "arm", "ARM")];
    ds.forms = vec![form_row("1", "Nope", "1_arm", "m a")];
    let result = Wordlist::new(vec![ds], test_transcription());
    assert!(matches!(
        result,
        Err(LexicoreError::ReferentialIntegrity(_))
    ));
}

/// 重複する識別子によるロード中断のテスト
#[test]
fn test_duplicate_form_id_aborts_loading() {
    let mut ds = Dataset::new("broken");
    ds.languages = vec![language_row("Apurina", "Apurinã")];
    ds.parameters = vec![parameter_row("1_arm", "arm", "ARM")];
    ds.forms = vec![
        form_row("1", "Apurina", "1_arm", "m a"),
        form_row("1", "Apurina", "1_arm", "n e"),
    ];
    let result = Wordlist::new(vec![ds], test_transcription());
    assert!(matches!(result, Err(LexicoreError::DuplicateKey(_))));
}

/// 未知音を含むフォームの扱いのテスト
///
/// 書記素は保持されますが、音韻列は列全体が棄却されます。
#[test]
fn test_unknown_sound_rejects_phonemes_but_keeps_graphemes() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![form_row("1", "Anyi", "all", "X a")];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let anyi = wl.language_idx("dummy-Anyi").unwrap();
    let form_idx = wl.language(anyi).forms()[0];
    let form = wl.form(form_idx);
    assert_eq!(form.segments, vec!["X", "a"]);
    assert_eq!(form.graphemes().len(), 2);
    assert!(form.phonemes().is_none());

    assert_eq!(wl.forms_with_graphemes(), &[form_idx]);
    assert!(wl.forms_with_phonemes().is_empty());
    assert_eq!(wl.segmented_forms(anyi), vec![form_idx]);
    assert!(wl.phonemic_forms(anyi).is_empty());

    // 未知音は音素レジストリに入らない
    assert!(wl.sounds().get("X").is_none());
    assert_eq!(wl.sound_inventory(anyi).len(), 1);
}

/// 境界マーカーの正規化のテスト
///
/// 語境界`_`は正準的な`+`境界へ畳み込まれ、正準マーカーが音素として
/// 登録されます。
#[test]
fn test_word_break_is_normalized_in_phonemes() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![form_row("1", "Anyi", "all", "m a _ n e")];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let anyi = wl.language_idx("dummy-Anyi").unwrap();
    let form_idx = wl.language(anyi).forms()[0];
    assert_eq!(
        wl.phoneme_strings(form_idx).unwrap(),
        vec!["m", "a", "+", "n", "e"]
    );
    assert!(wl.sounds().get("+").is_some());
}

/// 音韻列の形態素境界による音節分割のテスト
#[test]
fn test_phonemes_split_into_syllables() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![form_row("1", "Anyi", "all", "t a k + t a k")];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let anyi = wl.language_idx("dummy-Anyi").unwrap();
    let form_idx = wl.language(anyi).forms()[0];
    let phonemes = wl.phoneme_strings(form_idx).unwrap();
    let syllables: Vec<&[&str]> = iter_syllables(&phonemes).collect();
    assert_eq!(syllables.len(), 2);
    assert_eq!(syllables[0], ["t", "a", "k"]);
    assert_eq!(syllables[1], ["t", "a", "k"]);
}

/// (音素, 言語)二次インデックスのテスト
#[test]
fn test_sound_occurrences_are_indexed_by_language() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi"), language_row("Bia", "Bia")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![
        form_row("1", "Anyi", "all", "m a m a"),
        form_row("2", "Bia", "all", "m a"),
    ];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let anyi = wl.language_idx("dummy-Anyi").unwrap();
    let bia = wl.language_idx("dummy-Bia").unwrap();
    let m = SoundIdx(wl.sounds().idx("m").unwrap());

    let in_anyi = wl.sound_occurrences(m, anyi);
    assert_eq!(in_anyi.len(), 2);
    assert_eq!(in_anyi[0].position, 0);
    assert_eq!(in_anyi[1].position, 2);
    assert_eq!(wl.sound_occurrences(m, bia).len(), 1);
}

/// 同源語セット割り当てのロードのテスト
#[test]
fn test_cognates_are_attached_to_forms() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![form_row("1", "Anyi", "all", "m a")];
    ds.cognates = vec![CognateRow {
        form_id: "1".to_string(),
        cognateset_id: "all-1".to_string(),
        contribution: Some("default".to_string()),
    }];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let form_idx = wl.form_idx("dummy-1").unwrap();
    let entries = wl.cognates(form_idx);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].cognateset, "all-1");
}

/// 存在しないフォームを参照する同源語行のテスト
#[test]
fn test_cognate_with_unresolved_form_aborts_loading() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("all", "all", "ALL")];
    ds.forms = vec![form_row("1", "Anyi", "all", "m a")];
    ds.cognates = vec![CognateRow {
        form_id: "99".to_string(),
        cognateset_id: "all-1".to_string(),
        contribution: None,
    }];
    let result = Wordlist::new(vec![ds], test_transcription());
    assert!(matches!(
        result,
        Err(LexicoreError::ReferentialIntegrity(_))
    ));
}

/// 概念ごと・言語ごとのフォーム走査のテスト
#[test]
fn test_iter_forms_by_concepts() {
    let wl = Wordlist::new(two_datasets(), test_transcription()).unwrap();
    let rows = wl.iter_forms_by_concepts(Some(&["ARM"]), None);
    assert_eq!(rows.len(), 1);
    let (cidx, per_language) = &rows[0];
    assert_eq!(wl.concept(*cidx).id, "ARM");
    // 言語順: Apurina, Yine, Bwa
    assert_eq!(per_language.len(), 3);
    assert_eq!(per_language[0].len(), 1);
    assert_eq!(per_language[1].len(), 1);
    assert_eq!(per_language[2].len(), 1);

    let filtered = wl.iter_forms_by_concepts(Some(&["ARM"]), Some(&["carvalhopurus-Yine"]));
    assert_eq!(filtered[0].1.len(), 1);
    assert_eq!(filtered[0].1[0].len(), 1);
}

/// 言語ごとの概念被覆数のテスト
#[test]
fn test_coverage_counts_distinct_concepts() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![
        parameter_row("arm", "arm", "ARM"),
        parameter_row("leg", "leg", "LEG"),
    ];
    ds.forms = vec![
        form_row("1", "Anyi", "arm", "m a n e"),
        form_row("2", "Anyi", "leg", ""),
    ];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    let by_forms = wl.coverage(FormAspect::Forms);
    let by_segments = wl.coverage(FormAspect::SegmentedForms);
    let by_phonemes = wl.coverage(FormAspect::PhonemicForms);
    assert_eq!(by_forms[0].1, 2);
    assert_eq!(by_segments[0].1, 1);
    assert_eq!(by_phonemes[0].1, 1);
}

/// フォーム単位のTSVエクスポートのテスト
#[test]
fn test_write_forms_as_tsv() {
    let wl = Wordlist::new(two_datasets(), test_transcription()).unwrap();
    let mut out = vec![];
    wl.write_forms(&mut out, &ExportOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "ID\tLanguage_ID\tConcept_ID\tValue\tForm\tSegments");
    assert_eq!(
        lines[1],
        "carvalhopurus-1\tcarvalhopurus-Apurina\tARM\tmane\tmane\tm a n e"
    );
}

/// エクスポートフィルタのテスト
#[test]
fn test_write_forms_with_language_filter() {
    let wl = Wordlist::new(two_datasets(), test_transcription()).unwrap();
    let options = ExportOptions {
        language_filter: Some(Box::new(|lang| lang.dataset == "bodtkhobwa")),
        ..Default::default()
    };
    let mut out = vec![];
    wl.write_forms(&mut out, &options).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().nth(1).unwrap().starts_with("bodtkhobwa-1"));
}

/// Concepticon対応のない語義が概念に結び付かないことのテスト
#[test]
fn test_local_sense_without_gloss_has_no_concept() {
    let mut ds = Dataset::new("dummy");
    ds.languages = vec![language_row("Anyi", "Anyi")];
    ds.parameters = vec![parameter_row("local", "some local sense", "")];
    ds.forms = vec![form_row("1", "Anyi", "local", "m a")];
    let wl = Wordlist::new(vec![ds], test_transcription()).unwrap();

    assert_eq!(wl.height(), 0);
    let form = wl.form(wl.form_idx("dummy-1").unwrap());
    assert!(form.concept.is_none());
    let anyi = wl.language_idx("dummy-Anyi").unwrap();
    assert!(wl.language(anyi).concepts().is_empty());
    assert_eq!(wl.language(anyi).senses().len(), 1);
}
