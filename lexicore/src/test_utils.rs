//! テスト用ユーティリティ
//!
//! テストコードで使用する決定的な転写システムと、メモリ上のダミー
//! データセットを構築するための関数を提供します。

use std::sync::Arc;

use crate::dataset::{FormRow, LanguageRow, ParameterRow};
use crate::transcription::{SoundDescriptor, SoundKind, TranscriptionSystem};

/// 小さな素性表に基づくテスト用転写システム
///
/// 少数の母音・子音・声調・マーカーだけを解決し、それ以外の記号はすべて
/// 未知音になります。`:`は`ː`へ正規化されるため、`a:`と`aː`は同じ正準音に
/// 解決されます。
pub(crate) struct TestTranscription;

/// 書記素に対する(分類, 素性)の固定表
fn lookup(grapheme: &str) -> Option<(SoundKind, &'static [&'static str])> {
    use SoundKind::*;
    let entry: (SoundKind, &'static [&'static str]) = match grapheme {
        "a" => (Vowel, &["unrounded", "open", "front"]),
        "e" => (Vowel, &["unrounded", "mid", "front"]),
        "i" => (Vowel, &["unrounded", "close", "front"]),
        "o" => (Vowel, &["rounded", "mid", "back"]),
        "u" => (Vowel, &["rounded", "close", "back"]),
        "aː" => (Vowel, &["long", "unrounded", "open", "front"]),
        "ă" => (Vowel, &["ultra-short", "unrounded", "open", "front"]),
        "uː" => (Vowel, &["long", "rounded", "close", "back"]),
        "au" => (Diphthong, &["unrounded", "open", "front", "to-rounded", "to-close"]),
        "p" => (Consonant, &["voiceless", "bilabial", "stop"]),
        "b" => (Consonant, &["voiced", "bilabial", "stop"]),
        "t" => (Consonant, &["voiceless", "alveolar", "stop"]),
        "d" => (Consonant, &["voiced", "alveolar", "stop"]),
        "k" => (Consonant, &["voiceless", "velar", "stop"]),
        "g" => (Consonant, &["voiced", "velar", "stop"]),
        "m" => (Consonant, &["voiced", "bilabial", "nasal"]),
        "n" => (Consonant, &["voiced", "alveolar", "nasal"]),
        "s" => (Consonant, &["voiceless", "alveolar", "fricative"]),
        "kp" => (Cluster, &["voiceless", "labial-velar", "stop"]),
        "⁵⁵" => (Tone, &["high", "level"]),
        _ => return None,
    };
    Some(entry)
}

impl TranscriptionSystem for TestTranscription {
    fn resolve(&self, grapheme: &str) -> SoundDescriptor {
        let normalized = grapheme.replace(':', "ː");
        if matches!(normalized.as_str(), "+" | "_" | "#") {
            return SoundDescriptor::marker(normalized);
        }
        match lookup(&normalized) {
            Some((kind, features)) => SoundDescriptor {
                name: format!("{} {}", features.join(" "), kind.name()),
                grapheme: normalized,
                kind,
                features: features.iter().map(|f| f.to_string()).collect(),
            },
            None => SoundDescriptor::unknown(normalized),
        }
    }
}

/// テスト用転写システムを共有ポインタとして返します。
pub(crate) fn test_transcription() -> Arc<dyn TranscriptionSystem> {
    Arc::new(TestTranscription)
}

/// 言語行を作成します。
pub(crate) fn language_row(id: &str, name: &str) -> LanguageRow {
    LanguageRow {
        id: id.to_string(),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// パラメータ行を作成します。`gloss`が空文字列の場合、Concepticon対応の
/// ない語義になります。
pub(crate) fn parameter_row(id: &str, name: &str, gloss: &str) -> ParameterRow {
    ParameterRow {
        id: id.to_string(),
        name: Some(name.to_string()),
        concepticon_id: None,
        concepticon_gloss: (!gloss.is_empty()).then(|| gloss.to_string()),
    }
}

/// フォーム行を作成します。`segments`は空白区切りで、空文字列の場合は
/// 分節なしのフォームになります。
pub(crate) fn form_row(id: &str, language: &str, parameter: &str, segments: &str) -> FormRow {
    FormRow {
        id: id.to_string(),
        language_id: language.to_string(),
        parameter_id: parameter.to_string(),
        value: Some(segments.split_whitespace().collect::<String>()).filter(|v| !v.is_empty()),
        form: Some(segments.split_whitespace().collect::<String>()).filter(|v| !v.is_empty()),
        segments: segments.split_whitespace().map(str::to_string).collect(),
    }
}
