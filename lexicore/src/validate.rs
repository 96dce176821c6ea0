//! 転写検証と正規化
//!
//! このモジュールは、一つのフォームの解決済み記述子列を音韻分析に使える
//! 形へ正規化する純粋関数を提供します。隠れた状態はなく、同じ入力は常に
//! 同じ出力を生みます。

use crate::transcription::SoundDescriptor;

/// 解決済みの記述子列を検証・正規化します。
///
/// 適用される規則は一つだけです:
///
/// - 先頭と末尾のマーカー（形態素境界・語境界など）はすべて取り除く
/// - 内部の連続するマーカーの並びは、一つの正準的な`+`境界に畳み込む
/// - いずれかの記述子が未知音の場合、列全体を棄却する
///   （音韻分析は完全な解決を要求します。部分的な解決は認めません）
///
/// # 戻り値
///
/// 正規化された列を返します。棄却された場合、および正規化の結果が
/// 空になった場合は`None`を返します。
///
/// # 例
///
/// ```
/// use lexicore::transcription::SoundDescriptor;
/// use lexicore::validate::valid_sounds;
///
/// let marker = SoundDescriptor::marker("+");
/// let unknown = SoundDescriptor::unknown("?");
/// assert!(valid_sounds(&[marker.clone(), marker.clone()]).is_none());
/// assert!(valid_sounds(&[unknown]).is_none());
/// ```
pub fn valid_sounds(sounds: &[SoundDescriptor]) -> Option<Vec<SoundDescriptor>> {
    if sounds.is_empty() || sounds.iter().any(|s| s.kind.is_unknown()) {
        return None;
    }
    let mut out: Vec<SoundDescriptor> = vec![];
    let mut pending_boundary = false;
    for sound in sounds {
        if sound.kind.is_marker() {
            pending_boundary = true;
            continue;
        }
        if pending_boundary && !out.is_empty() {
            out.push(SoundDescriptor::marker("+"));
        }
        pending_boundary = false;
        out.push(sound.clone());
    }
    if out.is_empty() {
        return None;
    }
    Some(out)
}
