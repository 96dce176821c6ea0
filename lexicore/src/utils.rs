//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! 主に以下の機能を提供します：
//!
//! - `FromU32`: u32からの型変換トレイト
//! - 音節単位へのグループ化
//! - Jaccard係数

use std::hash::Hash;

use hashbrown::HashSet;

/// u32から他の型への変換を提供するトレイト
///
/// エンティティの位置は一貫してu32で保持されるため、スライスアクセスの際の
/// usizeへの変換をこのトレイトで行います。
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// 解決済みの音韻列を境界マーカーで音節状のグループに分割します。
///
/// [`valid_sounds`](crate::validate::valid_sounds)による正規化後の列を
/// 前提としており、グループ内にマーカーは現れません。空のグループは
/// 生成されません。
///
/// # 例
///
/// ```
/// use lexicore::utils::iter_syllables;
///
/// let tokens = ["t", "a", "k", "+", "t", "a", "k"];
/// let groups: Vec<&[&str]> = iter_syllables(&tokens).collect();
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0], &["t", "a", "k"]);
/// ```
pub fn iter_syllables<'a, S>(sounds: &'a [S]) -> impl Iterator<Item = &'a [S]>
where
    S: AsRef<str>,
{
    sounds
        .split(|s| s.as_ref() == "+")
        .filter(|group| !group.is_empty())
}

/// 二つの集合のJaccard係数を計算します。
///
/// # 戻り値
///
/// `|A ∩ B| / |A ∪ B|`を返します。両方の集合が空の場合は規約として
/// 0.0を返します。
pub fn jaccard<T>(a: &HashSet<T>, b: &HashSet<T>) -> f64
where
    T: Hash + Eq,
{
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
