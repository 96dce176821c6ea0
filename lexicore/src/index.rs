//! 挿入順を保持する一意キーコレクション
//!
//! このモジュールは、エンティティグラフ全体で使われるコレクション規律を提供します:
//!
//! - キーによる検索は O(1)
//! - 反復は最初の挿入順を保持
//! - 作成専用パスでのキー重複はエラー
//!
//! 構築中に使用する可変の[`IndexBuilder`]と、`freeze`によって得られる
//! 読み取り専用の[`IndexedTuple`]の二つの型に明示的に分かれています。
//! ロード完了後のグラフが規約ではなく型によって不変になるようにするためです。

use hashbrown::HashMap;

use crate::errors::{LexicoreError, Result};
use crate::utils::FromU32;

/// 構築中のエンティティコレクション
///
/// 挿入順を保持しつつ、キーから位置への検索表を維持します。
/// ロードが完了したら[`freeze`](Self::freeze)で[`IndexedTuple`]に変換します。
pub struct IndexBuilder<T> {
    /// エラーメッセージに使用するコレクション名
    name: &'static str,
    items: Vec<T>,
    lookup: HashMap<String, u32>,
}

impl<T> IndexBuilder<T> {
    /// 新しい空のビルダーを作成します。
    ///
    /// # 引数
    ///
    /// * `name` - キー重複エラーの報告に使用するコレクション名
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: vec![],
            lookup: HashMap::new(),
        }
    }

    /// 作成専用パスで新しいエントリを登録します。
    ///
    /// # 戻り値
    ///
    /// 登録されたエントリの位置を返します。
    ///
    /// # エラー
    ///
    /// キーが既に存在する場合は[`LexicoreError::DuplicateKey`]を返します。
    /// これはロード順の前提が破られたことを示すバグの兆候であり、
    /// 静かなデータ破損を防ぐための構造的な不変条件です。
    /// エントリ数がu32の範囲を超えた場合は[`LexicoreError::TryFromInt`]を
    /// 返します。
    pub fn insert(&mut self, key: &str, item: T) -> Result<u32> {
        if self.lookup.contains_key(key) {
            return Err(LexicoreError::duplicate_key(self.name, key));
        }
        let idx = u32::try_from(self.items.len())?;
        self.items.push(item);
        self.lookup.insert(key.to_string(), idx);
        Ok(idx)
    }

    /// 登録または追記パスでエントリを取得します。
    ///
    /// キーが未登録の場合のみ`init`を呼び出して新しいエントリを作成します。
    /// 既存エントリへの出現情報の追記は、返された位置を
    /// [`at_mut`](Self::at_mut)に渡して行います。
    ///
    /// # エラー
    ///
    /// 新規登録でエントリ数がu32の範囲を超えた場合は
    /// [`LexicoreError::TryFromInt`]を返します。
    pub fn get_or_insert_with<F>(&mut self, key: &str, init: F) -> Result<u32>
    where
        F: FnOnce() -> T,
    {
        if let Some(&idx) = self.lookup.get(key) {
            return Ok(idx);
        }
        self.insert(key, init())
    }

    /// キーに対応する位置を取得します。
    pub fn idx(&self, key: &str) -> Option<u32> {
        self.lookup.get(key).copied()
    }

    /// キーが登録済みかどうかを返します。
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup.contains_key(key)
    }

    /// 位置からエントリへの共有参照を取得します。
    pub fn at(&self, idx: u32) -> &T {
        &self.items[usize::from_u32(idx)]
    }

    /// 位置からエントリへの可変参照を取得します。
    pub fn at_mut(&mut self, idx: u32) -> &mut T {
        &mut self.items[usize::from_u32(idx)]
    }

    /// 登録済みエントリ数を返します。
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// コレクションが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// ビルダーを読み取り専用の[`IndexedTuple`]に変換します。
    ///
    /// この変換以降、コレクションへの追加・変更はできません。
    pub fn freeze(self) -> IndexedTuple<T> {
        IndexedTuple {
            items: self.items,
            lookup: self.lookup,
        }
    }
}

/// ロード完了後の読み取り専用エンティティコレクション
///
/// [`IndexBuilder::freeze`]によってのみ作成されます。
/// キー検索・位置アクセス・挿入順の反復を提供します。
pub struct IndexedTuple<T> {
    items: Vec<T>,
    lookup: HashMap<String, u32>,
}

impl<T> IndexedTuple<T> {
    /// キーに対応するエントリを取得します。
    pub fn get(&self, key: &str) -> Option<&T> {
        self.lookup.get(key).map(|&i| &self.items[usize::from_u32(i)])
    }

    /// キーに対応する位置を取得します。
    pub fn idx(&self, key: &str) -> Option<u32> {
        self.lookup.get(key).copied()
    }

    /// キーが存在するかどうかを返します。
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup.contains_key(key)
    }

    /// 位置からエントリを取得します。
    pub fn at(&self, idx: u32) -> &T {
        &self.items[usize::from_u32(idx)]
    }

    /// エントリ数を返します。
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// コレクションが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 挿入順でエントリを反復します。
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for IndexedTuple<T> {
    fn default() -> Self {
        Self {
            items: vec![],
            lookup: HashMap::new(),
        }
    }
}

impl<'a, T> IntoIterator for &'a IndexedTuple<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
