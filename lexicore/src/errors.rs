//! エラー型の定義
//!
//! このモジュールは、lexicoreライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt;

/// lexicore専用のResult型
///
/// エラー型としてデフォルトで[`LexicoreError`]を使用します。
pub type Result<T, E = LexicoreError> = std::result::Result<T, E>;

/// lexicoreのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum LexicoreError {
    /// 参照整合性エラー
    ///
    /// [`ReferentialIntegrityError`]のエラーバリアント。
    /// フォーム行がグラフに存在しない言語・概念・語義を参照した場合に発生し、
    /// ロード処理全体を中断させます。
    #[error(transparent)]
    ReferentialIntegrity(ReferentialIntegrityError),

    /// キー重複エラー
    ///
    /// [`DuplicateKeyError`]のエラーバリアント。
    /// 作成専用パスで既存の識別子を再登録しようとした場合に発生します。
    #[error(transparent)]
    DuplicateKey(DuplicateKeyError),

    /// 無効なフォーマットエラー
    ///
    /// [`InvalidFormatError`]のエラーバリアント。
    /// 入力テーブルの形式が不正な場合に発生します。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 要件未充足エラー
    ///
    /// [`MissingRequirementError`]のエラーバリアント。
    /// 特徴量関数の前提条件が満たされていない言語に対して呼び出しが
    /// 行われた場合に発生します。
    #[error(transparent)]
    MissingRequirement(MissingRequirementError),

    /// 整数変換エラー
    ///
    /// [`TryFromIntError`](std::num::TryFromIntError)のエラーバリアント。
    /// コレクションのエントリ数がu32の範囲を超えた場合に発生します。
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// 浮動小数点数パースエラー
    ///
    /// [`ParseFloatError`](std::num::ParseFloatError)のエラーバリアント。
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// UTF-8エンコーディングエラー
    ///
    /// [`std::str::Utf8Error`]のエラーバリアント。
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// 標準I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl LexicoreError {
    /// 参照整合性エラーを生成します
    ///
    /// # 引数
    ///
    /// * `table` - 参照元のテーブル名
    /// * `key` - 解決できなかった識別子
    pub(crate) fn referential_integrity<S>(table: &'static str, key: S) -> Self
    where
        S: Into<String>,
    {
        Self::ReferentialIntegrity(ReferentialIntegrityError {
            table,
            key: key.into(),
        })
    }

    /// キー重複エラーを生成します
    ///
    /// # 引数
    ///
    /// * `collection` - コレクション名
    /// * `key` - 重複した識別子
    pub(crate) fn duplicate_key<S>(collection: &'static str, key: S) -> Self
    where
        S: Into<String>,
    {
        Self::DuplicateKey(DuplicateKeyError {
            collection,
            key: key.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 要件未充足エラーを生成します
    ///
    /// # 引数
    ///
    /// * `feature` - 特徴量の識別子
    /// * `missing` - 満たされなかった要件の名前
    pub(crate) fn missing_requirement<S>(feature: S, missing: Vec<&'static str>) -> Self
    where
        S: Into<String>,
    {
        Self::MissingRequirement(MissingRequirementError {
            feature: feature.into(),
            missing,
        })
    }
}

/// フォーム行が未登録のエンティティを参照した場合に使用されるエラー
#[derive(Debug)]
pub struct ReferentialIntegrityError {
    /// 参照元のテーブル名
    pub(crate) table: &'static str,

    /// 解決できなかった識別子
    pub(crate) key: String,
}

impl fmt::Display for ReferentialIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ReferentialIntegrityError: {}: unresolved reference '{}'",
            self.table, self.key
        )
    }
}

impl Error for ReferentialIntegrityError {}

/// 作成専用パスで識別子が重複した場合に使用されるエラー
#[derive(Debug)]
pub struct DuplicateKeyError {
    /// コレクション名
    pub(crate) collection: &'static str,

    /// 重複した識別子
    pub(crate) key: String,
}

impl fmt::Display for DuplicateKeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DuplicateKeyError: {}: key '{}' already exists",
            self.collection, self.key
        )
    }
}

impl Error for DuplicateKeyError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 特徴量関数の前提条件が満たされなかった場合に使用されるエラー
///
/// 満たされなかった要件の名前をすべて保持します。呼び出し側はこの情報を
/// 使って、スキップ・記録・中断のいずれかを選択できます。
#[derive(Debug)]
pub struct MissingRequirementError {
    /// 特徴量の識別子
    pub(crate) feature: String,

    /// 満たされなかった要件の名前
    pub(crate) missing: Vec<&'static str>,
}

impl MissingRequirementError {
    /// 満たされなかった要件の名前を取得します。
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }
}

impl fmt::Display for MissingRequirementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MissingRequirementError: {}: unmet requirements: {}",
            self.feature,
            self.missing.join(" ")
        )
    }
}

impl Error for MissingRequirementError {}
