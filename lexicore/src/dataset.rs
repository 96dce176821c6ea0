//! CLDFデータセットの入力表現
//!
//! このモジュールは、一つのソースデータセットを型付きの行オブジェクトの
//! 集まりとして表現します。コアはデータセットを行の逐次イテレータとして
//! 扱うだけで、カタログの発見・ダウンロード・変換は扱いません。
//!
//! 行構造体はフィールド名による明示的なデータであり、欠けうる列は
//! `Option`で表現します。CSV形式のテーブルリーダーからの構築には
//! [`Dataset::from_readers`]を使用します。

use std::io::Read;

use csv_core::ReadFieldResult;
use hashbrown::HashMap;

use crate::errors::{LexicoreError, Result};

/// LanguageTableの一行
///
/// 一つのデータセット内の一つの言語変種を表します。
#[derive(Clone, Debug, Default)]
pub struct LanguageRow {
    /// データセット内のローカルID
    pub id: String,
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

/// ParameterTable（概念表）の一行
#[derive(Clone, Debug, Default)]
pub struct ParameterRow {
    /// データセット内のローカルID
    pub id: String,
    /// データセット固有の語義ラベル
    pub name: Option<String>,
    /// Concepticonの標準ID
    pub concepticon_id: Option<String>,
    /// Concepticonの標準グロス（データセット横断の概念統合キー）
    pub concepticon_gloss: Option<String>,
}

/// FormTableの一行
#[derive(Clone, Debug, Default)]
pub struct FormRow {
    /// データセット内のローカルID
    pub id: String,
    /// 参照する言語のローカルID
    pub language_id: String,
    /// 参照するパラメータ（語義）のローカルID
    pub parameter_id: String,
    /// ソースに書かれたままの値
    pub value: Option<String>,
    /// 正書形
    pub form: Option<String>,
    /// 分かち書きされた書記素列。ソースが提供しない場合は空です。
    pub segments: Vec<String>,
}

/// CognateTableの一行
#[derive(Clone, Debug, Default)]
pub struct CognateRow {
    /// 参照するフォームのローカルID
    pub form_id: String,
    /// 同源語セットの識別子
    pub cognateset_id: String,
    /// 寄与・手法フィールド
    pub contribution: Option<String>,
}

/// 一つの名前付きソースデータセット
///
/// 不変の行データの入れ物です。[`Wordlist`](crate::wordlist::Wordlist)の
/// 構築時に、呼び出し側が与えた順序で処理されます。
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    /// データセットID。エンティティの複合キーの接頭辞になります。
    pub id: String,
    /// LanguageTableの行
    pub languages: Vec<LanguageRow>,
    /// ParameterTableの行
    pub parameters: Vec<ParameterRow>,
    /// FormTableの行
    pub forms: Vec<FormRow>,
    /// CognateTableの行（存在しない場合は空）
    pub cognates: Vec<CognateRow>,
}

impl Dataset {
    /// 空のデータセットを作成します。
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// CSV形式のテーブルリーダーから新しい`Dataset`を作成します。
    ///
    /// 各リーダーの最初の行はヘッダとして解釈され、列は名前で選択されます。
    /// 未知の列は無視されます。`Segments`列は空白区切りです。
    ///
    /// # 引数
    ///
    ///  - `id`: データセットID
    ///  - `languages_rdr`: `languages.csv`のリーダー
    ///  - `parameters_rdr`: `parameters.csv`のリーダー
    ///  - `forms_rdr`: `forms.csv`のリーダー
    ///
    /// # エラー
    ///
    /// 必須列が欠けている場合などに[`LexicoreError`]を返します。
    pub fn from_readers<L, P, F>(
        id: &str,
        languages_rdr: L,
        parameters_rdr: P,
        forms_rdr: F,
    ) -> Result<Self>
    where
        L: Read,
        P: Read,
        F: Read,
    {
        let mut ds = Self::new(id);
        ds.languages = read_language_rows(languages_rdr)?;
        ds.parameters = read_parameter_rows(parameters_rdr)?;
        ds.forms = read_form_rows(forms_rdr)?;
        Ok(ds)
    }

    /// 同源語表を含むCSVテーブルリーダーから新しい`Dataset`を作成します。
    ///
    /// # 引数
    ///
    ///  - `id`: データセットID
    ///  - `languages_rdr`: `languages.csv`のリーダー
    ///  - `parameters_rdr`: `parameters.csv`のリーダー
    ///  - `forms_rdr`: `forms.csv`のリーダー
    ///  - `cognates_rdr`: `cognates.csv`のリーダー
    pub fn from_readers_with_cognates<L, P, F, C>(
        id: &str,
        languages_rdr: L,
        parameters_rdr: P,
        forms_rdr: F,
        cognates_rdr: C,
    ) -> Result<Self>
    where
        L: Read,
        P: Read,
        F: Read,
        C: Read,
    {
        let mut ds = Self::from_readers(id, languages_rdr, parameters_rdr, forms_rdr)?;
        ds.cognates = read_cognate_rows(cognates_rdr)?;
        Ok(ds)
    }
}

/// CSVバッファ全体をレコードのベクターに分割します。
///
/// 引用符付きフィールドや、フィールド内のカンマ・改行も正しく処理します。
/// すべてのフィールドが空のレコード（末尾の空行など）は取り除かれます。
fn parse_records(buf: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv_core::Reader::new();
    let mut records = vec![];
    let mut record = vec![];
    let mut field = vec![];
    let mut output = [0; 4096];
    let mut bytes = buf;
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        field.extend_from_slice(&output[..nout]);
        bytes = &bytes[nin..];
        match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::OutputFull => {}
            ReadFieldResult::Field { record_end } => {
                record.push(std::str::from_utf8(&field)?.to_string());
                field.clear();
                if record_end {
                    if record.iter().any(|f| !f.is_empty()) {
                        records.push(std::mem::take(&mut record));
                    } else {
                        record.clear();
                    }
                }
            }
            ReadFieldResult::End => break,
        }
    }
    Ok(records)
}

/// リーダーを読み切ってヘッダ付きレコード列を返します。
fn read_table<R: Read>(
    mut rdr: R,
    table: &'static str,
) -> Result<(HashMap<String, usize>, Vec<Vec<String>>)> {
    let mut buf = vec![];
    rdr.read_to_end(&mut buf)?;
    let mut records = parse_records(&buf)?;
    if records.is_empty() {
        return Err(LexicoreError::invalid_format(table, "missing header row"));
    }
    let header = records.remove(0);
    let columns = header
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    Ok((columns, records))
}

/// 列名からセル値を取得します。空セルは`None`になります。
fn cell(columns: &HashMap<String, usize>, record: &[String], name: &str) -> Option<String> {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .filter(|v| !v.is_empty())
        .cloned()
}

/// 必須列のセル値を取得します。
fn required_cell(
    columns: &HashMap<String, usize>,
    record: &[String],
    name: &str,
    table: &'static str,
) -> Result<String> {
    cell(columns, record, name).ok_or_else(|| {
        LexicoreError::invalid_format(table, format!("missing value for column '{name}'"))
    })
}

fn read_language_rows<R: Read>(rdr: R) -> Result<Vec<LanguageRow>> {
    let (columns, records) = read_table(rdr, "languages.csv")?;
    let mut rows = vec![];
    for record in &records {
        let latitude = cell(&columns, record, "Latitude")
            .map(|v| v.parse::<f64>())
            .transpose()?;
        let longitude = cell(&columns, record, "Longitude")
            .map(|v| v.parse::<f64>())
            .transpose()?;
        rows.push(LanguageRow {
            id: required_cell(&columns, record, "ID", "languages.csv")?,
            name: cell(&columns, record, "Name"),
            glottocode: cell(&columns, record, "Glottocode"),
            macroarea: cell(&columns, record, "Macroarea"),
            latitude,
            longitude,
            family: cell(&columns, record, "Family"),
            subgroup: cell(&columns, record, "SubGroup"),
        });
    }
    Ok(rows)
}

fn read_parameter_rows<R: Read>(rdr: R) -> Result<Vec<ParameterRow>> {
    let (columns, records) = read_table(rdr, "parameters.csv")?;
    let mut rows = vec![];
    for record in &records {
        rows.push(ParameterRow {
            id: required_cell(&columns, record, "ID", "parameters.csv")?,
            name: cell(&columns, record, "Name"),
            concepticon_id: cell(&columns, record, "Concepticon_ID"),
            concepticon_gloss: cell(&columns, record, "Concepticon_Gloss"),
        });
    }
    Ok(rows)
}

fn read_form_rows<R: Read>(rdr: R) -> Result<Vec<FormRow>> {
    let (columns, records) = read_table(rdr, "forms.csv")?;
    let mut rows = vec![];
    for record in &records {
        let segments = cell(&columns, record, "Segments")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        rows.push(FormRow {
            id: required_cell(&columns, record, "ID", "forms.csv")?,
            language_id: required_cell(&columns, record, "Language_ID", "forms.csv")?,
            parameter_id: required_cell(&columns, record, "Parameter_ID", "forms.csv")?,
            value: cell(&columns, record, "Value"),
            form: cell(&columns, record, "Form"),
            segments,
        });
    }
    Ok(rows)
}

fn read_cognate_rows<R: Read>(rdr: R) -> Result<Vec<CognateRow>> {
    let (columns, records) = read_table(rdr, "cognates.csv")?;
    let mut rows = vec![];
    for record in &records {
        rows.push(CognateRow {
            form_id: required_cell(&columns, record, "Form_ID", "cognates.csv")?,
            cognateset_id: required_cell(&columns, record, "Cognateset_ID", "cognates.csv")?,
            contribution: cell(&columns, record, "Contribution"),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGUAGES: &str = "ID,Name,Glottocode,Latitude,Family\n\
        Apurina,Apurinã,apur1254,-9.0,Arawakan\n\
        Yine,Yine,yine1238,,Arawakan\n";
    const PARAMETERS: &str = "ID,Name,Concepticon_ID,Concepticon_Gloss\n\
        1_arm,arm,1673,ARM\n\
        2_local,some local sense,,\n";
    const FORMS: &str = "ID,Language_ID,Parameter_ID,Value,Form,Segments\n\
        1,Apurina,1_arm,mane,mane,m a + n e\n\
        2,Yine,2_local,\"so, so\",soso,\n";

    #[test]
    fn test_from_readers() {
        let ds = Dataset::from_readers(
            "carvalhopurus",
            LANGUAGES.as_bytes(),
            PARAMETERS.as_bytes(),
            FORMS.as_bytes(),
        )
        .unwrap();
        assert_eq!(ds.id, "carvalhopurus");
        assert_eq!(ds.languages.len(), 2);
        assert_eq!(ds.languages[0].latitude, Some(-9.0));
        assert_eq!(ds.languages[1].latitude, None);
        assert_eq!(ds.parameters[0].concepticon_gloss.as_deref(), Some("ARM"));
        assert_eq!(ds.parameters[1].concepticon_gloss, None);
        assert_eq!(ds.forms[0].segments, vec!["m", "a", "+", "n", "e"]);
        assert!(ds.forms[1].segments.is_empty());
        assert_eq!(ds.forms[1].value.as_deref(), Some("so, so"));
        assert!(ds.cognates.is_empty());
    }

    #[test]
    fn test_from_readers_with_cognates() {
        let cognates = "Form_ID,Cognateset_ID,Contribution\n1,arm-1,default\n";
        let ds = Dataset::from_readers_with_cognates(
            "carvalhopurus",
            LANGUAGES.as_bytes(),
            PARAMETERS.as_bytes(),
            FORMS.as_bytes(),
            cognates.as_bytes(),
        )
        .unwrap();
        assert_eq!(ds.cognates.len(), 1);
        assert_eq!(ds.cognates[0].cognateset_id, "arm-1");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let result = Dataset::from_readers(
            "x",
            "".as_bytes(),
            PARAMETERS.as_bytes(),
            FORMS.as_bytes(),
        );
        assert!(matches!(result, Err(LexicoreError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_required_cell_is_an_error() {
        let forms = "ID,Language_ID,Parameter_ID\n1,,1_arm\n";
        let result = Dataset::from_readers(
            "x",
            LANGUAGES.as_bytes(),
            PARAMETERS.as_bytes(),
            forms.as_bytes(),
        );
        assert!(matches!(result, Err(LexicoreError::InvalidFormat(_))));
    }
}
