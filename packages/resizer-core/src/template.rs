//! 出力キーテンプレート
//!
//! `{dir}{stem}-{name}.{ext}` のようなテンプレートから、元キーとバリアント名を元に
//! 出力キーを組み立てる。テンプレートは設定読み込み時に一度だけ解析する。

use crate::constants::DEFAULT_KEY_TEMPLATE;
use crate::transform::OutputFormat;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// 元キーのディレクトリ部分（末尾の `/` を含む、なければ空）
    Dir,
    /// 元キーのファイル名から拡張子を除いた部分
    Stem,
    /// バリアント名
    Name,
    /// 出力フォーマットの拡張子
    Ext,
    /// 元キー全体
    Key,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct KeyTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl KeyTemplate {
    /// テンプレート文字列を解析する
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| format!("unclosed placeholder in `{template}`"))?;

            let segment = match &after[..close] {
                "dir" => Segment::Dir,
                "stem" => Segment::Stem,
                "name" => Segment::Name,
                "ext" => Segment::Ext,
                "key" => Segment::Key,
                other => return Err(format!("unknown placeholder `{{{other}}}` in `{template}`")),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(format!("unmatched `}}` in `{template}`"));
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if segments.is_empty() {
            return Err("key template is empty".to_string());
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 出力キーを組み立てる
    pub fn render(&self, source_key: &str, variant: &str, format: OutputFormat) -> String {
        let parts = KeyParts::split(source_key);
        let ext = parts.extension_for(format);

        let mut out = String::with_capacity(source_key.len() + variant.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Dir => out.push_str(parts.dir),
                Segment::Stem => out.push_str(parts.stem),
                Segment::Name => out.push_str(variant),
                Segment::Ext => out.push_str(ext),
                Segment::Key => out.push_str(source_key),
            }
        }
        out
    }
}

impl Default for KeyTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_KEY_TEMPLATE.to_string(),
            segments: vec![
                Segment::Dir,
                Segment::Stem,
                Segment::Literal("-".to_string()),
                Segment::Name,
                Segment::Literal(".".to_string()),
                Segment::Ext,
            ],
        }
    }
}

impl TryFrom<String> for KeyTemplate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

struct KeyParts<'a> {
    dir: &'a str,
    stem: &'a str,
    ext: Option<&'a str>,
}

impl<'a> KeyParts<'a> {
    fn split(key: &'a str) -> Self {
        let (dir, file) = match key.rfind('/') {
            Some(i) => key.split_at(i + 1),
            None => ("", key),
        };

        // 先頭のドットは拡張子として扱わない（`.hidden` など）
        match file.rfind('.') {
            Some(i) if i > 0 => Self {
                dir,
                stem: &file[..i],
                ext: Some(&file[i + 1..]),
            },
            _ => Self {
                dir,
                stem: file,
                ext: None,
            },
        }
    }

    /// 元の拡張子が出力フォーマットと一致すれば表記（jpg/jpeg/JPG）をそのまま使う
    fn extension_for(&self, format: OutputFormat) -> &'a str {
        match self.ext {
            Some(ext) if OutputFormat::from_str(ext) == Some(format) => ext,
            _ => format.extension(),
        }
    }
}
