//! MySQL 문자셋 → 표준 텍스트 인코딩 매핑
//!
//! 표준 인코딩이 없는 문자셋(armscii8, geostd8 등)과 디코더가 없는 문자셋은
//! 명시적으로 실패합니다.
//!
//! encoding_rs는 WHATWG 레이블을 따르므로 `us-ascii`와 `iso-8859-1`이 모두
//! windows-1252로 해석됩니다. `ascii`는 0x80 이상 바이트를 거부하도록 따로 검사하고,
//! `binary`/`dec8`은 0x80-0x9F 구간이 Latin-1이 아닌 windows-1252 문자로 디코딩됩니다.

use crate::error::{ConvertError, Result};
use encoding_rs::Encoding;

/// 문자셋 조회 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// 디코딩 가능한 인코딩
    Supported(&'static Encoding),
    /// 알려진 MySQL 문자셋이지만 디코딩 불가
    Unsupported,
}

/// MySQL 문자셋명 → 인코딩 레이블 (None = 지원 안 함)
const CHARSET_MYSQL_TO_ENCODING: &[(&str, Option<&str>)] = &[
    ("armscii8", None),
    ("ascii", Some("us-ascii")),
    ("big5", Some("big5")),
    ("binary", Some("iso-8859-1")),
    ("cp1250", Some("windows-1250")),
    ("cp1251", Some("windows-1251")),
    ("cp1256", Some("windows-1256")),
    ("cp1257", Some("windows-1257")),
    ("cp850", None),
    ("cp852", None),
    ("cp866", Some("ibm866")),
    ("cp932", Some("windows-31j")),
    ("dec8", Some("iso-8859-1")),
    ("eucjpms", Some("euc-jp")),
    ("euckr", Some("euc-kr")),
    ("gb18030", Some("gb18030")),
    ("gb2312", Some("gb2312")),
    ("gbk", Some("gbk")),
    ("geostd8", None),
    ("greek", Some("iso-8859-7")),
    ("hebrew", Some("iso-8859-8")),
    ("hp8", None),
    ("keybcs2", None),
    ("koi8r", Some("koi8-r")),
    ("koi8u", Some("koi8-u")),
    // MySQL latin1은 실제로 Windows-1252
    ("latin1", Some("windows-1252")),
    ("latin2", Some("iso-8859-2")),
    ("latin5", Some("iso-8859-9")),
    ("latin7", Some("iso-8859-13")),
    ("macce", None),
    ("macroman", Some("macintosh")),
    ("sjis", Some("shift_jis")),
    ("swe7", None),
    ("tis620", Some("tis-620")),
    ("ucs2", Some("utf-16be")),
    ("ujis", Some("euc-jp")),
    ("utf16", Some("utf-16be")),
    ("utf16le", Some("utf-16le")),
    ("utf32", None),
    ("utf8mb3", Some("utf-8")),
    ("utf8mb4", Some("utf-8")),
    ("utf8", Some("utf-8")),
];

/// 해석된 테이블 문자셋. 배치 단위로 한 번 해석해 두고 재사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCharset {
    /// MySQL 문자셋명 (소문자)
    pub name: &'static str,
    pub encoding: &'static Encoding,
}

impl TableCharset {
    pub const UTF8: TableCharset = TableCharset {
        name: "utf8mb4",
        encoding: encoding_rs::UTF_8,
    };

    /// 바이트 디코딩 (잘못된 시퀀스는 에러)
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        if self.name == "ascii" && !bytes.is_ascii() {
            return Err(self.decode_error(bytes));
        }
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|s| s.into_owned())
            .ok_or_else(|| self.decode_error(bytes))
    }

    fn decode_error(&self, bytes: &[u8]) -> ConvertError {
        ConvertError::CharsetDecode {
            charset: format!("{} ({})", self.name, self.encoding.name()),
            reason: format!("invalid byte sequence ({} bytes)", bytes.len()),
        }
    }
}

/// 정적 문자셋 테이블
pub struct CharsetTable;

impl CharsetTable {
    /// MySQL 문자셋명 조회 (대소문자 무시). 모르는 이름이면 None
    pub fn lookup(mysql_charset: &str) -> Option<Charset> {
        let name = mysql_charset.trim().to_lowercase();
        CHARSET_MYSQL_TO_ENCODING
            .iter()
            .find(|(mysql, _)| *mysql == name)
            .map(|(_, label)| match label.and_then(|l| Encoding::for_label(l.as_bytes())) {
                Some(encoding) => Charset::Supported(encoding),
                None => Charset::Unsupported,
            })
    }

    /// 테이블 문자셋 해석. 지정되지 않았으면 UTF-8
    pub fn resolve(mysql_charset: Option<&str>) -> Result<TableCharset> {
        let Some(name) = mysql_charset else {
            return Ok(TableCharset::UTF8);
        };
        let lower = name.trim().to_lowercase();
        CHARSET_MYSQL_TO_ENCODING
            .iter()
            .find(|(mysql, _)| *mysql == lower)
            .and_then(|(mysql, label)| {
                let encoding = Encoding::for_label((*label)?.as_bytes())?;
                Some(TableCharset {
                    name: *mysql,
                    encoding,
                })
            })
            .ok_or_else(|| ConvertError::UnsupportedCharset(name.to_string()))
    }

    /// 바이트를 테이블 문자셋으로 디코딩 (잘못된 시퀀스는 에러)
    pub fn decode(bytes: &[u8], mysql_charset: Option<&str>) -> Result<String> {
        Self::resolve(mysql_charset)?.decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_latin1_is_windows_1252() {
        assert_eq!(
            CharsetTable::lookup("latin1"),
            Some(Charset::Supported(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            CharsetTable::lookup("UTF8MB4"),
            Some(Charset::Supported(encoding_rs::UTF_8))
        );
    }

    #[test]
    fn test_unsupported_charsets_fail() {
        assert_eq!(CharsetTable::lookup("armscii8"), Some(Charset::Unsupported));
        assert_eq!(CharsetTable::lookup("utf32"), Some(Charset::Unsupported));
        assert!(CharsetTable::lookup("klingon").is_none());
        assert!(matches!(
            CharsetTable::decode(b"abc", Some("swe7")),
            Err(ConvertError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn test_decode() {
        assert_eq!(CharsetTable::decode("héllo".as_bytes(), None).unwrap(), "héllo");
        // 0xE9 = 'é' (cp1252)
        assert_eq!(CharsetTable::decode(&[0x63, 0x61, 0x66, 0xe9], Some("latin1")).unwrap(), "café");
        // 0xCF 0xF0 0xE8 = "При" (cp1251)
        assert_eq!(CharsetTable::decode(&[0xcf, 0xf0, 0xe8], Some("cp1251")).unwrap(), "При");
        assert!(matches!(
            CharsetTable::decode(&[0xff, 0xfe, 0xfd], None),
            Err(ConvertError::CharsetDecode { .. })
        ));
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        let ascii = CharsetTable::resolve(Some("ASCII")).unwrap();
        assert_eq!(ascii.name, "ascii");
        assert_eq!(ascii.decode(b"plain").unwrap(), "plain");
        assert!(matches!(
            ascii.decode(&[0x61, 0xe9]),
            Err(ConvertError::CharsetDecode { .. })
        ));
        // latin1은 같은 인코딩이지만 0xE9를 허용
        assert_eq!(CharsetTable::decode(&[0x61, 0xe9], Some("latin1")).unwrap(), "aé");
    }

    #[test]
    fn test_resolve_defaults_to_utf8() {
        assert_eq!(CharsetTable::resolve(None).unwrap(), TableCharset::UTF8);
        assert!(matches!(
            CharsetTable::resolve(Some("klingon")),
            Err(ConvertError::UnsupportedCharset(_))
        ));
    }
}
