//! Internal module converting the UTF-8 text of the JSON data to the encodings
//! in which values are delivered to callbacks
//!
//! Wide strings are UTF-16 code units. Narrow strings are either the raw UTF-8
//! data or, when locale mode is enabled, the multibyte encoding of the selected
//! locale (for example CP1252 or GB18030).

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::utf8;

/// Environment variables consulted, in order, when no locale name is given
const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextConverter {
    /// Encoding of narrow strings; `None` means narrow strings are UTF-8
    narrow_encoding: Option<&'static Encoding>,
}

impl Default for TextConverter {
    fn default() -> Self {
        TextConverter::utf8()
    }
}

/// Extracts the codeset from a locale name such as `de_DE.ISO-8859-1@euro`
fn locale_codeset(locale: &str) -> &str {
    let codeset = match locale.split_once('.') {
        Some((_, codeset)) => codeset,
        None => locale,
    };
    match codeset.split_once('@') {
        Some((codeset, _)) => codeset,
        None => codeset,
    }
}

/// Resolves the encoding for a locale name, `None` if it is unknown
fn encoding_for_locale(locale: &str) -> Option<&'static Encoding> {
    if locale == "C" || locale == "POSIX" {
        return Some(UTF_8);
    }
    Encoding::for_label(locale_codeset(locale).as_bytes())
}

impl TextConverter {
    /// Converter delivering narrow strings as UTF-8
    pub(crate) fn utf8() -> Self {
        TextConverter {
            narrow_encoding: None,
        }
    }

    /// Converter delivering narrow strings in the encoding of the locale
    ///
    /// If `locale` is `None` the locale is taken from the environment, falling back
    /// to UTF-8 if the environment does not name a known encoding. An explicitly
    /// named locale which is unknown results in `Err` with that name.
    pub(crate) fn for_locale(locale: Option<&str>) -> Result<Self, String> {
        let encoding = match locale {
            Some(locale) => encoding_for_locale(locale).ok_or_else(|| locale.to_owned())?,
            None => LOCALE_ENV_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|value| !value.is_empty())
                .and_then(|value| encoding_for_locale(&value))
                .unwrap_or(UTF_8),
        };
        log::debug!("narrow strings use encoding {}", encoding.name());

        Ok(TextConverter {
            narrow_encoding: if encoding == UTF_8 {
                None
            } else {
                Some(encoding)
            },
        })
    }

    /// Converts UTF-8 bytes to the narrow encoding
    ///
    /// ASCII text and text for a UTF-8 narrow encoding is returned as is.
    pub(crate) fn to_narrow<'b>(&self, utf8_bytes: &'b [u8]) -> Cow<'b, [u8]> {
        let encoding = match self.narrow_encoding {
            Some(encoding) if !utf8_bytes.is_ascii() => encoding,
            _ => return Cow::Borrowed(utf8_bytes),
        };
        let text = utf8::to_str_lossy(utf8_bytes);
        // Characters without representation in the target encoding become numeric character references
        let (encoded, _, _) = encoding.encode(&text);
        Cow::Owned(encoded.into_owned())
    }

    /// Converts UTF-8 bytes to UTF-16, replacing the previous content of `out`
    pub(crate) fn to_wide_into(&self, utf8_bytes: &[u8], out: &mut Vec<u16>) {
        out.clear();
        out.extend(utf8::to_str_lossy(utf8_bytes).encode_utf16());
    }

    pub(crate) fn to_wide(&self, utf8_bytes: &[u8]) -> Vec<u16> {
        let mut out = Vec::with_capacity(utf8_bytes.len());
        self.to_wide_into(utf8_bytes, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codeset() {
        assert_eq!("ISO-8859-1", locale_codeset("de_DE.ISO-8859-1@euro"));
        assert_eq!("UTF-8", locale_codeset("en_US.UTF-8"));
        assert_eq!("GB18030", locale_codeset("GB18030"));
    }

    #[test]
    fn narrow_utf8() {
        let converter = TextConverter::utf8();
        let text = "caf\u{e9}".as_bytes();
        assert!(matches!(converter.to_narrow(text), Cow::Borrowed(_)));
        assert_eq!(text, converter.to_narrow(text).as_ref());
    }

    #[test]
    fn narrow_locale() -> Result<(), String> {
        let converter = TextConverter::for_locale(Some("fr_FR.ISO-8859-1"))?;
        assert_eq!(b"caf\xE9", converter.to_narrow("caf\u{e9}".as_bytes()).as_ref());
        // ASCII is not converted
        assert!(matches!(converter.to_narrow(b"abc"), Cow::Borrowed(b"abc")));

        let converter = TextConverter::for_locale(Some("zh_CN.GB18030"))?;
        assert_eq!(b"\xD6\xD0", converter.to_narrow("\u{4e2d}".as_bytes()).as_ref());

        let converter = TextConverter::for_locale(Some("en_US.UTF-8"))?;
        assert!(converter.narrow_encoding.is_none());
        Ok(())
    }

    #[test]
    fn unknown_locale() {
        assert_eq!(
            Err("xx_XX.NOT-AN-ENCODING".to_owned()),
            TextConverter::for_locale(Some("xx_XX.NOT-AN-ENCODING")).map(|_| ())
        );
    }

    #[test]
    fn wide() {
        let converter = TextConverter::utf8();
        assert_eq!(
            "a\u{e9}\u{1d11e}".encode_utf16().collect::<Vec<_>>(),
            converter.to_wide("a\u{e9}\u{1d11e}".as_bytes())
        );

        let mut out = vec![1, 2, 3];
        converter.to_wide_into(b"", &mut out);
        assert!(out.is_empty());
    }
}
