//! Legacy bulk-check encoding (PHP `serialize()` format)
//!
//! Only the value kinds that appear in bulk-check payloads are supported:
//! null, booleans, integers, floats, strings, arrays and objects. Values are
//! mapped onto `serde_json::Value`; objects lose their class name and become
//! plain maps.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::payload::PayloadError;

/// Class name used when the top-level document is written back as an object
const DOCUMENT_CLASS: &str = "stdClass";

static SERIALIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^(?:N;|b:[01];|[id]:[0-9.Ee+-]+;|s:[0-9]+:".*";|[aO]:[0-9]+:.*[;}])$"#)
        .expect("valid regex")
});

/// Returns true when `raw` has the shape of a serialized value
///
/// This is a shape check only; a positive answer does not guarantee that
/// [`unserialize`] succeeds.
pub fn looks_serialized(raw: &str) -> bool {
    SERIALIZED.is_match(raw.trim())
}

/// Decodes a serialized value
pub fn unserialize(raw: &str) -> Result<Value, PayloadError> {
    let mut reader = Reader {
        input: raw.trim().as_bytes(),
        pos: 0,
    };
    let value = reader.value()?;
    if reader.pos != reader.input.len() {
        return Err(reader.error("trailing data"));
    }
    Ok(value)
}

/// Encodes a top-level document as a `stdClass` object
pub fn serialize_document(document: &Map<String, Value>) -> String {
    let mut out = format!(
        "O:{}:\"{}\":{}:{{",
        DOCUMENT_CLASS.len(),
        DOCUMENT_CLASS,
        document.len()
    );
    for (key, value) in document {
        write_string(&mut out, key);
        write_value(&mut out, value);
    }
    out.push('}');
    out
}

/// Encodes a single value; maps and lists become arrays
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => out.push_str(&format!("i:{};", i)),
            (None, Some(f)) => out.push_str(&format!("d:{};", f)),
            (None, None) => out.push_str("N;"),
        },
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str(&format!("a:{}:{{", items.len()));
            for (index, item) in items.iter().enumerate() {
                out.push_str(&format!("i:{};", index));
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Object(map) => {
            out.push_str(&format!("a:{}:{{", map.len()));
            for (key, item) in map {
                write_key(out, key);
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

/// Integer-looking keys are written back as integer keys
fn write_key(out: &mut String, key: &str) {
    match key.parse::<i64>() {
        Ok(i) if i.to_string() == key => out.push_str(&format!("i:{};", i)),
        _ => write_string(out, key),
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn error(&self, message: &str) -> PayloadError {
        PayloadError::Malformed(format!("{} at byte {}", message, self.pos))
    }

    fn expect(&mut self, byte: u8) -> Result<(), PayloadError> {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    /// Reads up to (and consumes) `terminator`
    fn until(&mut self, terminator: u8) -> Result<&'a str, PayloadError> {
        let input = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or_else(|| self.error(&format!("missing '{}'", terminator as char)))?;
        self.pos = start + len + 1;
        std::str::from_utf8(&input[start..start + len])
            .map_err(|_| PayloadError::Malformed(format!("invalid UTF-8 at byte {}", start)))
    }

    fn length(&mut self) -> Result<usize, PayloadError> {
        let start = self.pos;
        self.until(b':')?
            .parse()
            .map_err(|_| PayloadError::Malformed(format!("invalid length at byte {}", start)))
    }

    /// Reads `<len>:"<bytes>"`
    fn quoted(&mut self) -> Result<String, PayloadError> {
        let len = self.length()?;
        self.expect(b'"')?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("string length out of range"))?;
        let text = std::str::from_utf8(&self.input[start..end])
            .map_err(|_| PayloadError::Malformed(format!("invalid UTF-8 at byte {}", start)))?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        Ok(text)
    }

    fn value(&mut self) -> Result<Value, PayloadError> {
        let tag = *self
            .input
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;

        if tag == b'N' {
            self.expect(b';')?;
            return Ok(Value::Null);
        }
        self.expect(b':')?;

        match tag {
            b'b' => match self.until(b';')? {
                "0" => Ok(Value::Bool(false)),
                "1" => Ok(Value::Bool(true)),
                _ => Err(self.error("invalid boolean")),
            },
            b'i' => {
                let start = self.pos;
                let text = self.until(b';')?;
                text.parse::<i64>().map(Value::from).map_err(|_| {
                    PayloadError::Malformed(format!("invalid integer at byte {}", start))
                })
            }
            b'd' => {
                let start = self.pos;
                let text = self.until(b';')?;
                let float = text.parse::<f64>().map_err(|_| {
                    PayloadError::Malformed(format!("invalid float at byte {}", start))
                })?;
                Ok(Number::from_f64(float).map_or(Value::Null, Value::Number))
            }
            b's' => {
                let text = self.quoted()?;
                self.expect(b';')?;
                Ok(Value::String(text))
            }
            b'a' => {
                let count = self.length()?;
                self.entries(count)
            }
            b'O' => {
                // Class name is dropped
                self.quoted()?;
                self.expect(b':')?;
                let count = self.length()?;
                self.entries(count)
            }
            other => Err(PayloadError::Malformed(format!(
                "unsupported type '{}' at byte {}",
                other as char,
                self.pos - 2
            ))),
        }
    }

    /// Reads `{<key><value>...}` with `count` pairs
    fn entries(&mut self, count: usize) -> Result<Value, PayloadError> {
        self.expect(b'{')?;
        let mut map = Map::new();
        for _ in 0..count {
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) if n.is_i64() => n.to_string(),
                _ => return Err(self.error("invalid array key")),
            };
            let value = self.value()?;
            map.insert(key, value);
        }
        self.expect(b'}')?;
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const BULK_CHECK: &str = concat!(
        r#"O:8:"stdClass":2:{s:7:"plugins";a:2:{s:7:"a/a.php";a:1:{s:7:"Version";s:3:"1.0";}"#,
        r#"s:19:"my-slug/my-slug.php";a:0:{}}s:6:"active";a:1:{i:0;s:7:"a/a.php";}}"#
    );

    #[rstest]
    #[case(BULK_CHECK, true)]
    #[case(r#"a:0:{}"#, true)]
    #[case(r#"s:3:"abc";"#, true)]
    #[case("i:42;", true)]
    #[case("b:1;", true)]
    #[case("N;", true)]
    #[case(r#"{"plugins":{}}"#, false)]
    #[case("plain text", false)]
    #[case("a:2:{broken", false)]
    #[case("", false)]
    fn test_looks_serialized(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(looks_serialized(raw), expected);
    }

    #[test]
    fn unserialize_decodes_bulk_check_object() {
        let value = unserialize(BULK_CHECK).unwrap();

        assert_eq!(
            value,
            json!({
                "plugins": {
                    "a/a.php": { "Version": "1.0" },
                    "my-slug/my-slug.php": {}
                },
                "active": { "0": "a/a.php" }
            })
        );
    }

    #[rstest]
    #[case("N;", json!(null))]
    #[case("b:0;", json!(false))]
    #[case("i:-7;", json!(-7))]
    #[case("d:1.5;", json!(1.5))]
    #[case(r#"s:5:"héé";"#, json!("héé"))] // length counts bytes
    #[case(r#"s:5:"a"b;c";"#, json!("a\"b;c"))]
    fn unserialize_decodes_scalars(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(unserialize(raw).unwrap(), expected);
    }

    #[rstest]
    #[case(r#"a:2:{s:1:"a";i:1;}"#)] // fewer entries than declared
    #[case(r#"s:10:"short";"#)] // length past end of input
    #[case(r#"O:8:"stdClass":1:{s:7:"plugins";"#)] // truncated
    #[case("i:1;i:2;")] // trailing data
    #[case(r#"a:1:{i:0;r:1;}"#)] // references are not supported
    #[case("x:1;")]
    fn unserialize_rejects_malformed_input(#[case] raw: &str) {
        assert!(matches!(unserialize(raw), Err(PayloadError::Malformed(_))));
    }

    #[test]
    fn serialize_document_writes_std_class_object() {
        let document = json!({
            "plugins": { "a/a.php": { "Version": "1.0" } },
            "active": ["a/a.php"]
        });

        let encoded = serialize_document(document.as_object().unwrap());

        assert_eq!(
            encoded,
            concat!(
                r#"O:8:"stdClass":2:{s:7:"plugins";"#,
                r#"a:1:{s:7:"a/a.php";a:1:{s:7:"Version";s:3:"1.0";}}"#,
                r#"s:6:"active";a:1:{i:0;s:7:"a/a.php";}}"#
            )
        );
    }

    #[test]
    fn serialize_document_round_trips_bulk_check() {
        let value = unserialize(BULK_CHECK).unwrap();

        assert_eq!(serialize_document(value.as_object().unwrap()), BULK_CHECK);
    }

    #[rstest]
    #[case(json!(null), "N;")]
    #[case(json!(true), "b:1;")]
    #[case(json!(12), "i:12;")]
    #[case(json!(0.25), "d:0.25;")]
    #[case(json!({"10": "x", "010": "y"}), r#"a:2:{i:10;s:1:"x";s:3:"010";s:1:"y";}"#)]
    fn serialize_writes_values(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(serialize(&value), expected);
    }
}
