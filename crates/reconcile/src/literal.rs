//! Parser for stringified tag lists.
//!
//! Export tools write the tag column either as JSON or as a Python literal:
//! ```text
//! [{'Key': 'env', 'Value': 'prod'}, {'Key': 'Name', 'Value': "o'neil"}]
//! [{"Key": "env", "Value": "prod"}]
//! ```
//! Both are parsed into a [`serde_json::Value`] so the result can be
//! deserialized with serde. Supported: lists, tuples, dicts, single- or
//! double-quoted strings with backslash escapes, integers and floats,
//! `None`/`True`/`False` and their JSON spellings.

use serde_json::{Map, Number, Value};

/// Error from parsing a literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    /// Character offset where parsing stopped.
    pub offset: usize,
    /// What was expected.
    pub message: String,
}

/// Parse a literal into a JSON value.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn error(&self, message: &str) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error(&format!("expected '{}'", expected)))
            }
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('{') => self.dict(),
            Some('\'' | '"') => self.string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() => self.word(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error(&format!("expected ',' or '{}'", close)));
                }
            }
        }
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(self.error("dict keys must be strings or numbers")),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected ',' or '}'"));
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        'x' => out.push(self.hex_escape(2)?),
                        'u' => out.push(self.hex_escape(4)?),
                        '\\' | '\'' | '"' | '/' => out.push(escaped),
                        // Unknown escapes are kept verbatim, as Python does
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(self.error("truncated escape sequence"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError {
                offset: start,
                message: format!("invalid number '{}'", text),
            })
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            _ => Err(LiteralError {
                offset: start,
                message: format!("unknown name '{}'", word),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_python_tag_list() {
        let value = parse("[{'Key': 'env', 'Value': 'prod'}, {'Key': 'owner', 'Value': 'net-team'}]")
            .unwrap();
        assert_eq!(
            value,
            json!([{"Key": "env", "Value": "prod"}, {"Key": "owner", "Value": "net-team"}])
        );
    }

    #[test]
    fn test_parse_json_tag_list() {
        let value = parse(r#"[{"Key": "env", "Value": "prod"}]"#).unwrap();
        assert_eq!(value, json!([{"Key": "env", "Value": "prod"}]));
    }

    #[test]
    fn test_parse_empty_list() {
        assert_eq!(parse("[]").unwrap(), json!([]));
        assert_eq!(parse("  [ ]  ").unwrap(), json!([]));
    }

    #[test]
    fn test_parse_mixed_quotes_and_escapes() {
        let value = parse(r#"[{'Key': 'Name', 'Value': "o'neil"}, {'Key': 'path', 'Value': 'a\\b\'c'}]"#)
            .unwrap();
        assert_eq!(value[0]["Value"], json!("o'neil"));
        assert_eq!(value[1]["Value"], json!("a\\b'c"));
    }

    #[test]
    fn test_parse_hex_and_unicode_escapes() {
        assert_eq!(parse(r"'\x41é'").unwrap(), json!("Aé"));
    }

    #[test]
    fn test_parse_constants_and_numbers() {
        assert_eq!(
            parse("[None, True, False, null, 42, -3, 1.5, (1, 2)]").unwrap(),
            json!([null, true, false, null, 42, -3, 1.5, [1, 2]])
        );
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(parse("[{'Key': 'a',},]").unwrap(), json!([{"Key": "a"}]));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse("[{'Key': 'env}]").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_missing_bracket() {
        assert!(parse("[{'Key': 'env', 'Value': 'prod'}").is_err());
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse("[] extra").unwrap_err();
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_unknown_name() {
        let err = parse("[undefined]").unwrap_err();
        assert!(err.message.contains("undefined"));
    }

    #[test]
    fn test_bare_text_is_error() {
        assert!(parse("env=prod").is_err());
        assert!(parse("").is_err());
    }
}
