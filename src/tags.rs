//! Field descriptors: normalized per-member metadata read from struct tags.
//!
//! Tags use the conventional `key:"value" key2:"value2"` layout. Two
//! mini-formats are understood:
//! - plain keys (`name`, `title`, `required`, `minLength`, ...), one per entry;
//! - the comma-joined `jsonschema:"required,minLength=1"` entry, whose bare
//!   words are flags, whose `key=value` parts set attributes, and whose
//!   leading `-` marks the member ignored. It is applied last and wins.
//!
//! Malformed numbers and booleans read as absent; a tag never fails to parse.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Field;

const TAG_NAME: &str = "name";
const TAG_JSON: &str = "json";
const TAG_JSONSCHEMA: &str = "jsonschema";
const IGNORE_SENTINEL: &str = "-";

static EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new("([a-z]+)(=|<|>|<=|>=)([a-z]+)").expect("expression pattern is valid")
});

// ------------------------------ Struct tag ------------------------------- //

/// Parsed `key:"value"` pairs, in tag order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructTag {
    entries: Vec<(String, String)>,
}

impl StructTag {
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        let mut rest = raw;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() { break; }

            // key runs up to ':' and may not contain spaces, quotes or controls
            let key_end = rest
                .find(|c: char| c == ':' || c == '"' || c.is_whitespace() || c.is_control())
                .unwrap_or(rest.len());
            if key_end == 0 || !rest[key_end..].starts_with(":\"") { break; }
            let key = &rest[..key_end];
            rest = &rest[key_end + 2..];

            let Some((value, tail)) = take_quoted(rest) else { break };
            entries.push((key.to_string(), value));
            rest = tail;
        }
        Self { entries }
    }

    /// First value stored under `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Read a quoted value (opening quote already consumed), unescaping as it goes.
///
/// `\xNN` is read as the code point `NN`, not as a raw byte. A malformed
/// escape ends the value like an unterminated quote does.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &s[i + 1..])),
            '\\' => out.push(match chars.next()?.1 {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'a' => '\u{07}',
                'b' => '\u{08}',
                'f' => '\u{0c}',
                'v' => '\u{0b}',
                'x' => hex_escape(&mut chars, 2)?,
                'u' => hex_escape(&mut chars, 4)?,
                'U' => hex_escape(&mut chars, 8)?,
                other => other,
            }),
            _ => out.push(c),
        }
    }
    None // unterminated
}

fn hex_escape(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.1.to_digit(16)?;
    }
    char::from_u32(code)
}

// ------------------------------ Expression ------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator { Eq, Lt, Gt, Le, Ge }

/// Conditional-visibility rule, e.g. `show_if:"mode=advanced"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub option: String,
    pub operation: Operator,
    pub value: String,
}

impl Expression {
    pub fn parse(src: &str) -> Option<Self> {
        let caps = EXPRESSION.captures(src)?;
        let operation = match &caps[2] {
            "=" => Operator::Eq,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Le,
            ">=" => Operator::Ge,
            _ => return None,
        };
        Some(Self { option: caps[1].to_string(), operation, value: caps[3].to_string() })
    }
}

// ------------------------------ Descriptor ------------------------------- //

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// property name; empty means "emit nothing for this member"
    pub name: String,
    pub title: Option<String>,
    pub required: bool,
    pub ignored: bool,
    // string specific
    pub format: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    // number specific
    pub multiple_of: Option<u64>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    // array specific
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    // conditions
    pub show_if: Option<Expression>,
    pub hide_if: Option<Expression>,
}

impl FieldDescriptor {
    pub fn parse(raw: &str) -> Self {
        let tag = StructTag::parse(raw);
        let mut out = Self::default();

        match tag.lookup(TAG_NAME) {
            Some(name) => out.name = name.to_string(),
            // `omitempty` and other json options are dropped
            None => if let Some(json) = tag.lookup(TAG_JSON) {
                out.name = json.split(',').next().unwrap_or_default().to_string();
            },
        }

        for (key, value) in tag.entries() {
            if !matches!(key, TAG_NAME | TAG_JSON | TAG_JSONSCHEMA) {
                out.set(key, value);
            }
        }

        if let Some(schema) = tag.lookup(TAG_JSONSCHEMA) {
            for (i, part) in schema.split(',').map(str::trim).enumerate() {
                if part.is_empty() { continue; }
                if i == 0 && part == IGNORE_SENTINEL {
                    out.ignored = true;
                } else if let Some((key, value)) = part.split_once('=') {
                    out.set(key.trim(), value.trim());
                } else {
                    out.set(part, "true");
                }
            }
        }

        if out.name == IGNORE_SENTINEL {
            out.ignored = true;
        }
        out
    }

    /// No property is emitted for this member.
    pub fn is_skipped(&self) -> bool { self.ignored || self.name.is_empty() }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "title" => self.title = Some(value.to_string()).filter(|t| !t.is_empty()),
            "required" => self.required = parse_bool(value),
            "ignore" => self.ignored = parse_bool(value),
            // string
            "format" => self.format = Some(value.to_string()).filter(|f| !f.is_empty()),
            "minLength" => self.min_length = value.trim().parse().ok(),
            "maxLength" => self.max_length = value.trim().parse().ok(),
            // number
            "multipleOf" => self.multiple_of = value.trim().parse::<u64>().ok().filter(|n| *n > 0),
            "minimum" => self.minimum = value.trim().parse().ok(),
            "maximum" => self.maximum = value.trim().parse().ok(),
            "exclusiveMinimum" => self.exclusive_minimum = parse_bool(value),
            "exclusiveMaximum" => self.exclusive_maximum = parse_bool(value),
            // array
            "minItems" => self.min_items = value.trim().parse().ok(),
            "maxItems" => self.max_items = value.trim().parse().ok(),
            "uniqueItems" => self.unique_items = parse_bool(value),
            // conditions
            "show_if" => self.show_if = Expression::parse(value),
            "hide_if" => self.hide_if = Expression::parse(value),
            _ => {}
        }
    }
}

/// Accepts the same spellings as Go's `strconv.ParseBool`; anything else is false.
fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True")
}

// ------------------------------- Reader ---------------------------------- //

/// Source of field descriptors. The walker only ever sees the descriptor.
pub trait ReadDescriptor {
    fn read(&self, field: &Field) -> FieldDescriptor;
}

/// Reads descriptors from each field's struct tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagReader;

impl ReadDescriptor for TagReader {
    fn read(&self, field: &Field) -> FieldDescriptor { FieldDescriptor::parse(&field.tag) }
}

impl<F> ReadDescriptor for F
where
    F: Fn(&Field) -> FieldDescriptor,
{
    fn read(&self, field: &Field) -> FieldDescriptor { self(field) }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn struct_tag_unescapes_quotes() {
        let tag = StructTag::parse(r#"json:"sku_price" title:"Show \"price\"""#);
        assert_eq!(tag.lookup("json"), Some("sku_price"));
        assert_eq!(tag.lookup("title"), Some(r#"Show "price""#));
        assert_eq!(tag.lookup("missing"), None);
    }

    #[test]
    fn struct_tag_stops_at_malformed_entry() {
        let tag = StructTag::parse(r#"json:"a" broken title:"b""#);
        assert_eq!(tag.lookup("json"), Some("a"));
        assert_eq!(tag.lookup("title"), None);
        assert_eq!(StructTag::parse(r#"json:"unterminated"#).lookup("json"), None);
    }

    #[test]
    fn json_name_drops_options() {
        let d = FieldDescriptor::parse(r#"json:"friends,omitempty""#);
        assert_eq!(d.name, "friends");
        assert!(!d.required);
        assert!(!d.is_skipped());
    }

    #[test]
    fn name_key_wins_over_json() {
        let d = FieldDescriptor::parse(r#"json:"a" name:"b""#);
        assert_eq!(d.name, "b");
    }

    #[test]
    fn ignore_sentinels() {
        assert!(FieldDescriptor::parse(r#"json:"-" jsonschema:"required""#).is_skipped());
        assert!(FieldDescriptor::parse(r#"json:"x" jsonschema:"-,required""#).ignored);
        assert!(FieldDescriptor::parse(r#"name:"-""#).ignored);
        assert!(FieldDescriptor::parse(r#"json:"x" ignore:"true""#).ignored);
    }

    #[test]
    fn empty_name_is_skipped() {
        assert!(FieldDescriptor::parse("").is_skipped());
        assert!(FieldDescriptor::parse(r#"jsonschema:"required""#).is_skipped());
        assert!(FieldDescriptor::parse(r#"json:",omitempty""#).is_skipped());
    }

    #[test]
    fn plain_keys_set_constraints() {
        let d = FieldDescriptor::parse(
            r#"json:"age" title:"Age" required:"true" minimum:"18" maximum:"120" exclusiveMaximum:"true" multipleOf:"2""#,
        );
        assert_eq!(d, FieldDescriptor {
            name: "age".into(),
            title: Some("Age".into()),
            required: true,
            minimum: Some(18),
            maximum: Some(120),
            exclusive_maximum: true,
            multiple_of: Some(2),
            ..FieldDescriptor::default()
        });
    }

    #[test]
    fn jsonschema_mini_format_overrides_plain_keys() {
        let d = FieldDescriptor::parse(
            r#"json:"name" maxLength:"5" jsonschema:"required,minLength=1,maxLength=20,format=email""#,
        );
        assert!(d.required);
        assert_eq!(d.min_length, Some(1));
        assert_eq!(d.max_length, Some(20));
        assert_eq!(d.format.as_deref(), Some("email"));
    }

    #[test]
    fn malformed_values_read_as_absent() {
        let d = FieldDescriptor::parse(r#"json:"n" minLength:"abc" minimum:"1.5" required:"yes" uniqueItems:"T""#);
        assert_eq!(d.min_length, None);
        assert_eq!(d.minimum, None);
        assert!(!d.required);
        assert!(d.unique_items);
    }

    #[test]
    fn zero_multiple_of_reads_as_absent() {
        assert_eq!(FieldDescriptor::parse(r#"json:"n" multipleOf:"0""#).multiple_of, None);
        assert_eq!(FieldDescriptor::parse(r#"json:"n" jsonschema:"multipleOf=0""#).multiple_of, None);
        assert_eq!(FieldDescriptor::parse(r#"json:"n" jsonschema:"multipleOf=5""#).multiple_of, Some(5));
    }

    #[test]
    fn struct_tag_decodes_hex_and_unicode_escapes() {
        let tag = StructTag::parse(r#"title:"caf\u00e9 \x41\U0001F600" json:"x""#);
        assert_eq!(tag.lookup("title"), Some("café A\u{1F600}"));
        assert_eq!(tag.lookup("json"), Some("x"));
        // a bad escape ends parsing like an unterminated value
        assert_eq!(StructTag::parse(r#"title:"\uZZZZ" json:"x""#).lookup("json"), None);
    }

    #[test]
    fn conditions_parse_expressions() {
        let d = FieldDescriptor::parse(r#"json:"x" show_if:"mode=advanced" hide_if:"level>=expert""#);
        assert_eq!(d.show_if, Some(Expression {
            option: "mode".into(),
            operation: Operator::Eq,
            value: "advanced".into(),
        }));
        assert_eq!(d.hide_if.map(|e| e.operation), Some(Operator::Ge));
        assert_eq!(Expression::parse("NOPE"), None);
    }

    #[test]
    fn closures_are_readers() {
        let reader = |f: &Field| FieldDescriptor { name: f.ident.to_uppercase(), ..Default::default() };
        let field = Field::new("id", "", crate::types::Type::string);
        assert_eq!(reader.read(&field).name, "ID");
        assert_eq!(TagReader.read(&Field::new("id", r#"json:"id""#, crate::types::Type::string)).name, "id");
    }
}
