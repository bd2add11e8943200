use std::fmt;

/// Structured value handed to a log call.
///
/// Mirrors what test code tends to log: plain messages, command output as raw bytes,
/// config mappings, and sequences of the above nested to any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Key/value mapping in insertion order.
    Map(Vec<(String, Payload)>),
    List(Vec<Payload>),
    Tuple(Vec<Payload>),
}

impl Payload {
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Payload>,
    {
        Payload::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Payload>,
    {
        Payload::List(items.into_iter().map(Into::into).collect())
    }

    pub fn tuple<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Payload>,
    {
        Payload::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn bytes(raw: impl Into<Vec<u8>>) -> Self {
        Payload::Bytes(raw.into())
    }

    /// Value stored under `key` when this is a map.
    pub fn get(&self, key: &str) -> Option<&Payload> {
        match self {
            Payload::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Str(v.to_string())
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Str(v)
    }
}

impl From<&String> for Payload {
    fn from(v: &String) -> Self {
        Payload::Str(v.clone())
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Int(v)
    }
}

impl From<i32> for Payload {
    fn from(v: i32) -> Self {
        Payload::Int(v.into())
    }
}

impl From<u32> for Payload {
    fn from(v: u32) -> Self {
        Payload::Int(v.into())
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(v: Option<T>) -> Self {
        v.map_or(Payload::Null, Into::into)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(v: Vec<Payload>) -> Self {
        Payload::List(v)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Payload::Null,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Payload::Int(i),
                None => Payload::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Payload::Str(s),
            Value::Array(items) => Payload::List(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => {
                Payload::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Top-level strings render bare; anything nested renders quoted.
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Str(s) => f.write_str(s),
            other => write_nested(other, f),
        }
    }
}

fn write_nested(p: &Payload, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match p {
        Payload::Null => f.write_str("None"),
        Payload::Bool(true) => f.write_str("True"),
        Payload::Bool(false) => f.write_str("False"),
        Payload::Int(i) => write!(f, "{i}"),
        Payload::Float(x) => write!(f, "{x:?}"),
        Payload::Str(s) => write!(f, "{s:?}"),
        Payload::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
        Payload::Map(entries) => {
            f.write_str("{")?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{k:?}: ")?;
                write_nested(v, f)?;
            }
            f.write_str("}")
        }
        Payload::List(items) => {
            f.write_str("[")?;
            write_seq(items, f)?;
            f.write_str("]")
        }
        Payload::Tuple(items) => {
            f.write_str("(")?;
            write_seq(items, f)?;
            if items.len() == 1 {
                f.write_str(",")?;
            }
            f.write_str(")")
        }
    }
}

fn write_seq(items: &[Payload], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_nested(item, f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_nested_values() {
        let p = Payload::map([
            ("name", Payload::from("osd.1")),
            ("up", Payload::from(true)),
            ("weight", Payload::from(0.5)),
            ("pgs", Payload::list([1i64, 2])),
            ("pair", Payload::tuple(["a"])),
            ("raw", Payload::bytes(b"ok\n".to_vec())),
            ("none", Payload::Null),
        ]);
        assert_eq!(
            p.to_string(),
            r#"{"name": "osd.1", "up": True, "weight": 0.5, "pgs": [1, 2], "pair": ("a",), "raw": b"ok\n", "none": None}"#
        );
    }

    #[test]
    fn top_level_string_is_bare() {
        assert_eq!(Payload::from("cluster is healthy").to_string(), "cluster is healthy");
    }

    #[test]
    fn from_json_keeps_shape() {
        let p: Payload = serde_json::json!({"pool": "rbd", "size": 3, "ratio": 0.85}).into();
        assert_eq!(p.get("pool").and_then(Payload::as_str), Some("rbd"));
        assert_eq!(p.get("size"), Some(&Payload::Int(3)));
        assert_eq!(p.get("ratio"), Some(&Payload::Float(0.85)));
        assert!(p.get("missing").is_none());
    }
}
