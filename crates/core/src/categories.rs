use crate::error::CategoryNotFoundError;
use anyhow::{Context, Result};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::Path;

/// Synthesized category that flattens every configured one.
pub const ALL_CATEGORY: &str = "all";

/// Ordered category -> ticker symbols table, loaded once at startup.
///
/// Names are stored lowercased and symbols uppercased. Configuration order is
/// kept because `all` concatenates the categories in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: Vec<(String, Vec<String>)>,
}

impl CategoryTable {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tickers file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid tickers file {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: OrderedTable = serde_json::from_str(text)
            .context("tickers file must be a JSON object of string arrays")?;
        Self::from_entries(raw.0)
    }

    pub fn from_entries<I, N, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Vec<S>)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut out: Vec<(String, Vec<String>)> = Vec::new();
        for (name, symbols) in entries {
            let name = name.as_ref().trim().to_lowercase();
            anyhow::ensure!(!name.is_empty(), "category name must be non-empty");
            anyhow::ensure!(
                name != ALL_CATEGORY,
                "'{ALL_CATEGORY}' is reserved and cannot be configured as a category"
            );
            anyhow::ensure!(
                !out.iter().any(|(existing, _)| *existing == name),
                "duplicate category '{name}' (names are case-insensitive)"
            );

            let mut canonical = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                let symbol = symbol.as_ref().trim().to_uppercase();
                anyhow::ensure!(
                    !symbol.is_empty(),
                    "category '{name}' contains an empty ticker symbol"
                );
                canonical.push(symbol);
            }
            anyhow::ensure!(
                !canonical.is_empty(),
                "category '{name}' must list at least one ticker"
            );

            out.push((name, canonical));
        }

        anyhow::ensure!(!out.is_empty(), "at least one category must be configured");
        Ok(Self { entries: out })
    }

    /// Looks up a category case-insensitively; `all` flattens every category
    /// in configuration order, duplicates included.
    pub fn resolve(&self, category: &str) -> Result<Vec<String>, CategoryNotFoundError> {
        let key = category.to_lowercase();
        if key == ALL_CATEGORY {
            return Ok(self
                .entries
                .iter()
                .flat_map(|(_, symbols)| symbols.iter().cloned())
                .collect());
        }

        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, symbols)| symbols.clone())
            .ok_or_else(|| CategoryNotFoundError { category: key })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Keeps JSON object key order, which a map type would lose.
struct OrderedTable(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for OrderedTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedTableVisitor;

        impl<'de> Visitor<'de> for OrderedTableVisitor {
            type Value = OrderedTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping category names to arrays of tickers")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, symbols)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((name, symbols));
                }
                Ok(OrderedTable(entries))
            }
        }

        deserializer.deserialize_map(OrderedTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CategoryTable {
        CategoryTable::from_json_str(
            r#"{
                "tech": ["AAPL", "MSFT", "nvda"],
                "Chips": ["NVDA", "AMD"],
                "oil": ["XOM"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn resolves_configured_category_in_order() {
        let t = table();
        assert_eq!(t.resolve("tech").unwrap(), vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(t.resolve("oil").unwrap(), vec!["XOM"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let t = table();
        assert_eq!(t.resolve("CHIPS").unwrap(), vec!["NVDA", "AMD"]);
        assert_eq!(t.resolve("Tech").unwrap(), t.resolve("tech").unwrap());
    }

    #[test]
    fn all_concatenates_in_config_order_keeping_duplicates() {
        let t = table();
        let expected = vec!["AAPL", "MSFT", "NVDA", "NVDA", "AMD", "XOM"];
        assert_eq!(t.resolve("all").unwrap(), expected);
        assert_eq!(t.resolve("ALL").unwrap(), expected);
        assert_eq!(t.resolve("aLl").unwrap(), expected);
    }

    #[test]
    fn unknown_category_is_not_found() {
        let err = table().resolve("nonexistent").unwrap_err();
        assert_eq!(err.category, "nonexistent");
        assert_eq!(err.to_string(), "Category 'nonexistent' not found.");

        let err = table().resolve("FOO").unwrap_err();
        assert_eq!(err.category, "foo");
        assert_eq!(err.to_string(), "Category 'foo' not found.");
    }

    #[test]
    fn names_follow_config_order() {
        let t = table();
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["tech", "chips", "oil"]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn rejects_invalid_tables() {
        assert!(CategoryTable::from_json_str("{}").is_err());
        assert!(CategoryTable::from_json_str(r#"{"tech": []}"#).is_err());
        assert!(CategoryTable::from_json_str(r#"{"tech": ["AAPL", " "]}"#).is_err());
        assert!(CategoryTable::from_json_str(r#"{"all": ["AAPL"]}"#).is_err());
        assert!(CategoryTable::from_json_str(r#"{"tech": ["A"], "TECH": ["B"]}"#).is_err());
        assert!(CategoryTable::from_json_str(r#"["AAPL"]"#).is_err());
        assert!(CategoryTable::from_json_str(r#"{"tech": [1]}"#).is_err());
    }

    #[test]
    fn builds_from_entries() {
        let t = CategoryTable::from_entries([("Tech", vec!["aapl"])]).unwrap();
        assert_eq!(t.resolve("tech").unwrap(), vec!["AAPL"]);
    }
}
