//! Reply message tables and per-guild language preferences.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use crate::utils::prelude::*;

/// Tables shipped with the binary, as `(language tag, json)`.
const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.json")),
    ("es", include_str!("../locales/es.json")),
];

type Table = HashMap<String, String>;

/// Message tables by language tag.
#[derive(Debug, Clone)]
pub struct Localization {
    default: String,
    tables: BTreeMap<String, Table>,
}

impl Localization {
    /// Load the embedded tables.
    pub fn embedded(default: &str) -> AnyResult<Self> {
        let tables = EMBEDDED
            .iter()
            .map(|(lang, json)| {
                serde_json::from_str::<Table>(json)
                    .with_context(|| format!("Invalid locale table '{lang}'"))
                    .map(|t| (lang.to_string(), t))
            })
            .collect::<AnyResult<_>>()?;

        Self::new(default, tables)
    }

    /// Create from tables. The default language must have a table.
    pub fn new(default: &str, tables: BTreeMap<String, Table>) -> AnyResult<Self> {
        anyhow::ensure!(
            tables.contains_key(default),
            "Default language '{default}' has no message table"
        );

        Ok(Self {
            default: default.to_string(),
            tables,
        })
    }

    /// Returns `true` if there is a table for the language.
    pub fn supports(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }

    /// Supported language tags.
    pub fn languages(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Resolve a message by key. Falls back to the default language, then to the key itself.
    /// `{name}` placeholders are replaced from `subs`; placeholders without a value are kept.
    pub fn message(&self, key: &str, language: &str, subs: &[(&str, &str)]) -> String {
        let format = self
            .lookup(language, key)
            .or_else(|| self.lookup(&self.default, key))
            .unwrap_or_else(|| {
                warn!("Missing message '{key}'");
                key
            });

        substitute(format, subs)
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.tables
            .get(language)
            .and_then(|t| t.get(key))
            .map(String::as_str)
    }
}

/// Replaces `{name}` placeholders in one pass. Inserted values are never rescanned.
fn substitute(format: &str, subs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let value = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            subs.iter()
                .find(|(n, _)| *n == name)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('{');
                rest = &tail[1..];
            },
        }
    }

    out.push_str(rest);
    out
}

/// Selected reply language per guild. Kept in memory only.
#[derive(Debug)]
pub struct LanguagePrefs {
    default: String,
    guilds: RwLock<HashMap<Id<GuildMarker>, String>>,
}

impl LanguagePrefs {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            guilds: RwLock::new(HashMap::new()),
        }
    }

    /// Language of a guild, or the default one outside of guilds.
    pub fn get(&self, guild_id: Option<Id<GuildMarker>>) -> String {
        guild_id
            .and_then(|id| {
                self.guilds
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(&id)
                    .cloned()
            })
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn set(&self, guild_id: Id<GuildMarker>, language: impl Into<String>) {
        self.guilds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(guild_id, language.into());
    }
}

/// Format a localized message with named substitutions.
///
/// ```ignore
/// tr!(ctx, guild_id, "build.not_found", name = code, prefix = prefix)
/// ```
macro_rules! tr {
    ($ctx:expr, $guild:expr, $key:expr $(, $name:ident = $value:expr )* $(,)?) => {
        $ctx.locales.message(
            $key,
            &$ctx.languages.get($guild),
            &[ $( (stringify!($name), $value.to_string().as_str()) ),* ],
        )
    };
}

pub(crate) use tr;

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Localization {
        let en = Table::from([
            ("hello".to_string(), "Hello {name}!".to_string()),
            ("only_en".to_string(), "English".to_string()),
        ]);
        let es = Table::from([("hello".to_string(), "¡Hola {name}!".to_string())]);

        Localization::new(
            "en",
            BTreeMap::from([("en".to_string(), en), ("es".to_string(), es)]),
        )
        .unwrap()
    }

    #[test]
    fn resolves_by_language() {
        let l = tables();
        assert_eq!(l.message("hello", "es", &[("name", "Ana")]), "¡Hola Ana!");
        assert_eq!(l.message("hello", "en", &[("name", "Ana")]), "Hello Ana!");
    }

    #[test]
    fn falls_back_to_default_then_key() {
        let l = tables();
        assert_eq!(l.message("only_en", "es", &[]), "English");
        assert_eq!(l.message("only_en", "fi", &[]), "English");
        assert_eq!(l.message("nowhere", "es", &[]), "nowhere");
    }

    #[test]
    fn missing_substitution_is_kept() {
        let l = tables();
        assert_eq!(l.message("hello", "en", &[]), "Hello {name}!");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let text = substitute(
            "No template {name}, try {prefix}build",
            &[("name", "{prefix}"), ("prefix", "!")],
        );
        assert_eq!(text, "No template {prefix}, try !build");

        assert_eq!(substitute("{a} {b} {", &[("b", "x")]), "{a} x {");
        assert_eq!(substitute("{{name}}", &[("name", "x")]), "{x}");
    }

    #[test]
    fn default_needs_a_table() {
        assert!(Localization::new("fi", BTreeMap::new()).is_err());
    }

    #[test]
    fn embedded_tables_share_keys() {
        let l = Localization::embedded("en").unwrap();
        let en = &l.tables["en"];

        for (lang, table) in &l.tables {
            for key in en.keys() {
                assert!(table.contains_key(key), "'{lang}' is missing '{key}'");
            }
        }
    }

    #[test]
    fn guild_preferences() {
        let prefs = LanguagePrefs::new("en");
        let guild = Id::new(7);

        assert_eq!(prefs.get(Some(guild)), "en");
        prefs.set(guild, "es");
        assert_eq!(prefs.get(Some(guild)), "es");
        assert_eq!(prefs.get(Some(Id::new(8))), "en");
        assert_eq!(prefs.get(None), "en");
    }
}
