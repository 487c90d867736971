//! Flag schemas compiled from descriptor strings
//!
//! A descriptor is `name||default||usage`. The default literal picks the flag
//! type: `true`/`false` (any case) makes a boolean flag, anything else a
//! string flag. Parsing an argv tail against a schema goes through a clap
//! `Command` built at runtime.
//!
//! Flags may be written with one dash or two: `-out x`, `-out=x` and
//! `--out=x` are the same flag.

use std::collections::BTreeMap;

use clap::builder::BoolishValueParser;
use clap::{Arg, ArgAction, ColorChoice, Command};
use serde_json::Value;

use crate::error::ConfigError;

/// Separator between the three descriptor fields
pub const DESCRIPTOR_DELIMITER: &str = "||";

/// Clap id for the positional tail. Flag names cannot contain `=`, so this
/// never collides with a user flag.
const POSITIONAL_ID: &str = "=args";

/// Type and default of a flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    Bool(bool),
    Str(String),
}

/// A compiled flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDefinition {
    pub name: String,
    pub kind: FlagKind,
    pub usage: String,
}

impl FlagDefinition {
    /// Compile a single `name||default||usage` descriptor
    pub fn from_descriptor(descriptor: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = descriptor.split(DESCRIPTOR_DELIMITER).collect();
        let [name, default, usage] = parts.as_slice() else {
            return Err(ConfigError::MalformedDescriptor {
                descriptor: descriptor.to_string(),
                fields: parts.len(),
            });
        };

        let name = name.trim();
        let default = default.trim();
        let usage = usage.trim();

        if !is_valid_flag_name(name) {
            return Err(ConfigError::InvalidFlagName(name.to_string()));
        }

        let kind = if default.eq_ignore_ascii_case("true") {
            FlagKind::Bool(true)
        } else if default.eq_ignore_ascii_case("false") {
            FlagKind::Bool(false)
        } else {
            FlagKind::Str(default.to_string())
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            usage: usage.to_string(),
        })
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, FlagKind::Bool(_))
    }

    /// Default value as it appears in help text
    pub fn default_literal(&self) -> String {
        match &self.kind {
            FlagKind::Bool(b) => b.to_string(),
            FlagKind::Str(s) => format!("{:?}", s),
        }
    }

    fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .action(ArgAction::Set);

        match &self.kind {
            FlagKind::Bool(default) => arg
                .value_name("BOOL")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .default_value(if *default { "true" } else { "false" })
                .value_parser(BoolishValueParser::new()),
            FlagKind::Str(default) => arg
                .value_name("VALUE")
                .num_args(1)
                .allow_hyphen_values(true)
                .default_value(default.clone()),
        }
    }
}

fn is_valid_flag_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.contains('=')
        && !name.chars().any(char::is_whitespace)
}

/// A parsed flag value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Str(String),
}

impl From<FlagValue> for Value {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::Bool(b) => Value::Bool(b),
            FlagValue::Str(s) => Value::String(s),
        }
    }
}

/// Result of parsing an argv tail against a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Every flag in the schema, explicit or defaulted
    pub flags: BTreeMap<String, FlagValue>,
    /// Positional tokens, in order
    pub args: Vec<String>,
}

/// All flags of one command, keyed by name
#[derive(Debug, Clone, Default)]
pub struct FlagSchema {
    command: String,
    flags: BTreeMap<String, FlagDefinition>,
}

impl FlagSchema {
    /// Compile the descriptors of one command
    pub fn compile<S: AsRef<str>>(command: &str, descriptors: &[S]) -> Result<Self, ConfigError> {
        let mut flags = BTreeMap::new();

        for descriptor in descriptors {
            let def = FlagDefinition::from_descriptor(descriptor.as_ref())?;
            if flags.contains_key(&def.name) {
                return Err(ConfigError::DuplicateFlag {
                    command: command.to_string(),
                    flag: def.name,
                });
            }
            flags.insert(def.name.clone(), def);
        }

        Ok(Self {
            command: command.to_string(),
            flags,
        })
    }

    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.get(name)
    }

    /// Definitions in name order
    pub fn iter(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Parse the arguments that follow the command token
    ///
    /// On failure the error is a one-line description of what went wrong.
    pub fn parse(&self, args: &[String]) -> Result<ParsedArgs, String> {
        let matches = self
            .command()
            .try_get_matches_from(self.normalize(args))
            .map_err(|e| first_line(&e.render().to_string()))?;

        let mut flags = BTreeMap::new();
        for def in self.flags.values() {
            let value = match &def.kind {
                FlagKind::Bool(default) => FlagValue::Bool(
                    matches.get_one::<bool>(&def.name).copied().unwrap_or(*default),
                ),
                FlagKind::Str(default) => FlagValue::Str(
                    matches
                        .get_one::<String>(&def.name)
                        .cloned()
                        .unwrap_or_else(|| default.clone()),
                ),
            };
            flags.insert(def.name.clone(), value);
        }

        let args = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Ok(ParsedArgs { flags, args })
    }

    /// Rewrite single-dash flags to the long form clap expects
    ///
    /// Rewriting stops at `--`, at a lone `-` and at the first positional;
    /// the value token of a string flag is passed through untouched.
    fn normalize(&self, args: &[String]) -> Vec<String> {
        let mut normalized = Vec::with_capacity(args.len());
        let mut tokens = args.iter();

        while let Some(token) = tokens.next() {
            let Some(body) = token.strip_prefix('-').filter(|b| !b.is_empty()) else {
                normalized.push(token.clone());
                normalized.extend(tokens.by_ref().cloned());
                break;
            };
            if body == "-" {
                normalized.push(token.clone());
                normalized.extend(tokens.by_ref().cloned());
                break;
            }

            let body = body.strip_prefix('-').unwrap_or(body);
            let (name, inline_value) = match body.split_once('=') {
                Some((name, _)) => (name, true),
                None => (body, false),
            };
            normalized.push(format!("--{}", body));

            let takes_value = self.get(name).is_some_and(|def| !def.is_bool());
            if takes_value && !inline_value {
                if let Some(value) = tokens.next() {
                    normalized.push(value.clone());
                }
            }
        }

        normalized
    }

    fn command(&self) -> Command {
        let positional = Arg::new(POSITIONAL_ID)
            .value_name("ARGS")
            .num_args(1..)
            .trailing_var_arg(true)
            .action(ArgAction::Append);

        self.flags.values().fold(
            Command::new(self.command.clone())
                .no_binary_name(true)
                .disable_help_flag(true)
                .disable_version_flag(true)
                .args_override_self(true)
                .color(ColorChoice::Never)
                .arg(positional),
            |cmd, def| cmd.arg(def.to_arg()),
        )
    }
}

fn first_line(rendered: &str) -> String {
    let line = rendered.lines().next().unwrap_or_default().trim();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn schema() -> FlagSchema {
        FlagSchema::compile(
            "build",
            &[
                "verbose||false||enable verbose output",
                "out||result.txt||output path",
                "color || TRUE || colorize output",
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bool_descriptor() {
        let def = FlagDefinition::from_descriptor("verbose||false||enable verbose output").unwrap();
        assert_eq!(def.name, "verbose");
        assert_eq!(def.kind, FlagKind::Bool(false));
        assert_eq!(def.usage, "enable verbose output");
    }

    #[test]
    fn test_string_descriptor() {
        let def = FlagDefinition::from_descriptor("out||result.txt||output path").unwrap();
        assert_eq!(def.name, "out");
        assert_eq!(def.kind, FlagKind::Str("result.txt".to_string()));
        assert_eq!(def.usage, "output path");
    }

    #[test]
    fn test_fields_are_trimmed_and_bool_is_case_insensitive() {
        let def = FlagDefinition::from_descriptor("  color || TRUE ||  colorize  ").unwrap();
        assert_eq!(def.name, "color");
        assert_eq!(def.kind, FlagKind::Bool(true));
        assert_eq!(def.usage, "colorize");
    }

    #[test]
    fn test_two_fields_is_config_error() {
        let err = FlagDefinition::from_descriptor("verbose||false").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedDescriptor { fields: 2, .. }
        ));
    }

    #[test]
    fn test_four_fields_is_config_error() {
        let err = FlagDefinition::from_descriptor("a||b||c||d").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedDescriptor { fields: 4, .. }
        ));
    }

    #[test]
    fn test_invalid_flag_names() {
        for descriptor in ["||x||usage", "-v||x||usage", "a=b||x||usage", "two words||x||usage"] {
            assert!(
                matches!(
                    FlagDefinition::from_descriptor(descriptor),
                    Err(ConfigError::InvalidFlagName(_))
                ),
                "{descriptor} should be rejected"
            );
        }
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        let err = FlagSchema::compile("build", &["v||false||a", "v||x||b"]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFlag { .. }));
    }

    #[test]
    fn test_schema_iterates_in_name_order() {
        let schema = schema();
        let names: Vec<&str> = schema.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["color", "out", "verbose"]);
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = schema().parse(&[]).unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(false));
        assert_eq!(parsed.flags["color"], FlagValue::Bool(true));
        assert_eq!(parsed.flags["out"], FlagValue::Str("result.txt".to_string()));
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_parse_flags_and_positionals() {
        let parsed = schema()
            .parse(&argv(&["--verbose", "--out", "a.txt", "--color=false", "src", "--verbose"]))
            .unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(true));
        assert_eq!(parsed.flags["color"], FlagValue::Bool(false));
        assert_eq!(parsed.flags["out"], FlagValue::Str("a.txt".to_string()));
        assert_eq!(parsed.args, argv(&["src", "--verbose"]));
    }

    #[test]
    fn test_parse_equals_form_and_override() {
        let parsed = schema().parse(&argv(&["--out=a", "--out=b"])).unwrap();
        assert_eq!(parsed.flags["out"], FlagValue::Str("b".to_string()));
    }

    #[test]
    fn test_parse_double_dash_ends_flags() {
        let parsed = schema().parse(&argv(&["--", "--verbose"])).unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(false));
        assert_eq!(parsed.args, argv(&["--verbose"]));
    }

    #[test]
    fn test_parse_single_dash_flags() {
        let parsed = schema()
            .parse(&argv(&["-verbose", "-out", "-dir/a.txt", "-color=false", "src", "-verbose"]))
            .unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(true));
        assert_eq!(parsed.flags["color"], FlagValue::Bool(false));
        assert_eq!(parsed.flags["out"], FlagValue::Str("-dir/a.txt".to_string()));
        assert_eq!(parsed.args, argv(&["src", "-verbose"]));
    }

    #[test]
    fn test_parse_single_dash_equals_form() {
        let parsed = schema().parse(&argv(&["-out=b.txt"])).unwrap();
        assert_eq!(parsed.flags["out"], FlagValue::Str("b.txt".to_string()));
    }

    #[test]
    fn test_single_dash_stops_at_separator_and_stdin_marker() {
        let parsed = schema().parse(&argv(&["--", "-verbose"])).unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(false));
        assert_eq!(parsed.args, argv(&["-verbose"]));

        let parsed = schema().parse(&argv(&["-", "-verbose"])).unwrap();
        assert_eq!(parsed.flags["verbose"], FlagValue::Bool(false));
        assert_eq!(parsed.args, argv(&["-", "-verbose"]));
    }

    #[test]
    fn test_unknown_single_dash_flag_named_in_error() {
        let err = schema().parse(&argv(&["-bogus"])).unwrap_err();
        assert!(err.contains("--bogus"), "{err}");
    }

    #[test]
    fn test_parse_unknown_flag() {
        let err = schema().parse(&argv(&["--bogus"])).unwrap_err();
        assert!(err.contains("--bogus"), "{err}");
    }

    #[test]
    fn test_parse_missing_string_value() {
        assert!(schema().parse(&argv(&["--out"])).is_err());
    }

    #[test]
    fn test_parse_bad_bool_value() {
        assert!(schema().parse(&argv(&["--verbose=maybe"])).is_err());
    }

    #[test]
    fn test_flag_value_to_json() {
        assert_eq!(Value::from(FlagValue::Bool(true)), Value::Bool(true));
        assert_eq!(
            Value::from(FlagValue::Str("x".to_string())),
            Value::String("x".to_string())
        );
    }
}
