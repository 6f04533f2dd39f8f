//! Cmdlet specification tokenizer.
//!
//! Grammar: `<actionName> [-<param> <value>]*`, whitespace-delimited, with
//! `;` chaining multiple actions in one submission. Each segment parses
//! independently with the same grammar.

use strata_core::{ArgMap, EngineError, EngineResult};

/// One action parsed out of a cmdlet spec: its name and ordered parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAction {
    /// Action name, resolved against the registry by the manager
    pub name: String,
    /// Parameters in submission order, keys without the leading dash
    pub args: ArgMap,
}

/// Parse a cmdlet spec into its ordered action list.
///
/// Registry resolution happens in the manager; this is pure grammar.
///
/// # Errors
///
/// `Parse` error for an empty spec, a flag in action-name position, or a
/// flag with no following value token.
pub fn parse_cmdlet(spec: &str) -> EngineResult<Vec<ParsedAction>> {
    let mut actions = Vec::new();

    for segment in spec.split(';') {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let name = tokens[0];
        if name.starts_with('-') {
            return Err(EngineError::Parse {
                message: format!("expected action name, found flag {}", name),
            });
        }

        let mut args = ArgMap::new();
        let mut i = 1;
        while i < tokens.len() {
            let key = tokens[i].strip_prefix('-').ok_or_else(|| EngineError::Parse {
                message: format!("expected -flag, found {}", tokens[i]),
            })?;
            if key.is_empty() {
                return Err(EngineError::Parse {
                    message: "bare dash is not a flag".to_string(),
                });
            }
            let value = tokens.get(i + 1).ok_or_else(|| EngineError::Parse {
                message: format!("flag -{} has no value", key),
            })?;
            args.insert(key.to_string(), (*value).to_string());
            i += 2;
        }

        actions.push(ParsedAction {
            name: name.to_string(),
            args,
        });
    }

    if actions.is_empty() {
        return Err(EngineError::Parse {
            message: "empty cmdlet spec".to_string(),
        });
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_action() {
        let parsed = parse_cmdlet("compress -file /file1 -bufSize 131072").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "compress");
        assert_eq!(parsed[0].args.get("file").map(String::as_str), Some("/file1"));
        assert_eq!(
            parsed[0].args.get("bufSize").map(String::as_str),
            Some("131072")
        );
    }

    #[test]
    fn test_action_without_params() {
        let parsed = parse_cmdlet("uncache -file /f").unwrap();
        assert_eq!(parsed[0].name, "uncache");
        assert_eq!(parsed[0].args.len(), 1);
    }

    #[test]
    fn test_chained_actions_keep_order() {
        let parsed =
            parse_cmdlet("cache -file /f; move -file /f -storagePolicy COLD; uncache -file /f")
                .unwrap();
        let names: Vec<&str> = parsed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "move", "uncache"]);
    }

    #[test]
    fn test_trailing_delimiter_tolerated() {
        let parsed = parse_cmdlet("cache -file /f;").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_params_preserve_order() {
        let parsed = parse_cmdlet("compress -file /f -bufSize 1024 -codec zstd").unwrap();
        let keys: Vec<&String> = parsed[0].args.keys().collect();
        assert_eq!(keys, vec!["file", "bufSize", "codec"]);
    }

    #[test]
    fn test_empty_spec_rejected() {
        assert!(parse_cmdlet("").is_err());
        assert!(parse_cmdlet("   ").is_err());
        assert!(parse_cmdlet(" ; ; ").is_err());
    }

    #[test]
    fn test_flag_in_name_position_rejected() {
        let err = parse_cmdlet("-file /f").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_dangling_flag_rejected() {
        let err = parse_cmdlet("compress -file").unwrap_err();
        assert!(err.to_string().contains("-file has no value"));
    }

    #[test]
    fn test_value_without_flag_rejected() {
        assert!(parse_cmdlet("compress file").is_err());
    }

    #[test]
    fn test_duplicate_flag_last_wins() {
        let parsed = parse_cmdlet("cache -file /a -file /b").unwrap();
        assert_eq!(parsed[0].args.get("file").map(String::as_str), Some("/b"));
        assert_eq!(parsed[0].args.len(), 1);
    }

    #[test]
    fn test_extra_whitespace_tolerated() {
        let parsed = parse_cmdlet("  cache   -file   /f  ").unwrap();
        assert_eq!(parsed[0].name, "cache");
        assert_eq!(parsed[0].args.get("file").map(String::as_str), Some("/f"));
    }
}
