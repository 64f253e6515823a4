//! Subcommand definitions and dispatch onto LibraryService.

use bibshelf_core::{Entry, LibraryService, Result, ShelfError};
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List library files in the working directory
    List,
    /// Create an empty library
    Create { library: String },
    /// Delete a library file
    Delete { library: String },
    /// Check whether a library exists
    Exists { library: String },
    /// Print all entries of a library
    Entries { library: String },
    /// Print one entry by citation key
    Get { library: String, key: String },
    /// Add an entry to a library
    Insert {
        library: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Replace the entry stored under KEY
    Update {
        library: String,
        #[arg(value_name = "KEY")]
        old_key: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Remove an entry by citation key
    Remove { library: String, key: String },
    /// Print the merged entries of all libraries
    All,
    /// Per-library entry counts and load errors
    Summary,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Create { .. } => "create",
            Command::Delete { .. } => "delete",
            Command::Exists { .. } => "exists",
            Command::Entries { .. } => "entries",
            Command::Get { .. } => "get",
            Command::Insert { .. } => "insert",
            Command::Update { .. } => "update",
            Command::Remove { .. } => "remove",
            Command::All => "all",
            Command::Summary => "summary",
        }
    }
}

/// Entry given on the command line, either as flags or as one JSON object.
#[derive(Args, Debug, Default)]
pub struct EntryArgs {
    /// Entry type (article, book, ...)
    #[arg(long = "type", default_value = "misc")]
    pub entry_type: String,

    /// Citation key of the entry
    #[arg(long)]
    pub key: Option<String>,

    /// Field as name=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Whole entry as JSON; overrides the other entry flags
    #[arg(long, conflicts_with_all = ["key", "fields"])]
    pub json: Option<String>,
}

impl EntryArgs {
    pub fn into_entry(self) -> Result<Entry> {
        if let Some(raw) = self.json {
            return serde_json::from_str(&raw).map_err(|e| ShelfError::Validation {
                field: "json".to_string(),
                message: e.to_string(),
            });
        }
        let mut entry = Entry::new(self.entry_type);
        entry.citation_key = self.key;
        entry.fields.extend(self.fields);
        Ok(entry)
    }
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got {:?}", raw)),
    }
}

/// Run one command against the service and return its JSON result.
pub fn dispatch(service: &LibraryService, command: Command) -> Result<Value> {
    debug!("Command: {:?}", command);
    match command {
        Command::List => Ok(json!(service.list_libraries()?)),
        Command::Create { library } => {
            service.create_library(&library)?;
            Ok(json!({ "library": library }))
        }
        Command::Delete { library } => {
            if service.delete_library(&library)? {
                Ok(json!({ "library": library }))
            } else {
                Err(ShelfError::LibraryNotFound { library })
            }
        }
        Command::Exists { library } => Ok(json!(service.library_exists(&library))),
        Command::Entries { library } => Ok(json!(service.get_entries(&library)?)),
        // null when no entry carries the key
        Command::Get { library, key } => Ok(json!(service.get_entry(&library, &key)?)),
        Command::Insert { library, entry } => {
            let entry = entry.into_entry()?;
            service.insert_entry(&library, entry)?;
            Ok(Value::Null)
        }
        Command::Update {
            library,
            old_key,
            entry,
        } => {
            let entry = entry.into_entry()?;
            service.update_entry(&library, &old_key, entry)?;
            Ok(Value::Null)
        }
        Command::Remove { library, key } => Ok(json!(service.delete_entry(&library, &key)?)),
        Command::All => Ok(json!(service.get_all_entries()?)),
        Command::Summary => Ok(json!(service.catalog_summary()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (LibraryService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = LibraryService::open(temp_dir.path()).unwrap();
        (service, temp_dir)
    }

    fn entry_args(key: &str, title: &str) -> EntryArgs {
        EntryArgs {
            entry_type: "article".to_string(),
            key: Some(key.to_string()),
            fields: vec![("title".to_string(), title.to_string())],
            json: None,
        }
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("title=A = B").unwrap(),
            ("title".to_string(), "A = B".to_string())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_entry_from_json() {
        let args = EntryArgs {
            json: Some(r#"{"entry_type":"book","citation_key":"k","fields":{"title":"T"}}"#.into()),
            ..Default::default()
        };
        let entry = args.into_entry().unwrap();
        assert_eq!(entry.entry_type, "book");
        assert_eq!(entry.field("title"), Some("T"));

        let args = EntryArgs {
            json: Some("{not json".into()),
            ..Default::default()
        };
        assert!(matches!(args.into_entry(), Err(ShelfError::Validation { .. })));
    }

    #[test]
    fn test_dispatch_flow() {
        let (service, _temp) = create_test_service();

        dispatch(&service, Command::Create { library: "refs".into() }).unwrap();
        dispatch(
            &service,
            Command::Insert {
                library: "refs".into(),
                entry: entry_args("abc1", "X"),
            },
        )
        .unwrap();

        let got = dispatch(
            &service,
            Command::Get {
                library: "refs".into(),
                key: "abc1".into(),
            },
        )
        .unwrap();
        assert_eq!(got["fields"]["title"], "X");

        let listed = dispatch(&service, Command::List).unwrap();
        assert_eq!(listed, json!(["refs.bib"]));

        let removed = dispatch(
            &service,
            Command::Remove {
                library: "refs".into(),
                key: "abc1".into(),
            },
        )
        .unwrap();
        assert_eq!(removed, json!(true));
    }

    #[test]
    fn test_delete_missing_library_is_not_found() {
        let (service, _temp) = create_test_service();
        let err = dispatch(&service, Command::Delete { library: "nope".into() }).unwrap_err();
        assert_eq!(err.to_status_code(), 404);
    }
}
