//! Site configuration and door table loading.
//!
//! The site configuration is a JSON document shipped next to the installer.
//! The door table is a CSV file whose path is taken from the configuration;
//! doors and extras are attached to the [`Config`] after ingestion and the
//! whole value is posted to the inventory service at the end of the install.

use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Site and device configuration for one commissioning run.
///
/// Field names are matched case-insensitively against the common spellings
/// (`port` / `Port`) so that files written by older tooling still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, alias = "Port")]
    pub port: u16,

    /// Path of the door CSV file.
    #[serde(default, alias = "Path")]
    pub path: String,

    /// API endpoint metadata reported back to the inventory service.
    #[serde(default, alias = "Api")]
    pub api: String,

    #[serde(default, alias = "Smartbox")]
    pub smartbox: SmartboxIdentity,

    #[serde(default, alias = "Address")]
    pub address: SiteAddress,

    #[serde(default, alias = "Deployer")]
    pub deployer: Deployer,

    #[serde(default, alias = "Doors")]
    pub doors: Vec<Door>,

    #[serde(default, alias = "Extras")]
    pub extras: Vec<Extra>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartboxIdentity {
    #[serde(default, alias = "Id")]
    pub id: String,
    #[serde(default, alias = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAddress {
    #[serde(default, alias = "Label")]
    pub label: String,
    #[serde(default, alias = "Street")]
    pub street: String,
    #[serde(default, alias = "City")]
    pub city: String,
    #[serde(default, alias = "State")]
    pub state: String,
}

/// Operator account that registers the unit.
///
/// The password is collected at runtime and only ever lives in memory.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployer {
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(default, alias = "Password")]
    pub password: String,
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One physical door wired to the unit.
///
/// Addresses stay as the operator wrote them until a register call parses
/// them; the dimensions are carried through unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub name: String,
    pub input: String,
    pub output: String,
    pub width: String,
    pub height: String,
    pub length: String,
}

/// Free-form key/value pair passed through to the inventory service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    pub value: String,
}

impl Config {
    /// Decode a configuration document.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the document is not valid JSON or
    /// has no deployer username.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and decode the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.deployer.username.trim().is_empty() {
            return Err(Error::InvalidConfig("missing deployer username".to_string()));
        }
        Ok(())
    }
}

/// Parse the door table, skipping its header row.
///
/// Rows need at least the name, input and output columns; missing
/// dimension columns are left empty.
///
/// # Errors
/// Returns `Error::InvalidDoors` on unreadable CSV or a short row.
pub fn parse_doors<R: std::io::Read>(reader: R) -> Result<Vec<Door>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut doors = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| Error::InvalidDoors(e.to_string()))?;
        if record.len() < 3 {
            return Err(Error::InvalidDoors(format!(
                "row {} has {} columns, expected at least 3",
                index + 2,
                record.len()
            )));
        }

        let column = |i: usize| record.get(i).unwrap_or_default().to_string();
        doors.push(Door {
            name: column(0),
            input: column(1),
            output: column(2),
            width: column(3),
            height: column(4),
            length: column(5),
        });
    }

    Ok(doors)
}

/// Read the door table at `path`.
pub fn load_doors(path: impl AsRef<Path>) -> Result<Vec<Door>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| Error::InvalidDoors(format!("{}: {e}", path.display())))?;
    parse_doors(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "port": 502,
        "path": "./doors.csv",
        "api": "http://localhost:8080",
        "smartbox": { "id": "SB-0042", "name": "Lobby" },
        "address": { "label": "HQ", "street": "Main St 1", "city": "Recife", "state": "PE" },
        "deployer": { "username": "Alice" },
        "extras": [{ "name": "floor", "value": "2" }]
    }"#;

    #[test]
    fn test_config_from_json() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.port, 502);
        assert_eq!(config.path, "./doors.csv");
        assert_eq!(config.smartbox.id, "SB-0042");
        assert_eq!(config.address.city, "Recife");
        assert_eq!(config.deployer.username, "Alice");
        assert!(config.deployer.password.is_empty());
        assert!(config.doors.is_empty());
        assert_eq!(config.extras.len(), 1);
    }

    #[test]
    fn test_config_accepts_capitalized_fields() {
        let raw = r#"{"Port": 1, "Path": "d.csv", "Deployer": {"Username": "bob"}}"#;
        let config = Config::from_json(raw).unwrap();
        assert_eq!(config.port, 1);
        assert_eq!(config.deployer.username, "bob");
    }

    #[test]
    fn test_config_without_username_is_invalid() {
        let raw = r#"{"port": 502, "deployer": {"username": "  "}}"#;
        assert!(matches!(
            Config::from_json(raw),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_json("{}"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_malformed_json() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("config.json"));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_deployer_debug_hides_password() {
        let deployer = Deployer {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{deployer:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_parse_doors_skips_header() {
        let csv = "name,input,output,width,height,length\n\
                   1,410,500,90,210,4\n\
                   2,420,510,80,200,4\n";
        let doors = parse_doors(csv.as_bytes()).unwrap();

        assert_eq!(doors.len(), 2);
        assert_eq!(doors[0].name, "1");
        assert_eq!(doors[0].input, "410");
        assert_eq!(doors[0].output, "500");
        assert_eq!(doors[0].height, "210");
        assert_eq!(doors[1].input, "420");
    }

    #[test]
    fn test_parse_doors_header_only() {
        let doors = parse_doors("name,input,output\n".as_bytes()).unwrap();
        assert!(doors.is_empty());
    }

    #[test]
    fn test_parse_doors_missing_dimensions() {
        let doors = parse_doors("h1,h2,h3\nfront,410,500\n".as_bytes()).unwrap();
        assert_eq!(doors[0].width, "");
        assert_eq!(doors[0].length, "");
    }

    #[test]
    fn test_parse_doors_short_row() {
        let result = parse_doors("name,input,output\nfront,410\n".as_bytes());
        assert!(matches!(result, Err(Error::InvalidDoors(_))));
    }

    #[test]
    fn test_load_doors_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,input,output,width,height,length").unwrap();
        writeln!(file, "main,1F4,19A,1,2,3").unwrap();

        let doors = load_doors(file.path()).unwrap();
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].input, "1F4");
    }
}
