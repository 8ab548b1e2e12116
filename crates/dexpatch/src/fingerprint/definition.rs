use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::Fingerprint;
use crate::bytecode::{AccessFlags, Opcode};
use crate::error::{Error, Result};

/// Serialized form of a fingerprint
///
/// Custom predicates cannot be stored, everything else can. `opcodes` is a
/// space separated list of mnemonics with `??` as the wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_flags: Option<AccessFlags>,
    /// When set, only these bits of `access_flags` are compared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_mask: Option<AccessFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcodes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl FingerprintDef {
    pub fn to_fingerprint(&self) -> Result<Fingerprint> {
        let mut builder = Fingerprint::builder(self.name.clone());

        if let Some(return_type) = &self.return_type {
            builder = builder.return_type(return_type.clone());
        }
        match (self.access_flags, self.access_mask) {
            (Some(flags), Some(mask)) => builder = builder.access_flags_masked(mask, flags),
            (Some(flags), None) => builder = builder.access_flags(flags),
            (None, Some(_)) => {
                return Err(Error::InvalidPattern(format!(
                    "fingerprint '{}' has an access mask but no access flags",
                    self.name
                )));
            }
            (None, None) => {}
        }
        if let Some(parameters) = &self.parameters {
            builder = builder.parameters(parameters.iter().cloned());
        }
        if let Some(opcodes) = &self.opcodes {
            builder = builder.opcodes(parse_opcode_pattern(opcodes)?);
        }
        if !self.strings.is_empty() {
            builder = builder.strings(self.strings.iter().cloned());
        }
        if let Some(literal) = self.literal {
            builder = builder.literal(literal);
        }
        if let Some(parent) = &self.parent {
            builder = builder.parent(parent.clone());
        }

        Ok(builder.build())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub fingerprints: Vec<FingerprintDef>,
}

impl FingerprintSet {
    pub fn fingerprint(&self, name: &str) -> Option<&FingerprintDef> {
        self.fingerprints
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    /// Build every fingerprint, keeping file order
    pub fn build(&self) -> Result<Vec<Fingerprint>> {
        self.fingerprints.iter().map(FingerprintDef::to_fingerprint).collect()
    }
}

pub fn load_fingerprints<P: AsRef<Path>>(path: P) -> Result<FingerprintSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_fingerprints<P: AsRef<Path>>(path: P, fingerprints: &FingerprintSet) -> Result<()> {
    let content = serde_json::to_string_pretty(fingerprints)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn parse_opcode_pattern(pattern: &str) -> Result<Vec<Option<Opcode>>> {
    let mut opcodes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            opcodes.push(None);
            continue;
        }

        let opcode = token
            .parse::<Opcode>()
            .map_err(|e| Error::InvalidPattern(format!("Invalid opcode '{}': {}", token, e)))?;
        opcodes.push(Some(opcode));
    }

    if opcodes.is_empty() {
        return Err(Error::InvalidPattern("Opcode pattern is empty".to_string()));
    }

    Ok(opcodes)
}

pub fn format_opcode_pattern(opcodes: &[Option<Opcode>]) -> String {
    opcodes
        .iter()
        .map(|op| match op {
            Some(opcode) => opcode.mnemonic(),
            None => "??",
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let opcodes = parse_opcode_pattern("iget-object ?? invoke-static/range move-result").unwrap();
        assert_eq!(
            opcodes,
            vec![
                Some(Opcode::IgetObject),
                None,
                Some(Opcode::InvokeStaticRange),
                Some(Opcode::MoveResult),
            ]
        );
        assert_eq!(
            format_opcode_pattern(&opcodes),
            "iget-object ?? invoke-static/range move-result"
        );
    }

    #[test]
    fn test_parse_pattern_errors() {
        assert!(matches!(parse_opcode_pattern("  "), Err(Error::InvalidPattern(_))));
        assert!(matches!(
            parse_opcode_pattern("move jump"),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_definition_to_fingerprint() {
        let json = r#"{
            "fingerprints": [
                {
                    "name": "SeekBarConstructor",
                    "return_type": "V",
                    "access_flags": "PUBLIC | CONSTRUCTOR",
                    "literal": 2131165500
                },
                {
                    "name": "VideoLength",
                    "parent": "SeekBarConstructor",
                    "opcodes": "move-result-wide ?? invoke-static"
                }
            ]
        }"#;
        let set: FingerprintSet = serde_json::from_str(json).unwrap();
        assert_eq!(
            set.fingerprint("seekbarconstructor").unwrap().access_flags,
            Some(AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR)
        );

        let fingerprints = set.build().unwrap();
        assert_eq!(fingerprints.len(), 2);
        assert_eq!(fingerprints[1].parent(), Some("SeekBarConstructor"));
        assert_eq!(fingerprints[1].opcodes().map(|o| o.len()), Some(3));
    }

    #[test]
    fn test_mask_without_flags_is_rejected() {
        let def = FingerprintDef {
            name: "Broken".to_string(),
            access_mask: Some(AccessFlags::STATIC),
            ..Default::default()
        };
        assert!(def.to_fingerprint().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let set = FingerprintSet {
            version: Some("18.45.43".to_string()),
            fingerprints: vec![FingerprintDef {
                name: "LayoutSwitch".to_string(),
                return_type: Some("I".to_string()),
                parameters: Some(vec!["Landroid/content/Context;".to_string()]),
                strings: vec!["layout".to_string()],
                ..Default::default()
            }],
        };

        save_fingerprints(temp_file.path(), &set).unwrap();
        let loaded = load_fingerprints(temp_file.path()).unwrap();
        assert_eq!(loaded.version.as_deref(), Some("18.45.43"));
        assert_eq!(loaded.fingerprints, set.fingerprints);
    }
}
