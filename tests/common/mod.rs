//! Loader for YAML fixtures marking selectively disclosable claims with the
//! `!sd` tag.
use serde::Deserialize;
use serde_json::Value;
use serde_yaml::Value as Yaml;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Claims given to the issuer.
    pub user_claims: Value,

    /// Request tree given to the holder.
    pub holder_disclosed_claims: Value,

    /// Claims the verifier should reconstruct, registered claims aside.
    pub expected_verified_claims: Value,
}

/// Removes `!sd` tags on scalars, sequences, mappings and mapping keys.
pub fn strip_sd(value: Yaml) -> Yaml {
    match value {
        Yaml::Tagged(tagged) => {
            assert!(tagged.tag == "sd", "unexpected tag {}", tagged.tag);
            strip_sd(tagged.value)
        }
        Yaml::Sequence(items) => Yaml::Sequence(items.into_iter().map(strip_sd).collect()),
        Yaml::Mapping(mapping) => Yaml::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| (strip_sd(key), strip_sd(value)))
                .collect(),
        ),
        other => other,
    }
}

pub fn load_yaml(source: &str) -> Value {
    let yaml: Yaml = serde_yaml::from_str(source).unwrap();
    serde_json::to_value(strip_sd(yaml)).unwrap()
}

pub fn load_fixture(name: &str) -> Fixture {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let source = std::fs::read_to_string(path).unwrap();
    serde_json::from_value(load_yaml(&source)).unwrap()
}
