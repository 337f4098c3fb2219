// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AWS import: reads `~/.aws/credentials` (and `~/.aws/config` for the
//! region) in the shared INI format the AWS CLI writes.

use std::fs;
use std::path::{Path, PathBuf};

use cloudvault_core::{AwsCredentials, Credentials, Profile, Provider, VaultError};
use tracing::debug;

use crate::{ImportAdapter, ImportOptions, SourceDescriptor};

pub struct AwsImporter {
    home_dir: PathBuf,
}

impl AwsImporter {
    pub fn new(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    fn credentials_path(&self) -> PathBuf {
        self.home_dir.join(".aws").join("credentials")
    }

    fn config_path(&self) -> PathBuf {
        self.home_dir.join(".aws").join("config")
    }
}

impl ImportAdapter for AwsImporter {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn list_sources(&self) -> Result<Vec<SourceDescriptor>, VaultError> {
        let path = self.credentials_path();
        let sections = parse_section_names(&path)?;
        Ok(sections
            .into_iter()
            .map(|name| SourceDescriptor {
                id: name,
                detail: path.display().to_string(),
            })
            .collect())
    }

    fn import(&self, opts: &ImportOptions) -> Result<(Profile, Credentials), VaultError> {
        let source = opts.source.as_deref().unwrap_or("default");
        let target_name = opts.target_name.as_deref().unwrap_or(source);

        let creds = parse_credentials_section(&self.credentials_path(), source)?;
        let region = parse_config_region(&self.config_path(), source).unwrap_or_default();

        let mut profile = Profile::new(target_name, Provider::Aws);
        profile.region = region;
        profile.default = opts.set_default;

        let credentials = Credentials::Aws(creds);
        credentials.validate()?;
        debug!(source = %source, target = %target_name, "AWS profile imported");
        Ok((profile, credentials))
    }
}

/// Collect `[section]` names from an INI-style file.
fn parse_section_names(path: &Path) -> Result<Vec<String>, VaultError> {
    let content = read_source(path)?;
    Ok(content
        .lines()
        .filter_map(|line| section_name(line.trim()))
        .map(str::to_string)
        .collect())
}

/// Parse one named section of the credentials file.
fn parse_credentials_section(path: &Path, section: &str) -> Result<AwsCredentials, VaultError> {
    let content = read_source(path)?;

    let mut creds = AwsCredentials {
        access_key_id: String::new(),
        secret_access_key: String::new(),
        session_token: None,
    };
    let mut in_section = false;
    let mut section_seen = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = section_name(line) {
            in_section = name == section;
            section_seen |= in_section;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "aws_access_key_id" => creds.access_key_id = value.trim().to_string(),
            "aws_secret_access_key" => creds.secret_access_key = value.trim().to_string(),
            "aws_session_token" => creds.session_token = Some(value.trim().to_string()),
            _ => {}
        }
    }

    if !section_seen {
        return Err(VaultError::ImportSource(format!(
            "profile '{section}' not found in {}",
            path.display()
        )));
    }
    if creds.access_key_id.is_empty() || creds.secret_access_key.is_empty() {
        return Err(VaultError::ImportSource(format!(
            "profile '{section}' in {} is missing aws_access_key_id or aws_secret_access_key",
            path.display()
        )));
    }

    Ok(creds)
}

/// Look up the region for a profile in the config file. Non-default
/// profiles use `[profile <name>]` section headers there.
fn parse_config_region(path: &Path, section: &str) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;

    let target = if section == "default" {
        section.to_string()
    } else {
        format!("profile {section}")
    };

    let mut in_section = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = section_name(line) {
            in_section = name == target;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=')
            && key.trim() == "region"
        {
            return Some(value.trim().to_string());
        }
    }
    None
}

fn section_name(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn read_source(path: &Path) -> Result<String, VaultError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VaultError::ImportSource(format!("AWS credentials file not found: {}", path.display()))
        } else {
            VaultError::ImportSource(format!("reading {}: {e}", path.display()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_home(credentials: &str, config: Option<&str>) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let aws_dir = dir.path().join(".aws");
        fs::create_dir_all(&aws_dir).unwrap();
        fs::write(aws_dir.join("credentials"), credentials).unwrap();
        if let Some(config) = config {
            fs::write(aws_dir.join("config"), config).unwrap();
        }
        dir
    }

    const CREDS: &str = "\
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = defaultsecret

[prod]
aws_access_key_id = AKIAPROD
aws_secret_access_key = prodsecret
aws_session_token = tok123
";

    const CONFIG: &str = "\
[default]
region = us-east-1

[profile prod]
region = eu-west-1
";

    #[test]
    fn import_named_section_with_region() {
        let home = fake_home(CREDS, Some(CONFIG));
        let importer = AwsImporter::new(home.path().to_path_buf());

        let (profile, creds) = importer
            .import(&ImportOptions {
                source: Some("prod".into()),
                target_name: Some("prodaws".into()),
                set_default: false,
            })
            .unwrap();

        assert_eq!(profile.name, "prodaws");
        assert_eq!(profile.region, "eu-west-1");
        match &creds {
            Credentials::Aws(aws) => {
                assert_eq!(aws.access_key_id, "AKIAPROD");
                assert_eq!(aws.secret_access_key, "prodsecret");
                assert_eq!(aws.session_token.as_deref(), Some("tok123"));
            }
            other => panic!("expected AWS credentials, got {other:?}"),
        }
    }

    #[test]
    fn import_defaults_to_default_section() {
        let home = fake_home(CREDS, Some(CONFIG));
        let importer = AwsImporter::new(home.path().to_path_buf());

        let (profile, creds) = importer.import(&ImportOptions::default()).unwrap();
        assert_eq!(profile.name, "default");
        assert_eq!(profile.region, "us-east-1");
        match &creds {
            Credentials::Aws(aws) => assert_eq!(aws.access_key_id, "AKIADEFAULT"),
            other => panic!("expected AWS credentials, got {other:?}"),
        }
    }

    #[test]
    fn missing_section_is_an_import_source_error() {
        let home = fake_home(CREDS, None);
        let importer = AwsImporter::new(home.path().to_path_buf());

        let err = importer
            .import(&ImportOptions {
                source: Some("prod2".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::ImportSource(_)));
        assert!(err.to_string().contains("prod2"));
    }

    #[test]
    fn section_without_keys_is_rejected() {
        let home = fake_home("[empty]\n# nothing here\n", None);
        let importer = AwsImporter::new(home.path().to_path_buf());

        let err = importer
            .import(&ImportOptions {
                source: Some("empty".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::ImportSource(_)));
    }

    #[test]
    fn missing_credentials_file_is_an_import_source_error() {
        let dir = tempdir().unwrap();
        let importer = AwsImporter::new(dir.path().to_path_buf());

        let err = importer.import(&ImportOptions::default()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn list_sources_enumerates_sections() {
        let home = fake_home(CREDS, None);
        let importer = AwsImporter::new(home.path().to_path_buf());

        let ids: Vec<_> = importer
            .list_sources()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["default", "prod"]);
    }
}
