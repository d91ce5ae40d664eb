use serde::{Deserialize, Serialize};

use crate::archiver::ArchiveConfig;
use crate::catalog::CatalogConfig;
use crate::orchestrator::ImportConfig;
use crate::staging::TransferConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::Compression;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.catalog.file_name, "ContentCatalog.txt");
        assert_eq!(config.catalog.header_key, "ContentCatalog");
        assert!(config.transfer.prefer_atomic_moves);
        assert_eq!(config.archive.compression, Compression::Deflated);
        assert_eq!(config.import.managed_id_prefix, "bethesdanet");
    }

    #[test]
    fn test_deserialize_archive_compression() {
        let toml = r#"
[archive]
compression = "stored"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.archive.compression, Compression::Stored);
    }

    #[test]
    fn test_deserialize_unknown_compression_fails() {
        let toml = r#"
[archive]
compression = "lzma9000"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serializes_back() {
        let config = Config::default();
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("[transfer]"));
        assert!(rendered.contains("managed_id_prefix"));
    }
}
