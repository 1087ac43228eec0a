//! Configuration for Git hosting platform connections.
use secrecy::SecretString;

/// Default host used when none is configured.
pub const DEFAULT_HOST: &str = "github.com";
/// Default base branch migrations are proposed against.
pub const DEFAULT_BASE_BRANCH: &str = "main";
/// Default branch name prefix for generated migration branches.
pub const DEFAULT_BRANCH_PREFIX: &str = "caretaker-migration";
/// Git file mode for regular (non-executable) blobs.
pub const TREE_BLOB_MODE: &str = "100644";
/// Git tree entry type for file contents.
pub const TREE_BLOB_TYPE: &str = "blob";
/// Git tree entry type for directories.
pub const TREE_TREE_TYPE: &str = "tree";

/// Remote connection configuration for authenticating against a GitHub
/// installation. A single config serves every repository on the host.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote host (e.g., "github.com").
    pub host: String,
    /// URL scheme (http or https).
    pub scheme: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// Log writes instead of performing them.
    pub dry_run: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: "https".to_string(),
            token: SecretString::from("".to_string()),
            dry_run: false,
        }
    }
}

impl RemoteConfig {
    /// REST/GraphQL API root for the configured host. GitHub.com serves the
    /// API from a subdomain, Enterprise Server under `/api/v3`.
    pub fn api_base_uri(&self) -> String {
        if self.host == DEFAULT_HOST {
            format!("{}://api.{}", self.scheme, self.host)
        } else {
            format!("{}://{}/api/v3", self.scheme, self.host)
        }
    }
}
