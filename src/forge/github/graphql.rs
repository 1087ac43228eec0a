use serde::{Deserialize, Serialize};

pub const ENABLE_AUTO_MERGE_MUTATION: &str = r#"
mutation EnableAutoMerge($pullRequestId: ID!, $mergeMethod: PullRequestMergeMethod!) {
  enablePullRequestAutoMerge(input: { pullRequestId: $pullRequestId, mergeMethod: $mergeMethod }) {
    pullRequest {
      number
    }
  }
}"#;

/// Merge strategy used when auto-merge kicks in.
pub const AUTO_MERGE_METHOD: &str = "SQUASH";

#[derive(Debug, Serialize)]
pub struct EnableAutoMergeVariables {
    #[serde(rename = "pullRequestId")]
    pub pull_request_id: String,
    #[serde(rename = "mergeMethod")]
    pub merge_method: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlError>>,
}

impl<T> GraphqlResponse<T> {
    /// Joined error messages, if the response carried any.
    pub fn error_message(&self) -> Option<String> {
        self.errors
            .as_ref()
            .filter(|errors| !errors.is_empty())
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<&str>>()
                    .join("; ")
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct AutoMergePullRequest {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct EnableAutoMergePayload {
    #[serde(rename = "pullRequest")]
    pub pull_request: Option<AutoMergePullRequest>,
}

#[derive(Debug, Deserialize)]
pub struct EnableAutoMergeData {
    #[serde(rename = "enablePullRequestAutoMerge")]
    pub enable_pull_request_auto_merge: Option<EnableAutoMergePayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_graphql_errors() {
        let body = r#"{
            "data": { "enablePullRequestAutoMerge": null },
            "errors": [
                { "message": "Pull request is in clean status" },
                { "message": "Auto merge is not allowed for this repository" }
            ]
        }"#;

        let parsed: GraphqlResponse<EnableAutoMergeData> =
            serde_json::from_str(body).unwrap();

        assert_eq!(
            parsed.error_message().unwrap(),
            "Pull request is in clean status; Auto merge is not allowed for this repository"
        );
    }

    #[test]
    fn successful_response_has_no_error_message() {
        let body = r#"{
            "data": {
                "enablePullRequestAutoMerge": { "pullRequest": { "number": 7 } }
            }
        }"#;

        let parsed: GraphqlResponse<EnableAutoMergeData> =
            serde_json::from_str(body).unwrap();

        assert!(parsed.error_message().is_none());
        let number = parsed
            .data
            .and_then(|d| d.enable_pull_request_auto_merge)
            .and_then(|p| p.pull_request)
            .map(|pr| pr.number);
        assert_eq!(number, Some(7));
    }
}
